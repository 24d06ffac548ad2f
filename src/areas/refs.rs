use crate::areas::database::Database;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::GitError;
use anyhow::Context;
use file_guard::Lock;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

pub const HEAD: &str = "HEAD";
pub const HEADS_PREFIX: &str = "refs/heads/";
pub const TAGS_PREFIX: &str = "refs/tags/";

/// Symbolic ref chains longer than this are treated as cycles.
const MAX_SYMREF_HOPS: usize = 32;

/// The content of a ref file: either a pointer to another ref or a
/// resolved object id.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SymRefOrOid {
    SymRef(String),
    Oid(ObjectId),
}

/// Named pointers into the object graph, stored as plain files under the
/// repository metadata directory.
#[derive(Debug)]
pub struct Refs {
    path: Box<Path>,
}

impl Refs {
    pub fn new(path: Box<Path>) -> Self {
        Refs { path }
    }

    fn read_ref_file(&self, name: &str) -> anyhow::Result<Option<SymRefOrOid>> {
        let ref_path = self.path.join(name);
        let content = match std::fs::read_to_string(&ref_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("Unable to read ref {}", name));
            }
        };

        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        static SYMREF_PATTERN: OnceLock<regex::Regex> = OnceLock::new();
        let symref_pattern = SYMREF_PATTERN
            .get_or_init(|| regex::Regex::new(r"^ref: (.+)$").expect("valid literal pattern"));
        if let Some(captures) = symref_pattern.captures(content) {
            return Ok(Some(SymRefOrOid::SymRef(captures[1].trim().to_string())));
        }

        Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(
            content.to_string(),
        )?)))
    }

    /// Follow a ref (symbolic or direct) to an object id.
    ///
    /// Returns `None` when any link in the chain names a missing or empty
    /// file, which is the normal state of a fresh repository's HEAD.
    pub fn resolve_ref(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        let mut current = name.to_string();

        for _ in 0..MAX_SYMREF_HOPS {
            match self.read_ref_file(&current)? {
                None => return Ok(None),
                Some(SymRefOrOid::Oid(oid)) => return Ok(Some(oid)),
                Some(SymRefOrOid::SymRef(target)) => current = target,
            }
        }

        Err(GitError::RefCycle(name.to_string()).into())
    }

    /// Resolve the chain of symbolic refs starting at `name` and write
    /// `oid` into the final ref file, creating it if needed.
    pub fn update_ref(&self, name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        let mut current = name.to_string();

        for _ in 0..MAX_SYMREF_HOPS {
            match self.read_ref_file(&current)? {
                Some(SymRefOrOid::SymRef(target)) => current = target,
                _ => return self.write_ref_file(&current, oid.as_ref()),
            }
        }

        Err(GitError::RefCycle(name.to_string()).into())
    }

    fn write_ref_file(&self, name: &str, content: &str) -> anyhow::Result<()> {
        let ref_path = self.path.join(name);
        if let Some(parent) = ref_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Unable to create directory {}", parent.display()))?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&ref_path)
            .with_context(|| format!("Unable to open ref {}", name))?;
        let _lock = file_guard::lock(&file, Lock::Exclusive, 0, 1)
            .with_context(|| format!("Unable to lock ref {}", name))?;

        writeln!(&file, "{}", content).with_context(|| format!("Unable to write ref {}", name))
    }

    /// Point HEAD at a branch (as a symbolic ref).
    pub fn set_head_to_branch(&self, branch: &str) -> anyhow::Result<()> {
        self.write_ref_file(HEAD, &format!("ref: {}{}", HEADS_PREFIX, branch))
    }

    /// The branch HEAD currently points at, or `None` when detached.
    pub fn current_branch(&self) -> anyhow::Result<Option<String>> {
        match self.read_ref_file(HEAD)? {
            Some(SymRefOrOid::SymRef(target)) => {
                Ok(target.strip_prefix(HEADS_PREFIX).map(str::to_string))
            }
            _ => Ok(None),
        }
    }

    /// All refs under `refs/`, sorted by full name, with resolved ids.
    pub fn list_refs(&self) -> anyhow::Result<Vec<(String, ObjectId)>> {
        let refs_root = self.path.join("refs");

        let mut refs = Vec::new();
        for entry in WalkDir::new(&refs_root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
        {
            let name = entry
                .path()
                .strip_prefix(self.path.as_ref())?
                .to_string_lossy()
                .to_string();
            if let Some(oid) = self.resolve_ref(&name)? {
                refs.push((name, oid));
            }
        }

        refs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(refs)
    }

    /// Collect every object id `name` could mean.
    ///
    /// Sources, in the order they are consulted: the literal `HEAD`, a
    /// 4-to-40 character hex prefix of a stored object, `refs/tags/<name>`
    /// and `refs/heads/<name>`. All matches are collected so callers can
    /// flag ambiguity.
    pub fn resolve_name(
        &self,
        database: &Database,
        name: &str,
    ) -> anyhow::Result<Vec<ObjectId>> {
        let mut candidates = Vec::new();

        if name == HEAD {
            if let Some(oid) = self.resolve_ref(HEAD)? {
                candidates.push(oid);
            }
        }

        let looks_like_hex = (4..=40).contains(&name.len())
            && name.chars().all(|c| c.is_ascii_hexdigit());
        if looks_like_hex {
            candidates.extend(database.find_objects_by_prefix(name)?);
        }

        for prefix in [TAGS_PREFIX, HEADS_PREFIX] {
            if let Some(oid) = self.resolve_ref(&format!("{}{}", prefix, name))? {
                candidates.push(oid);
            }
        }

        Ok(candidates)
    }

    /// Resolve `name` to the id of an object of `expected` kind.
    ///
    /// With `follow`, annotated tags are peeled to their target and a
    /// commit stands in for its tree when a tree is wanted. Without it, a
    /// kind mismatch yields `None`.
    pub fn find_object(
        &self,
        database: &Database,
        name: &str,
        expected: Option<ObjectType>,
        follow: bool,
    ) -> anyhow::Result<Option<ObjectId>> {
        let candidates = self.resolve_name(database, name)?;

        let mut oid = match candidates.len() {
            0 => return Err(GitError::NoSuchReference(name.to_string()).into()),
            1 => candidates.into_iter().next().unwrap_or_default(),
            _ => {
                return Err(GitError::AmbiguousReference {
                    name: name.to_string(),
                    candidates: candidates.iter().map(ToString::to_string).collect(),
                }
                .into());
            }
        };

        loop {
            let kind = database.object_type(&oid)?;

            match expected {
                None => return Ok(Some(oid)),
                Some(wanted) if wanted == kind => return Ok(Some(oid)),
                Some(_) if !follow => return Ok(None),
                Some(wanted) => match (kind, wanted) {
                    (ObjectType::Tag, _) => {
                        let tag = match database.parse_object(&oid)? {
                            ObjectBox::Tag(tag) => tag,
                            _ => unreachable!("object kind already probed"),
                        };
                        oid = tag.object_oid()?;
                    }
                    (ObjectType::Commit, ObjectType::Tree) => {
                        let commit = database.parse_object_as_commit(&oid)?;
                        oid = commit.tree_oid()?;
                    }
                    _ => {
                        return Err(GitError::NotFound(format!(
                            "no {} reachable from {}",
                            wanted, name
                        ))
                        .into());
                    }
                },
            }
        }
    }

    /// Create `refs/heads/<branch>` pointing at `oid`.
    pub fn create_branch(&self, branch: &str, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref_file(&format!("{}{}", HEADS_PREFIX, branch), oid.as_ref())
    }

    /// Create `refs/tags/<tag>` pointing at `oid`.
    pub fn create_tag_ref(&self, tag: &str, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref_file(&format!("{}{}", TAGS_PREFIX, tag), oid.as_ref())
    }

    pub fn heads_path(&self) -> PathBuf {
        self.path.join("refs").join("heads")
    }

    pub fn tags_path(&self) -> PathBuf {
        self.path.join("refs").join("tags")
    }
}
