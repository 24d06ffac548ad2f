//! Tree object: an ordered set of leaves naming blobs and subtrees.
//!
//! On disk: `tree <size>\0` then repeated `<mode> <name>\0<20-byte-oid>`.
//! Modes are six octal ASCII characters; a five-character mode (the
//! reference format writes `40000` for directories) is zero-padded on the
//! left when parsed. Serialization sorts leaves by name, with directory
//! names keyed as if they had a trailing `/`, so identical leaf sets always
//! produce identical bytes and therefore identical object ids.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::GitError;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, Write};

/// Mode recorded for subtree leaves.
pub const DIRECTORY_MODE: &str = "040000";

/// One tree entry: mode, name, object id.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeLeaf {
    mode: String,
    name: String,
    oid: ObjectId,
}

impl TreeLeaf {
    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    /// Subtree leaves carry the directory mode (`04` prefix).
    pub fn is_subtree(&self) -> bool {
        self.mode.starts_with("04")
    }

    /// Sort key for serialization: directories compare as if their name
    /// ended in `/`, so the file `foo.txt` precedes the directory `foo`.
    fn sort_key(&self) -> String {
        if self.mode.starts_with("10") {
            self.name.clone()
        } else {
            format!("{}/", self.name)
        }
    }

    fn leaf_type(&self) -> ObjectType {
        if self.is_subtree() {
            ObjectType::Tree
        } else if self.mode.starts_with("16") {
            ObjectType::Commit
        } else {
            ObjectType::Blob
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    leaves: Vec<TreeLeaf>,
}

impl Tree {
    pub fn add_leaf(&mut self, leaf: TreeLeaf) {
        self.leaves.push(leaf);
    }

    pub fn leaves(&self) -> &[TreeLeaf] {
        &self.leaves
    }

    /// Leaves in serialization order.
    fn sorted_leaves(&self) -> Vec<&TreeLeaf> {
        let mut leaves: Vec<&TreeLeaf> = self.leaves.iter().collect();
        leaves.sort_by_key(|leaf| leaf.sort_key());
        leaves
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();
        for leaf in self.sorted_leaves() {
            content_bytes.write_all(leaf.mode.as_bytes())?;
            content_bytes.push(b' ');
            content_bytes.write_all(leaf.name.as_bytes())?;
            content_bytes.push(0);
            leaf.oid.write_raw_to(&mut content_bytes)?;
        }

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut tree = Tree::default();
        let mut reader = reader;

        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more leaves
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(GitError::CorruptObject("unexpected EOF in mode".to_string()).into());
            }
            if mode_bytes.len() < 5 || mode_bytes.len() > 6 {
                return Err(GitError::CorruptObject(format!(
                    "tree leaf mode of {} bytes",
                    mode_bytes.len()
                ))
                .into());
            }

            let mut mode = std::str::from_utf8(&mode_bytes)
                .map_err(|_| GitError::CorruptObject("non-ASCII tree mode".to_string()))?
                .to_string();
            if mode.len() == 5 {
                mode.insert(0, '0');
            }

            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || name_bytes.pop() != Some(b'\0') {
                return Err(GitError::CorruptObject("unexpected EOF in name".to_string()).into());
            }
            let name = std::str::from_utf8(&name_bytes)
                .map_err(|_| GitError::CorruptObject("non-UTF-8 tree leaf name".to_string()))?
                .to_owned();

            let oid = ObjectId::read_raw_from(&mut reader)
                .context("unexpected EOF in tree leaf object id")?;

            tree.add_leaf(TreeLeaf::new(mode, name, oid));
        }

        Ok(tree)
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.sorted_leaves()
            .iter()
            .map(|leaf| {
                format!(
                    "{} {} {}\t{}",
                    leaf.mode,
                    leaf.leaf_type().as_str(),
                    leaf.oid,
                    leaf.name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

fn dir_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn base_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, base)| base).unwrap_or(path)
}

/// Convert a flat index into a hierarchy of tree objects, storing every
/// tree and returning the root tree's id.
///
/// Directories are processed in descending path-length order, so every
/// subtree is written (and its id known) before its parent. Every ancestor
/// directory gets a tree object even when it holds no files directly.
pub fn build_tree_from_index(database: &Database, index: &Index) -> anyhow::Result<ObjectId> {
    // Direct file entries grouped by containing directory; "" is the root.
    let mut files: BTreeMap<String, Vec<&IndexEntry>> = BTreeMap::new();
    files.insert(String::new(), Vec::new());

    for entry in index.entries() {
        let name = entry
            .name
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid entry name {:?}", entry.name))?;
        let dirname = dir_of(name);

        let mut ancestor = dirname;
        while !ancestor.is_empty() {
            files.entry(ancestor.to_string()).or_default();
            ancestor = dir_of(ancestor);
        }

        files.entry(dirname.to_string()).or_default().push(entry);
    }

    // Child trees land here as (basename, oid) once built, keyed by parent.
    let mut subtrees: HashMap<String, Vec<(String, ObjectId)>> = HashMap::new();

    let mut dirs: Vec<String> = files.keys().cloned().collect();
    dirs.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut root_oid = None;
    for dir in dirs {
        let mut tree = Tree::default();

        for entry in &files[&dir] {
            let name = entry.name.to_str().unwrap_or_default();
            tree.add_leaf(TreeLeaf::new(
                entry.tree_mode(),
                base_of(name).to_string(),
                entry.oid.clone(),
            ));
        }
        for (name, oid) in subtrees.remove(&dir).unwrap_or_default() {
            tree.add_leaf(TreeLeaf::new(DIRECTORY_MODE.to_string(), name, oid));
        }

        let oid = database.store(&tree)?;
        if dir.is_empty() {
            root_oid = Some(oid);
        } else {
            subtrees
                .entry(dir_of(&dir).to_string())
                .or_default()
                .push((base_of(&dir).to_string(), oid));
        }
    }

    // the root group always exists, so a root tree was always written
    root_oid.context("index produced no root tree")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn oid(fill: char) -> ObjectId {
        ObjectId::try_parse(fill.to_string().repeat(40)).unwrap()
    }

    fn leaf(mode: &str, name: &str, fill: char) -> TreeLeaf {
        TreeLeaf::new(mode.to_string(), name.to_string(), oid(fill))
    }

    #[test]
    fn file_sorts_before_directory_with_shared_prefix() {
        // naive string sort would put "foo" before "foo.txt"; keyed as
        // "foo/" the directory must come after the file
        let mut tree = Tree::default();
        tree.add_leaf(leaf(DIRECTORY_MODE, "foo", 'a'));
        tree.add_leaf(leaf("100644", "foo.txt", 'b'));

        let sorted: Vec<&str> = tree.sorted_leaves().iter().map(|l| l.name()).collect();
        assert_eq!(sorted, vec!["foo.txt", "foo"]);
    }

    #[test]
    fn serialization_is_independent_of_insert_order() {
        let leaves = vec![
            leaf("100644", "b.txt", 'a'),
            leaf(DIRECTORY_MODE, "a", 'b'),
            leaf("100755", "run.sh", 'c'),
        ];

        let mut forward = Tree::default();
        let mut backward = Tree::default();
        for leaf in &leaves {
            forward.add_leaf(leaf.clone());
        }
        for leaf in leaves.iter().rev() {
            backward.add_leaf(leaf.clone());
        }

        assert_eq!(forward.serialize().unwrap(), backward.serialize().unwrap());
        assert_eq!(
            forward.object_id().unwrap(),
            backward.object_id().unwrap()
        );
    }

    #[test]
    fn five_character_mode_is_zero_padded_on_parse() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"40000 sub\0");
        oid('d').write_raw_to(&mut raw).unwrap();

        let tree = Tree::deserialize(Cursor::new(raw)).unwrap();
        assert_eq!(tree.leaves()[0].mode(), "040000");
        assert!(tree.leaves()[0].is_subtree());
    }

    #[test]
    fn parse_rejects_short_mode() {
        let err = Tree::deserialize(Cursor::new(b"644 f\0".to_vec())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::errors::GitError>(),
            Some(crate::errors::GitError::CorruptObject(_))
        ));
    }

    #[test]
    fn round_trips_sorted_leaves() {
        let mut tree = Tree::default();
        tree.add_leaf(leaf("100644", "foo.txt", 'a'));
        tree.add_leaf(leaf(DIRECTORY_MODE, "foo", 'b'));
        tree.add_leaf(leaf("120000", "link", 'c'));

        let encoded = tree.serialize().unwrap();
        let nul = encoded.iter().position(|&b| b == 0).unwrap();
        let decoded = Tree::deserialize(Cursor::new(encoded.slice(nul + 1..))).unwrap();

        assert_eq!(decoded.serialize().unwrap(), encoded);
    }

    proptest! {
        #[test]
        fn leaf_permutations_hash_identically(seed in 0usize..24) {
            let mut leaves = vec![
                leaf("100644", "a.txt", 'a'),
                leaf(DIRECTORY_MODE, "a", 'b'),
                leaf("100644", "z.txt", 'c'),
                leaf(DIRECTORY_MODE, "lib", 'd'),
            ];

            // cheap deterministic permutation from the seed
            let mut permuted = Vec::new();
            let mut k = seed;
            while !leaves.is_empty() {
                permuted.push(leaves.remove(k % leaves.len()));
                k /= 2;
            }

            let mut reference = Tree::default();
            for l in [
                leaf("100644", "a.txt", 'a'),
                leaf(DIRECTORY_MODE, "a", 'b'),
                leaf("100644", "z.txt", 'c'),
                leaf(DIRECTORY_MODE, "lib", 'd'),
            ] {
                reference.add_leaf(l);
            }

            let mut tree = Tree::default();
            for l in permuted {
                tree.add_leaf(l);
            }

            prop_assert_eq!(tree.object_id().unwrap(), reference.object_id().unwrap());
        }
    }
}
