use crate::areas::database::Database;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::GitError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One differing path: the blob id on each side, `None` when the path does
/// not exist on that side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreeChange {
    pub old: Option<ObjectId>,
    pub new: Option<ObjectId>,
}

/// Paths that differ between two trees, sorted by path.
pub type ChangeSet = BTreeMap<PathBuf, TreeChange>;

/// Computes path-wise differences between two trees by flattening each
/// side into a path-to-blob map.
#[derive(Debug)]
pub struct TreeDiff<'a> {
    database: &'a Database,
    changes: ChangeSet,
}

impl<'a> TreeDiff<'a> {
    pub fn new(database: &'a Database) -> Self {
        TreeDiff {
            database,
            changes: ChangeSet::new(),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Record the differences between the `old` and `new` trees. `None`
    /// stands for an empty tree, so diffing against `None` lists every
    /// path on the other side.
    pub fn compare(
        &mut self,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
    ) -> anyhow::Result<()> {
        if old == new {
            return Ok(());
        }

        let old_map = self.flatten(old)?;
        let new_map = self.flatten(new)?;

        for (path, old_oid) in &old_map {
            let new_oid = new_map.get(path);
            if new_oid != Some(old_oid) {
                self.changes.insert(
                    path.clone(),
                    TreeChange {
                        old: Some(old_oid.clone()),
                        new: new_oid.cloned(),
                    },
                );
            }
        }

        for (path, new_oid) in &new_map {
            if !old_map.contains_key(path) {
                self.changes.insert(
                    path.clone(),
                    TreeChange {
                        old: None,
                        new: Some(new_oid.clone()),
                    },
                );
            }
        }

        Ok(())
    }

    fn flatten(&self, oid: Option<&ObjectId>) -> anyhow::Result<BTreeMap<PathBuf, ObjectId>> {
        let mut map = BTreeMap::new();
        if let Some(oid) = oid {
            self.collect(oid, Path::new(""), &mut map)?;
        }
        Ok(map)
    }

    fn collect(
        &self,
        oid: &ObjectId,
        prefix: &Path,
        map: &mut BTreeMap<PathBuf, ObjectId>,
    ) -> anyhow::Result<()> {
        match self.database.parse_object(oid)? {
            ObjectBox::Tree(tree) => {
                for leaf in tree.leaves() {
                    let path = prefix.join(leaf.name());
                    if leaf.is_subtree() {
                        self.collect(leaf.oid(), &path, map)?;
                    } else {
                        map.insert(path, leaf.oid().clone());
                    }
                }
                Ok(())
            }
            // a commit stands in for its tree
            ObjectBox::Commit(commit) => self.collect(&commit.tree_oid()?, prefix, map),
            other => Err(GitError::CorruptObject(format!(
                "object {} is a {}, expected a tree",
                oid,
                other.object_type()
            ))
            .into()),
        }
    }
}
