use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::diff::tree_diff::ChangeSet;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::errors::GitError;
use anyhow::Context;
use std::path::Path;

/// Applies a change set to the working directory, turning one tree's
/// on-disk state into another's.
#[derive(Debug)]
pub struct Migration<'a> {
    database: &'a Database,
    workspace: &'a Workspace,
}

impl<'a> Migration<'a> {
    pub fn new(database: &'a Database, workspace: &'a Workspace) -> Self {
        Migration {
            database,
            workspace,
        }
    }

    /// Apply each change: delete paths dropped by the new side, write
    /// blobs for created or replaced paths.
    pub fn apply(&self, changes: &ChangeSet) -> anyhow::Result<()> {
        for (path, change) in changes {
            match (&change.old, &change.new) {
                (Some(_), None) => self.workspace.remove_file(path)?,
                (_, Some(new_oid)) => self.write_blob(path, new_oid)?,
                (None, None) => {
                    return Err(GitError::AmbiguousDiffEntry(path.clone()).into());
                }
            }
        }

        Ok(())
    }

    fn write_blob(&self, path: &Path, oid: &ObjectId) -> anyhow::Result<()> {
        let blob = self.database.parse_object_as_blob(oid)?;
        self.workspace.write_file(path, blob.content())
    }

    /// Materialize `tree` recursively under the directory `target`, which
    /// need not be inside the worktree.
    pub fn checkout_tree(&self, tree: &Tree, target: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(target)
            .with_context(|| format!("Unable to create directory {}", target.display()))?;

        for leaf in tree.leaves() {
            let destination = target.join(leaf.name());
            if leaf.is_subtree() {
                let subtree = self.database.parse_object_as_tree(leaf.oid())?;
                self.checkout_tree(&subtree, &destination)?;
            } else {
                let blob = self.database.parse_object_as_blob(leaf.oid())?;
                std::fs::write(&destination, blob.content()).with_context(|| {
                    format!("Unable to write file {}", destination.display())
                })?;
            }
        }

        Ok(())
    }
}
