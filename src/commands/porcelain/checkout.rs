use crate::areas::repository::Repository;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::GitError;
use anyhow::Context;
use std::path::Path;

impl Repository {
    /// Materialize the tree `name` resolves to (commits and annotated tags
    /// are followed) under the directory `target`. The directory must be
    /// empty if it already exists.
    pub fn checkout(&self, name: &str, target: &Path) -> anyhow::Result<()> {
        let oid = self
            .refs()
            .find_object(self.database(), name, Some(ObjectType::Tree), true)?
            .ok_or_else(|| GitError::NotFound(format!("no tree reachable from {}", name)))?;

        if target.exists() {
            if !target.is_dir() {
                anyhow::bail!("{} exists and is not a directory", target.display());
            }
            let occupied = std::fs::read_dir(target)
                .with_context(|| format!("Unable to read directory {}", target.display()))?
                .next()
                .is_some();
            if occupied {
                anyhow::bail!("{} is not empty", target.display());
            }
        }

        let tree = self.database().parse_object_as_tree(&oid)?;
        Migration::new(self.database(), self.workspace()).checkout_tree(&tree, target)
    }
}
