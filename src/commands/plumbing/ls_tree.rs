use crate::areas::repository::Repository;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::GitError;
use std::io::Write;

impl Repository {
    /// List the entries of the tree `name` resolves to. Commits and
    /// annotated tags are followed to their tree.
    pub fn ls_tree(&self, name: &str) -> anyhow::Result<()> {
        let oid = self
            .refs()
            .find_object(self.database(), name, Some(ObjectType::Tree), true)?
            .ok_or_else(|| GitError::NotFound(format!("no tree reachable from {}", name)))?;

        let tree = self.database().parse_object_as_tree(&oid)?;
        write!(self.writer(), "{}", tree.display())?;

        Ok(())
    }
}
