use crate::areas::repository::Repository;
use crate::errors::GitError;
use std::io::Write;

impl Repository {
    /// Resolve `name` to any object and pretty-print it.
    pub fn cat_file(&self, name: &str) -> anyhow::Result<()> {
        let oid = self
            .refs()
            .find_object(self.database(), name, None, true)?
            .ok_or_else(|| GitError::NoSuchReference(name.to_string()))?;

        let object = self.database().parse_object(&oid)?;
        write!(self.writer(), "{}", object.display())?;

        Ok(())
    }
}
