use crate::areas::repository::Repository;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::GitError;
use std::io::Write;

impl Repository {
    /// Resolve `name` to an object id, optionally insisting on (and
    /// dereferencing to) a particular kind.
    pub fn rev_parse(&self, name: &str, expected: Option<ObjectType>) -> anyhow::Result<()> {
        let oid = self
            .refs()
            .find_object(self.database(), name, expected, true)?
            .ok_or_else(|| GitError::NoSuchReference(name.to_string()))?;

        writeln!(self.writer(), "{}", oid)?;
        Ok(())
    }
}
