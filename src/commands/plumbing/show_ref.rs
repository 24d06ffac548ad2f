use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    /// List every ref under `refs/` with its resolved object id.
    pub fn show_ref(&self) -> anyhow::Result<()> {
        let refs = self.refs().list_refs()?;
        let mut writer = self.writer();

        for (name, oid) in refs {
            writeln!(writer, "{} {}", oid, name)?;
        }

        Ok(())
    }
}
