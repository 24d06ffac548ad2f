use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    /// List the staged paths, in index order.
    pub fn ls_files(&self) -> anyhow::Result<()> {
        let index = self.index();
        let mut writer = self.writer();

        for entry in index.entries() {
            writeln!(writer, "{}", entry.name.display())?;
        }

        Ok(())
    }
}
