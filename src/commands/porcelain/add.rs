use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::blob::Blob;
use std::path::PathBuf;

impl Repository {
    /// Stage the given files or directories: store each file's content as
    /// a blob and record it in the index.
    pub fn add(&self, paths: &[PathBuf]) -> anyhow::Result<()> {
        let mut expanded = Vec::new();
        for path in paths {
            let relative = self.workspace().relativize(path)?;
            expanded.extend(self.workspace().list_files(Some(relative.as_path()))?);
        }

        let mut index = self.index();
        for path in expanded {
            let content = self.workspace().read_file(&path)?;
            let metadata = self.workspace().stat_file(&path)?;

            let oid = self.database().store(&Blob::new(content))?;
            index.upsert(IndexEntry::new(path, oid, metadata));
        }

        index.write()
    }
}
