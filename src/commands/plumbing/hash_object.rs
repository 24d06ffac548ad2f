use crate::areas::repository::Repository;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Hash a file as a blob and print its id. With `write`, also store
    /// the blob in the object database.
    pub fn hash_object(&self, path: &Path, write: bool) -> anyhow::Result<()> {
        let relative = self.workspace().relativize(path)?;
        let content = self.workspace().read_file(&relative)?;
        let blob = Blob::new(content);

        let oid = if write {
            self.database().store(&blob)?
        } else {
            blob.object_id()?
        };

        writeln!(self.writer(), "{}", oid)?;
        Ok(())
    }
}
