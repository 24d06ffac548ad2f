use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{HEADER_SIZE, VERSION};
use crate::errors::GitError;
use anyhow::Context;
use bytes::{BufMut, BytesMut};
use file_guard::Lock;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// The staging area, backed by the binary `index` file.
///
/// Entries keep the order in which they were inserted; re-staging an
/// existing path updates it in place.
#[derive(Debug)]
pub struct Index {
    path: Box<Path>,
    header: IndexHeader,
    entries: Vec<IndexEntry>,
}

impl Index {
    fn empty(path: Box<Path>) -> Self {
        Index {
            path,
            header: IndexHeader::empty(),
            entries: Vec::new(),
        }
    }

    /// Read the index file at `path`. A missing or zero-length file is an
    /// empty version-2 index, not an error.
    pub fn read(path: Box<Path>) -> anyhow::Result<Self> {
        let file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::empty(path));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Unable to open {}", path.display()));
            }
        };

        let _lock = file_guard::lock(&file, Lock::Shared, 0, 1)
            .with_context(|| format!("Unable to lock {}", path.display()))?;
        let mut content = Vec::new();
        let mut reader = &file;
        reader
            .read_to_end(&mut content)
            .with_context(|| format!("Unable to read {}", path.display()))?;

        if content.is_empty() {
            return Ok(Self::empty(path));
        }

        let header = IndexHeader::deserialize(&content)?;

        let mut entries = Vec::with_capacity(header.entries_count as usize);
        let mut offset = HEADER_SIZE;
        for _ in 0..header.entries_count {
            let (entry, next_offset) = IndexEntry::parse(&content, offset)?;
            entries.push(entry);
            offset = next_offset;
        }

        if offset < content.len() {
            log::debug!(
                "ignoring {} trailing bytes in {}",
                content.len() - offset,
                path.display()
            );
        }

        Ok(Index {
            path,
            header,
            entries,
        })
    }

    /// Serialize the header and entries, in order, to the index file.
    pub fn write(&self) -> anyhow::Result<()> {
        let header = IndexHeader::new(VERSION, self.entries.len() as u32);

        let mut content = BytesMut::new();
        content.put(header.serialize()?);
        for entry in &self.entries {
            content.put(entry.serialize()?);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("Unable to open {}", self.path.display()))?;
        let _lock = file_guard::lock(&file, Lock::Exclusive, 0, 1)
            .with_context(|| format!("Unable to lock {}", self.path.display()))?;

        (&file)
            .write_all(&content)
            .with_context(|| format!("Unable to write {}", self.path.display()))
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.iter().find(|entry| entry.name == path)
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.entry_by_path(path).is_some()
    }

    /// Stage an entry: replace the existing one for the same path in place,
    /// or append a new one.
    pub fn upsert(&mut self, entry: IndexEntry) {
        match self.entries.iter().position(|e| e.name == entry.name) {
            Some(position) => self.entries[position] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Unstage a path, failing if it is not tracked.
    pub fn remove_path(&mut self, path: &Path) -> anyhow::Result<()> {
        match self.entries.iter().position(|e| e.name == path) {
            Some(position) => {
                self.entries.remove(position);
                Ok(())
            }
            None => Err(GitError::PathNotTracked(PathBuf::from(path)).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::ModeType;
    use crate::artifacts::index::index_entry::EntryMetadata;
    use crate::artifacts::objects::object_id::ObjectId;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn entry(name: &str, hex: char) -> IndexEntry {
        IndexEntry::new(
            PathBuf::from(name),
            ObjectId::try_parse(hex.to_string().repeat(40)).unwrap(),
            EntryMetadata {
                ctime: 1700000000,
                mtime: 1700000000,
                mode_type: ModeType::Regular,
                mode_perms: 0o644,
                size: 42,
                ..Default::default()
            },
        )
    }

    #[rstest]
    fn missing_file_reads_as_empty_index() {
        let temp = TempDir::new().unwrap();
        let index = Index::read(temp.path().join("index").into_boxed_path()).unwrap();

        assert_eq!(index.version(), VERSION);
        assert_eq!(index.entries().count(), 0);
    }

    #[rstest]
    fn round_trip_preserves_bytes_and_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index");

        let mut index = Index::read(path.clone().into_boxed_path()).unwrap();
        index.upsert(entry("zebra.txt", 'a'));
        index.upsert(entry("alpha.txt", 'b'));
        index.upsert(entry("nested/path.rs", 'c'));
        index.write().unwrap();

        let first_bytes = std::fs::read(&path).unwrap();

        let read_back = Index::read(path.clone().into_boxed_path()).unwrap();
        assert_eq!(
            read_back.entries().map(|e| e.name.clone()).collect::<Vec<_>>(),
            vec![
                PathBuf::from("zebra.txt"),
                PathBuf::from("alpha.txt"),
                PathBuf::from("nested/path.rs"),
            ]
        );

        read_back.write().unwrap();
        let second_bytes = std::fs::read(&path).unwrap();
        assert_eq!(second_bytes, first_bytes);
    }

    #[rstest]
    fn upsert_replaces_in_place() {
        let temp = TempDir::new().unwrap();
        let mut index = Index::read(temp.path().join("index").into_boxed_path()).unwrap();

        index.upsert(entry("a.txt", 'a'));
        index.upsert(entry("b.txt", 'b'));
        index.upsert(entry("a.txt", 'c'));

        let entries: Vec<_> = index.entries().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, PathBuf::from("a.txt"));
        assert_eq!(entries[0].oid.as_ref(), "c".repeat(40));
        assert_eq!(entries[1].name, PathBuf::from("b.txt"));
    }

    #[rstest]
    fn removing_an_untracked_path_fails() {
        let temp = TempDir::new().unwrap();
        let mut index = Index::read(temp.path().join("index").into_boxed_path()).unwrap();

        let err = index.remove_path(Path::new("ghost.txt")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GitError>(),
            Some(GitError::PathNotTracked(_))
        ));
    }
}
