use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::errors::GitError;
use anyhow::Context;
use bytes::Bytes;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{BufReader, Cursor, Read, Write};
use std::path::Path;

/// Content-addressable object store rooted at `<git_dir>/objects`.
///
/// Objects are zlib-compressed loose files fanned out over a two-hex-digit
/// directory, the remaining 38 digits forming the file name.
#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize, compress and store an object, returning its id.
    ///
    /// Storing an object that already exists is a no-op: content addressing
    /// guarantees the bytes on disk are already the right ones.
    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let oid = object.object_id()?;
        let object_path = self.path.join(object.object_path()?);

        if object_path.exists() {
            log::debug!("object {} already stored", oid);
            return Ok(oid);
        }

        let parent = object_path
            .parent()
            .ok_or_else(|| GitError::CorruptObject(format!("invalid object path for {}", oid)))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create directory {}", parent.display()))?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&object.serialize()?)?;
        let compressed = encoder.finish()?;

        // write-then-rename so readers never observe a partial object
        let temp_path = parent.join(format!("tmp-{}-{:08x}", oid.to_short_oid(), rand::random::<u32>()));
        std::fs::write(&temp_path, &compressed)
            .with_context(|| format!("Unable to write file {}", temp_path.display()))?;
        std::fs::rename(&temp_path, &object_path)
            .with_context(|| format!("Unable to persist object {}", oid))?;

        Ok(oid)
    }

    /// Read and decompress the raw `<kind> <size>\0<payload>` bytes of an object.
    pub fn load(&self, oid: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.path.join(oid.to_path());

        let compressed = match std::fs::read(&object_path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(GitError::NotFound(format!("object {}", oid)).into());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Unable to read object {}", oid));
            }
        };

        let mut decoder = ZlibDecoder::new(compressed.as_slice());
        let mut raw = Vec::new();
        decoder
            .read_to_end(&mut raw)
            .map_err(|_| GitError::CorruptObject(format!("object {} is not valid zlib", oid)))?;

        Ok(Bytes::from(raw))
    }

    /// Read just the kind of an object without materializing its payload.
    pub fn object_type(&self, oid: &ObjectId) -> anyhow::Result<ObjectType> {
        let raw = self.load(oid)?;
        let mut reader = BufReader::new(Cursor::new(raw));
        let (object_type, _) = ObjectType::parse_header(&mut reader)?;

        Ok(object_type)
    }

    /// Load, validate and deserialize an object into its typed form.
    pub fn parse_object(&self, oid: &ObjectId) -> anyhow::Result<ObjectBox> {
        let raw = self.load(oid)?;
        let mut reader = BufReader::new(Cursor::new(raw.clone()));
        let (object_type, declared_length) = ObjectType::parse_header(&mut reader)?;

        let header_length = object_type.as_str().len() + 1 + declared_length.to_string().len() + 1;
        let actual_length = raw.len().saturating_sub(header_length);
        if declared_length != actual_length {
            return Err(GitError::CorruptObject(format!(
                "object {} declares {} payload bytes but carries {}",
                oid, declared_length, actual_length
            ))
            .into());
        }

        let object = match object_type {
            ObjectType::Blob => ObjectBox::Blob(Box::new(Blob::deserialize(&mut reader)?)),
            ObjectType::Tree => ObjectBox::Tree(Box::new(Tree::deserialize(&mut reader)?)),
            ObjectType::Commit => ObjectBox::Commit(Box::new(Commit::deserialize(&mut reader)?)),
            ObjectType::Tag => ObjectBox::Tag(Box::new(Tag::deserialize(&mut reader)?)),
        };

        Ok(object)
    }

    pub fn parse_object_as_blob(&self, oid: &ObjectId) -> anyhow::Result<Box<Blob>> {
        match self.parse_object(oid)? {
            ObjectBox::Blob(blob) => Ok(blob),
            other => Err(GitError::CorruptObject(format!(
                "object {} is a {}, expected a blob",
                oid,
                other.object_type()
            ))
            .into()),
        }
    }

    pub fn parse_object_as_tree(&self, oid: &ObjectId) -> anyhow::Result<Box<Tree>> {
        match self.parse_object(oid)? {
            ObjectBox::Tree(tree) => Ok(tree),
            other => Err(GitError::CorruptObject(format!(
                "object {} is a {}, expected a tree",
                oid,
                other.object_type()
            ))
            .into()),
        }
    }

    pub fn parse_object_as_commit(&self, oid: &ObjectId) -> anyhow::Result<Box<Commit>> {
        match self.parse_object(oid)? {
            ObjectBox::Commit(commit) => Ok(commit),
            other => Err(GitError::CorruptObject(format!(
                "object {} is a {}, expected a commit",
                oid,
                other.object_type()
            ))
            .into()),
        }
    }

    /// Collect ids of stored objects whose hex form starts with `prefix`.
    ///
    /// Only the fan-out directory named by the first two characters is
    /// scanned, so the prefix must be at least that long.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.len() < 2 {
            return Ok(Vec::new());
        }
        let fan_out = self.path.join(&prefix[..2]);

        let mut matches = Vec::new();
        let entries = match std::fs::read_dir(&fan_out) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(matches),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Unable to scan {}", fan_out.display()));
            }
        };

        let rest = &prefix[2..];
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(rest) {
                if let Ok(oid) = ObjectId::try_parse(format!("{}{}", &prefix[..2], name)) {
                    matches.push(oid);
                }
            }
        }

        matches.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        Ok(matches)
    }
}
