use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::errors::GitError;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::Write;

/// The 12-byte index file header: magic, format version, entry count.
#[derive(Debug, Clone, new)]
pub struct IndexHeader {
    pub(crate) version: u32,
    pub(crate) entries_count: u32,
}

impl IndexHeader {
    pub(crate) fn empty() -> Self {
        IndexHeader {
            version: VERSION,
            entries_count: 0,
        }
    }

    pub(crate) fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.write_all(SIGNATURE)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.version)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.entries_count)?;

        Ok(Bytes::from(bytes))
    }

    pub(crate) fn deserialize(bytes: &[u8]) -> anyhow::Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(GitError::CorruptIndex("truncated header".to_string()).into());
        }

        if &bytes[0..4] != SIGNATURE {
            return Err(GitError::CorruptIndex("invalid signature".to_string()).into());
        }

        let version = byteorder::NetworkEndian::read_u32(&bytes[4..8]);
        if version != VERSION {
            return Err(GitError::UnsupportedIndexVersion(version).into());
        }

        let entries_count = byteorder::NetworkEndian::read_u32(&bytes[8..12]);

        Ok(IndexHeader {
            version,
            entries_count,
        })
    }
}
