//! Index entry binary codec.
//!
//! Each entry is a 62-byte fixed prefix (big-endian stat metadata, the
//! 20-byte raw object id, a packed 16-bit mode word and a packed 16-bit
//! flags word) followed by the NUL-terminated path, zero-padded so the
//! entry length is a multiple of 8. The flags word packs
//! `assume-valid:1 | extended:1 | stage:2 | name-length:12`; a name length
//! of 0xFFF means "at least 0xFFF" and the real end is found by scanning
//! for the NUL.

use crate::artifacts::index::entry_mode::ModeType;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::GitError;
use bitflags::bitflags;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use is_executable::IsExecutable;
use std::fs::Metadata;
use std::io::Write;
use std::os::unix::prelude::MetadataExt;
use std::path::{Path, PathBuf};

/// Fixed prefix length before the entry name.
pub const ENTRY_PREFIX_SIZE: usize = 62;

/// Entry lengths are padded to a multiple of this.
pub const ENTRY_BLOCK: usize = 8;

/// Largest name length representable in the 12-bit flags field.
pub const MAX_NAME_LENGTH: usize = 0xFFF;

bitflags! {
    /// The boolean bits of the entry flags word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntryFlagBits: u16 {
        const ASSUME_VALID = 0x8000;
        const EXTENDED = 0x4000;
    }
}

const STAGE_MASK: u16 = 0x3000;
const STAGE_SHIFT: u16 = 12;
const NAME_LENGTH_MASK: u16 = 0x0FFF;

/// Filesystem metadata captured per tracked file, enabling change
/// detection without re-reading content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub ctime: u32,
    pub ctime_nsec: u32,
    pub mtime: u32,
    pub mtime_nsec: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode_type: ModeType,
    pub mode_perms: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
}

impl EntryMetadata {
    /// Capture metadata from a `stat` of the file at `path`.
    pub fn from_fs(path: &Path, metadata: &Metadata) -> Self {
        let (mode_type, mode_perms) = if metadata.file_type().is_symlink() {
            (ModeType::Symlink, 0)
        } else if path.is_executable() {
            (ModeType::Regular, 0o755)
        } else {
            (ModeType::Regular, 0o644)
        };

        EntryMetadata {
            ctime: metadata.ctime() as u32,
            ctime_nsec: metadata.ctime_nsec() as u32,
            mtime: metadata.mtime() as u32,
            mtime_nsec: metadata.mtime_nsec() as u32,
            dev: metadata.dev() as u32,
            ino: metadata.ino() as u32,
            mode_type,
            mode_perms,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size() as u32,
        }
    }
}

/// One tracked path in the staging area.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// Path relative to the worktree root.
    pub name: PathBuf,
    /// Blob id of the staged content.
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
    #[new(default)]
    pub assume_valid: bool,
    #[new(default)]
    pub stage: u8,
}

impl IndexEntry {
    /// The six-character octal ASCII mode recorded for this entry in trees.
    pub fn tree_mode(&self) -> String {
        format!(
            "{:02o}{:04o}",
            self.metadata.mode_type.as_u16(),
            self.metadata.mode_perms
        )
    }

    pub fn serialize(&self) -> anyhow::Result<Bytes> {
        let name = self
            .name
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid entry name {:?}", self.name))?;

        let mode = (self.metadata.mode_type.as_u16() << 12) | (self.metadata.mode_perms & 0x0FFF);

        let mut flag_bits = EntryFlagBits::empty();
        flag_bits.set(EntryFlagBits::ASSUME_VALID, self.assume_valid);
        let flags = flag_bits.bits()
            | ((self.stage as u16) << STAGE_SHIFT) & STAGE_MASK
            | (name.len().min(MAX_NAME_LENGTH) as u16);

        let mut entry_bytes = Vec::new();
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime_nsec)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime_nsec)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.dev)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ino)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(0)?; // reserved
        entry_bytes.write_u16::<byteorder::NetworkEndian>(mode)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.uid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.gid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.size)?;
        self.oid.write_raw_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(flags)?;
        entry_bytes.write_all(name.as_bytes())?;

        // NUL terminator, then pad the entry to the block boundary
        entry_bytes.push(0);
        while entry_bytes.len() % ENTRY_BLOCK != 0 {
            entry_bytes.push(0);
        }

        Ok(Bytes::from(entry_bytes))
    }

    /// Parse one entry starting at `offset` within the entries section.
    ///
    /// Returns the entry and the offset of the next one (padding included).
    pub fn parse(content: &[u8], offset: usize) -> anyhow::Result<(Self, usize)> {
        if content.len() < offset + ENTRY_PREFIX_SIZE {
            return Err(GitError::CorruptIndex("truncated entry".to_string()).into());
        }
        let prefix = &content[offset..offset + ENTRY_PREFIX_SIZE];

        let ctime = byteorder::NetworkEndian::read_u32(&prefix[0..4]);
        let ctime_nsec = byteorder::NetworkEndian::read_u32(&prefix[4..8]);
        let mtime = byteorder::NetworkEndian::read_u32(&prefix[8..12]);
        let mtime_nsec = byteorder::NetworkEndian::read_u32(&prefix[12..16]);
        let dev = byteorder::NetworkEndian::read_u32(&prefix[16..20]);
        let ino = byteorder::NetworkEndian::read_u32(&prefix[20..24]);

        let reserved = byteorder::NetworkEndian::read_u16(&prefix[24..26]);
        if reserved != 0 {
            return Err(GitError::CorruptIndex("non-zero reserved bytes".to_string()).into());
        }

        let mode = byteorder::NetworkEndian::read_u16(&prefix[26..28]);
        let mode_type = ModeType::try_from_u16(mode >> 12)?;
        let mode_perms = mode & 0x0FFF;

        let uid = byteorder::NetworkEndian::read_u32(&prefix[28..32]);
        let gid = byteorder::NetworkEndian::read_u32(&prefix[32..36]);
        let size = byteorder::NetworkEndian::read_u32(&prefix[36..40]);
        let oid = ObjectId::read_raw_from(&mut &prefix[40..60])?;

        let flags = byteorder::NetworkEndian::read_u16(&prefix[60..62]);
        let flag_bits = EntryFlagBits::from_bits_truncate(flags);
        if flag_bits.contains(EntryFlagBits::EXTENDED) {
            return Err(GitError::CorruptIndex("extended flag is unsupported".to_string()).into());
        }
        let assume_valid = flag_bits.contains(EntryFlagBits::ASSUME_VALID);
        let stage = ((flags & STAGE_MASK) >> STAGE_SHIFT) as u8;
        let name_length = (flags & NAME_LENGTH_MASK) as usize;

        let name_start = offset + ENTRY_PREFIX_SIZE;
        let (name_bytes, consumed) = if name_length < MAX_NAME_LENGTH {
            if content.get(name_start + name_length) != Some(&0) {
                return Err(
                    GitError::CorruptIndex("missing NUL after entry name".to_string()).into(),
                );
            }
            (
                &content[name_start..name_start + name_length],
                ENTRY_PREFIX_SIZE + name_length + 1,
            )
        } else {
            // the 12-bit field saturated: the real end is the next NUL at
            // or after the maximum
            log::warn!("index entry name is at least {:#x} bytes long", name_length);
            let nul = content[name_start + MAX_NAME_LENGTH..]
                .iter()
                .position(|&b| b == 0)
                .map(|i| name_start + MAX_NAME_LENGTH + i)
                .ok_or_else(|| {
                    GitError::CorruptIndex("missing NUL after entry name".to_string())
                })?;
            (&content[name_start..nul], nul - offset + 1)
        };

        let name = std::str::from_utf8(name_bytes)
            .map_err(|_| GitError::CorruptIndex("non-UTF-8 entry name".to_string()))?;

        let entry = IndexEntry {
            name: PathBuf::from(name),
            oid,
            metadata: EntryMetadata {
                ctime,
                ctime_nsec,
                mtime,
                mtime_nsec,
                dev,
                ino,
                mode_type,
                mode_perms,
                uid,
                gid,
                size,
            },
            assume_valid,
            stage,
        };

        let padded = consumed.div_ceil(ENTRY_BLOCK) * ENTRY_BLOCK;
        Ok((entry, offset + padded))
    }
}
