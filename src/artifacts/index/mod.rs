//! Binary index (staging area) file format, version 2.
//!
//! ```text
//! Header (12 bytes, big-endian):
//!   - Signature: "DIRC" (4 bytes)
//!   - Version: 2 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length):
//!   - 62-byte fixed prefix (stat metadata, oid, packed mode and flags)
//!   - NUL-terminated name, zero-padded to the next 8-byte boundary
//! ```

pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of the index header in bytes.
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files.
pub const SIGNATURE: &[u8; 4] = b"DIRC";

/// The only supported index format version.
pub const VERSION: u32 = 2;
