//! Git object kinds and their canonical encodings.
//!
//! Every object is stored as `<kind> <size>\0<payload>` and addressed by the
//! SHA-1 of that full encoding:
//!
//! - **Blob**: opaque file content
//! - **Tree**: directory listing (mode, name, object id per leaf)
//! - **Commit**: key-value list with message (KVLM) referencing a tree
//! - **Tag**: KVLM referencing any other object

pub mod blob;
pub mod commit;
pub mod kvlm;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tag;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal form.
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of a SHA-1 hash in raw bytes.
pub const OBJECT_ID_RAW_LENGTH: usize = 20;
