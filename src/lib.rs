//! A minimal git storage engine.
//!
//! The crate reproduces git's on-disk model: a content-addressable loose
//! object database (blobs, trees, commits, tags), the binary version-2
//! staging index, refs, and the tree build/diff/checkout logic reconciling
//! trees, index, and working directory.
//!
//! - `areas`: the stateful repository components (object database, index,
//!   refs, workspace, config)
//! - `artifacts`: the object and index codecs plus diff/checkout algorithms
//! - `commands`: thin plumbing/porcelain glue over the core APIs
//! - `errors`: the recoverable failure kinds

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
