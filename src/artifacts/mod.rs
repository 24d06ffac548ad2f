//! Data structures and algorithms of the storage engine.
//!
//! - `objects`: the four object kinds and their canonical byte encodings
//! - `index`: the binary index entry/header codecs
//! - `diff`: tree flattening and path-wise comparison
//! - `checkout`: materializing trees and applying change sets to the worktree

pub mod checkout;
pub mod diff;
pub mod index;
pub mod objects;
