//! The command layer: thin glue over the core APIs.
//!
//! Each file adds one command to [`Repository`](crate::areas::repository::Repository)
//! via an `impl` block, keeping argument handling and output formatting out
//! of the core modules.

pub mod plumbing;
pub mod porcelain;
