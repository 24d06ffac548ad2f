//! Error kinds surfaced by the storage engine.
//!
//! All fallible APIs return `anyhow::Result`; the variants below are the
//! recoverable, nameable failure kinds and can be recovered from an
//! `anyhow::Error` with `downcast_ref::<GitError>()`. Everything here
//! indicates a data or input problem, never a transient condition, so no
//! operation retries on them.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    /// A ref, object, or path is absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Length mismatch, bad compression, or a malformed tree/kvlm body.
    #[error("corrupt object: {0}")]
    CorruptObject(String),

    /// Bad magic, non-zero reserved bytes, or malformed entry flags.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// Only index format version 2 is supported.
    #[error("unsupported index version {0}")]
    UnsupportedIndexVersion(u32),

    /// The object header names a kind other than blob/tree/commit/tag.
    #[error("unknown object kind {0:?}")]
    UnknownObjectKind(String),

    /// A name resolves to more than one object.
    #[error("ambiguous reference {name}: candidates are {}", .candidates.join(", "))]
    AmbiguousReference {
        name: String,
        candidates: Vec<String>,
    },

    /// A name resolves to nothing at all.
    #[error("no such reference {0}")]
    NoSuchReference(String),

    /// A symbolic ref chain exceeded the hop bound.
    #[error("symbolic ref cycle detected while resolving {0}")]
    RefCycle(String),

    /// The given path does not live under the repository worktree.
    #[error("path {0:?} is outside the worktree")]
    PathOutsideWorktree(PathBuf),

    /// The given path has no index entry.
    #[error("path {0:?} is not tracked in the index")]
    PathNotTracked(PathBuf),

    /// A diff entry with neither an old nor a new side.
    #[error("diff entry for {0:?} has neither side")]
    AmbiguousDiffEntry(PathBuf),
}
