//! Core repository components.
//!
//! - `config`: git-style configuration lookup (user identity, core settings)
//! - `database`: content-addressed loose object store
//! - `index`: staging area (binary version-2 index file)
//! - `refs`: reference management (HEAD, branches, tags, name resolution)
//! - `repository`: repository discovery, layout, and coordination
//! - `workspace`: working directory file system operations

pub mod config;
pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
