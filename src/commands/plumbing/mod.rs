//! Plumbing commands, direct access to the storage engine.
//!
//! - `cat-file`: pretty-print any object by name
//! - `hash-object`: compute an object id, optionally storing the blob
//! - `ls-tree`: list the entries of a tree object
//! - `ls-files`: list the staged paths
//! - `show-ref`: list refs with their resolved ids
//! - `rev-parse`: resolve a name to an object id

pub mod cat_file;
pub mod hash_object;
pub mod ls_files;
pub mod ls_tree;
pub mod rev_parse;
pub mod show_ref;
