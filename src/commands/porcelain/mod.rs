//! Porcelain commands, the user-facing workflows.
//!
//! - `init`: create an empty repository
//! - `add` / `rm`: stage and unstage files
//! - `commit`: snapshot the index as a commit
//! - `tag`: create lightweight or annotated tags
//! - `switch`: create a branch and move HEAD to it
//! - `checkout`: materialize a tree into a directory

pub mod add;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod rm;
pub mod switch;
pub mod tag;
