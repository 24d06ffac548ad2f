use crate::areas::refs::{HEAD, HEADS_PREFIX};
use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    /// Create a branch at the current HEAD commit and point HEAD at it.
    ///
    /// In a repository with no commits yet only the HEAD pointer moves; the
    /// branch ref is born with the first commit.
    pub fn switch_create(&self, branch: &str) -> anyhow::Result<()> {
        let branch_ref = format!("{}{}", HEADS_PREFIX, branch);
        if self.refs().resolve_ref(&branch_ref)?.is_some() {
            anyhow::bail!("branch {} already exists", branch);
        }

        if let Some(oid) = self.refs().resolve_ref(HEAD)? {
            self.refs().create_branch(branch, &oid)?;
        }
        self.refs().set_head_to_branch(branch)?;

        writeln!(self.writer(), "Switched to a new branch '{}'", branch)?;
        Ok(())
    }
}
