use crate::areas::refs::HEAD;
use crate::areas::repository::{Repository, DEFAULT_BRANCH};
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::build_tree_from_index;
use std::io::Write;

impl Repository {
    /// Snapshot the index as a commit: build the tree hierarchy, create the
    /// commit object and advance the current branch.
    pub fn commit(&self, message: &str) -> anyhow::Result<ObjectId> {
        if message.trim().is_empty() {
            anyhow::bail!("empty commit message");
        }

        let index = self.index();
        let tree_oid = build_tree_from_index(self.database(), &index)?;
        drop(index);

        let parent = self.refs().resolve_ref(HEAD)?;
        let parents: Vec<ObjectId> = parent.into_iter().collect();
        let is_root = parents.is_empty();

        let (name, email) = self.config()?.user_identity()?;
        let author = Author::new(name, email);

        let commit = Commit::new(parents, tree_oid, author, message.to_string());
        let oid = self.database().store(&commit)?;

        self.refs().update_ref(HEAD, &oid)?;

        let branch = self
            .refs()
            .current_branch()?
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        writeln!(
            self.writer(),
            "[{}{} {}] {}",
            branch,
            if is_root { " (root-commit)" } else { "" },
            oid.to_short_oid(),
            commit.short_message()
        )?;

        Ok(oid)
    }
}
