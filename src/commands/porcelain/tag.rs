use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::tag::Tag;
use crate::errors::GitError;
use std::io::Write;

impl Repository {
    /// Create a tag named `name` pointing at whatever `target` resolves
    /// to. A lightweight tag is just a ref; with `annotated`, a tag object
    /// carrying the tagger identity and `message` is written first and the
    /// ref points at it.
    pub fn tag(
        &self,
        name: &str,
        target: &str,
        annotated: bool,
        message: Option<&str>,
    ) -> anyhow::Result<()> {
        let target_oid = self
            .refs()
            .find_object(self.database(), target, None, true)?
            .ok_or_else(|| GitError::NoSuchReference(target.to_string()))?;

        let ref_target = if annotated {
            let target_type = self.database().object_type(&target_oid)?;
            let (tagger_name, tagger_email) = self.config()?.user_identity()?;

            let tag = Tag::new(
                target_oid,
                target_type,
                name.to_string(),
                Author::new(tagger_name, tagger_email),
                message.unwrap_or(name).to_string(),
            );
            self.database().store(&tag)?
        } else {
            target_oid
        };

        self.refs().create_tag_ref(name, &ref_target)?;
        Ok(())
    }

    /// List tag names, sorted.
    pub fn tag_list(&self) -> anyhow::Result<()> {
        let mut writer = self.writer();
        for (name, _) in self.refs().list_refs()? {
            if let Some(tag) = name.strip_prefix("refs/tags/") {
                writeln!(writer, "{}", tag)?;
            }
        }
        Ok(())
    }
}
