//! Commit object.
//!
//! On disk: `commit <size>\0` followed by a KVLM body with `tree`, zero or
//! more `parent` lines, `author`, `committer`, and the message.

use crate::artifacts::objects::kvlm::Kvlm;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::GitError;
use bytes::Bytes;
use std::io::{BufRead, Write};

/// Author or committer stamp: name, email, timestamp with UTC offset.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    /// `"Name <email> <unix-ts> <±HHMM>"`, the wire form.
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // "name <email> timestamp timezone"; split from the right so names
        // containing spaces survive
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(anyhow::anyhow!("Invalid author format"));
        }

        let timezone = parts[0];
        let timestamp = parts[1];
        let name_email_part = parts[2];

        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '<'"))?;
        let email_end = name_email_part
            .find('>')
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '>'"))?;

        let name = name_email_part[..email_start].trim().to_string();
        let email = name_email_part[email_start + 1..email_end].to_string();

        let timestamp =
            chrono::DateTime::parse_from_str(&format!("{} {}", timestamp, timezone), "%s %z")
                .map_err(|_| anyhow::anyhow!("Invalid timestamp or timezone"))?;

        Ok(Author {
            name,
            email,
            timestamp,
        })
    }
}

/// Commit object backed by its KVLM body.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    kvlm: Kvlm,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push("tree", tree_oid.as_ref());
        for parent in &parents {
            kvlm.push("parent", parent.as_ref());
        }
        kvlm.push("author", author.display());
        kvlm.push("committer", author.display());
        kvlm.set_message(message);

        Commit { kvlm }
    }

    pub fn tree_oid(&self) -> anyhow::Result<ObjectId> {
        let tree = self
            .kvlm
            .get("tree")
            .ok_or_else(|| GitError::CorruptObject("commit without tree line".to_string()))?;
        ObjectId::try_parse(tree.to_string())
    }

    pub fn parents(&self) -> anyhow::Result<Vec<ObjectId>> {
        self.kvlm
            .get_all("parent")
            .iter()
            .map(|parent| ObjectId::try_parse(parent.clone()))
            .collect()
    }

    pub fn parent(&self) -> Option<&str> {
        self.kvlm.get("parent")
    }

    pub fn author(&self) -> anyhow::Result<Author> {
        let author = self
            .kvlm
            .get("author")
            .ok_or_else(|| GitError::CorruptObject("commit without author line".to_string()))?;
        Author::try_from(author)
    }

    pub fn committer(&self) -> anyhow::Result<Author> {
        let committer = self
            .kvlm
            .get("committer")
            .ok_or_else(|| GitError::CorruptObject("commit without committer line".to_string()))?;
        Author::try_from(committer)
    }

    pub fn message(&self) -> &str {
        self.kvlm.message()
    }

    /// First line of the message, for one-line displays.
    pub fn short_message(&self) -> String {
        self.kvlm.message().lines().next().unwrap_or("").to_string()
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let content_bytes = self.kvlm.serialize();

        let mut commit_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        commit_bytes.write_all(header.as_bytes())?;
        commit_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(commit_bytes))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        Ok(Commit {
            kvlm: Kvlm::parse(&content)?,
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.kvlm.serialize()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn oid(fill: char) -> ObjectId {
        ObjectId::try_parse(fill.to_string().repeat(40)).unwrap()
    }

    fn author() -> Author {
        let timestamp =
            chrono::DateTime::parse_from_str("1527025023 +0200", "%s %z").unwrap();
        Author::new_with_timestamp(
            "Alice Cooper".to_string(),
            "alice@example.com".to_string(),
            timestamp,
        )
    }

    #[test]
    fn author_wire_form_round_trips() {
        let author = author();
        let parsed = Author::try_from(author.display().as_str()).unwrap();
        assert_eq!(parsed, author);
    }

    #[test]
    fn commit_round_trips_through_codec() {
        let commit = Commit::new(
            vec![oid('a'), oid('b')],
            oid('c'),
            author(),
            "Merge branch 'topic'\n".to_string(),
        );

        let encoded = commit.serialize().unwrap();
        let nul = encoded.iter().position(|&b| b == 0).unwrap();
        let decoded = Commit::deserialize(Cursor::new(encoded.slice(nul + 1..))).unwrap();

        assert_eq!(decoded, commit);
        assert_eq!(decoded.tree_oid().unwrap(), oid('c'));
        assert_eq!(decoded.parents().unwrap(), vec![oid('a'), oid('b')]);
    }

    #[test]
    fn initial_commit_has_no_parent() {
        let commit = Commit::new(vec![], oid('c'), author(), "root\n".to_string());
        assert_eq!(commit.parent(), None);
        assert!(commit.parents().unwrap().is_empty());
    }
}
