//! Annotated tag object.
//!
//! On disk: `tag <size>\0` followed by a KVLM body with `object`, `type`,
//! `tag`, `tagger`, and the message. Lightweight tags are plain ref files
//! and never produce one of these.

use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::kvlm::Kvlm;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::GitError;
use bytes::Bytes;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Tag {
    kvlm: Kvlm,
}

impl Tag {
    pub fn new(
        object_oid: ObjectId,
        object_type: ObjectType,
        name: String,
        tagger: Author,
        message: String,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push("object", object_oid.as_ref());
        kvlm.push("type", object_type.as_str());
        kvlm.push("tag", name);
        kvlm.push("tagger", tagger.display());
        kvlm.set_message(message);

        Tag { kvlm }
    }

    /// The id of the tagged object.
    pub fn object_oid(&self) -> anyhow::Result<ObjectId> {
        let object = self
            .kvlm
            .get("object")
            .ok_or_else(|| GitError::CorruptObject("tag without object line".to_string()))?;
        ObjectId::try_parse(object.to_string())
    }

    /// The declared kind of the tagged object.
    pub fn target_type(&self) -> anyhow::Result<ObjectType> {
        let kind = self
            .kvlm
            .get("type")
            .ok_or_else(|| GitError::CorruptObject("tag without type line".to_string()))?;
        ObjectType::try_from(kind)
    }

    pub fn name(&self) -> Option<&str> {
        self.kvlm.get("tag")
    }

    pub fn tagger(&self) -> anyhow::Result<Author> {
        let tagger = self
            .kvlm
            .get("tagger")
            .ok_or_else(|| GitError::CorruptObject("tag without tagger line".to_string()))?;
        Author::try_from(tagger)
    }

    pub fn message(&self) -> &str {
        self.kvlm.message()
    }
}

impl Packable for Tag {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let content_bytes = self.kvlm.serialize();

        let mut tag_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tag_bytes.write_all(header.as_bytes())?;
        tag_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tag_bytes))
    }
}

impl Unpackable for Tag {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        Ok(Tag {
            kvlm: Kvlm::parse(&content)?,
        })
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.kvlm.serialize()).into_owned()
    }
}
