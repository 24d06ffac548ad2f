use crate::errors::GitError;
use std::io::BufRead;

/// The four object kinds, dispatched by the literal ASCII name in the
/// object header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
            ObjectType::Tag => "tag",
        }
    }

    /// Parse the `"<kind> <size>\0"` header, consuming it from the reader.
    ///
    /// Returns the kind and the declared payload length; the caller is
    /// responsible for checking the declared length against the bytes that
    /// actually follow.
    pub fn parse_header(data_reader: &mut impl BufRead) -> anyhow::Result<(ObjectType, usize)> {
        let mut kind = Vec::new();
        data_reader.read_until(b' ', &mut kind)?;

        let kind = String::from_utf8(kind)
            .map_err(|_| GitError::CorruptObject("non-ASCII object kind".to_string()))?;
        let kind = ObjectType::try_from(kind.trim())?;

        let mut size = Vec::new();
        data_reader.read_until(b'\0', &mut size)?;
        if size.pop() != Some(b'\0') {
            return Err(GitError::CorruptObject("unterminated object header".to_string()).into());
        }

        let size = std::str::from_utf8(&size)
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .ok_or_else(|| GitError::CorruptObject("malformed length in header".to_string()))?;

        Ok((kind, size))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            "tag" => Ok(ObjectType::Tag),
            other => Err(GitError::UnknownObjectKind(other.to_string()).into()),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
