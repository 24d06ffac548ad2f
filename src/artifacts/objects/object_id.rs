//! Object identifier (SHA-1 hash).
//!
//! Object ids are 40-character lowercase hexadecimal strings. On disk the
//! object lives at `objects/<first-2-chars>/<remaining-38-chars>` and
//! trees/index entries embed the id as 20 raw big-endian bytes.

use crate::artifacts::objects::{OBJECT_ID_LENGTH, OBJECT_ID_RAW_LENGTH};
use std::io;
use std::path::PathBuf;

/// A content-derived object identifier, never reused for different content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Validate a 40-character hex string, normalizing to lowercase.
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            return Err(anyhow::anyhow!("Invalid object ID length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("Invalid object ID characters: {}", id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Write the id as 20 raw bytes.
    pub fn write_raw_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let hex40 = self.as_ref();

        for i in (0..OBJECT_ID_LENGTH).step_by(2) {
            let byte = u8::from_str_radix(&hex40[i..i + 2], 16)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Invalid hex digit"))?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read an id from 20 raw bytes.
    pub fn read_raw_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut raw = [0u8; OBJECT_ID_RAW_LENGTH];
        reader.read_exact(&mut raw)?;

        let mut hex40 = String::with_capacity(OBJECT_ID_LENGTH);
        for byte in raw {
            hex40.push_str(&format!("{:02x}", byte));
        }

        Self::try_parse(hex40)
    }

    /// Fan-out path under the object store: `XX/YYYY...` with XX the first
    /// two characters.
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// First seven characters, the conventional short form.
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_normalizes_to_lowercase() {
        let oid =
            ObjectId::try_parse("B45EF6FEC89518D314F546FD6C3025367B721684".to_string()).unwrap();
        assert_eq!(oid.as_ref(), "b45ef6fec89518d314f546fd6c3025367b721684");
    }

    #[test]
    fn parse_rejects_bad_length_and_characters() {
        assert!(ObjectId::try_parse("abc".to_string()).is_err());
        assert!(ObjectId::try_parse("z".repeat(40)).is_err());
    }

    #[test]
    fn raw_round_trip() {
        let oid =
            ObjectId::try_parse("b45ef6fec89518d314f546fd6c3025367b721684".to_string()).unwrap();

        let mut raw = Vec::new();
        oid.write_raw_to(&mut raw).unwrap();
        assert_eq!(raw.len(), OBJECT_ID_RAW_LENGTH);

        let read_back = ObjectId::read_raw_from(&mut raw.as_slice()).unwrap();
        assert_eq!(read_back, oid);
    }

    #[test]
    fn fan_out_path_splits_after_two_characters() {
        let oid =
            ObjectId::try_parse("b45ef6fec89518d314f546fd6c3025367b721684".to_string()).unwrap();
        assert_eq!(
            oid.to_path(),
            PathBuf::from("b4").join("5ef6fec89518d314f546fd6c3025367b721684")
        );
    }
}
