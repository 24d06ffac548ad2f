//! Key-value-list-with-message codec, the body format shared by commits
//! and tags.
//!
//! ```text
//! tree <oid>
//! parent <oid>
//! parent <oid>
//! author <name> <email> <ts> <tz>
//!
//! <free-form message>
//! ```
//!
//! A key may repeat (multiple `parent` lines on merge commits); repeats
//! collapse into an ordered list under the key's first occurrence.
//! Multi-line values prefix every line after the first with a single space,
//! stripped on parse and re-added on serialize. The parser is an explicit
//! loop over line boundaries so a message with thousands of continuation
//! lines cannot grow the call stack.

use crate::errors::GitError;

/// Ordered key/values mapping plus the distinguished trailing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kvlm {
    fields: Vec<(String, Vec<String>)>,
    message: String,
}

impl Kvlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `key`, preserving first-occurrence position for
    /// repeated keys.
    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, values)) => values.push(value.into()),
            None => self.fields.push((key.to_string(), vec![value.into()])),
        }
    }

    /// First value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    /// All values stored under `key`, in line order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn parse(raw: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(raw)
            .map_err(|_| GitError::CorruptObject("kvlm body is not valid UTF-8".to_string()))?;

        let mut kvlm = Kvlm::new();
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];

            // A line starting with '\n' is the blank separator; everything
            // after it is the message.
            if rest.as_bytes()[0] == b'\n' {
                kvlm.message = rest[1..].to_string();
                return Ok(kvlm);
            }

            let space = rest.find(' ').ok_or_else(|| {
                GitError::CorruptObject("kvlm line without key separator".to_string())
            })?;
            let newline = rest.find('\n').unwrap_or(rest.len());
            if newline < space {
                return Err(
                    GitError::CorruptObject("kvlm line without key separator".to_string()).into(),
                );
            }
            let key = &rest[..space];

            // The value ends at the first newline not followed by a space.
            let mut scan = space + 1;
            let end = loop {
                match rest[scan..].find('\n') {
                    None => break rest.len(),
                    Some(offset) => {
                        let nl = scan + offset;
                        if rest.as_bytes().get(nl + 1) == Some(&b' ') {
                            scan = nl + 1;
                        } else {
                            break nl;
                        }
                    }
                }
            };

            let value = rest[space + 1..end].replace("\n ", "\n");
            kvlm.push(key, value);

            if end == rest.len() {
                break;
            }
            pos += end + 1;
        }

        Ok(kvlm)
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = String::new();

        for (key, values) in &self.fields {
            for value in values {
                out.push_str(key);
                out.push(' ');
                out.push_str(&value.replace('\n', "\n "));
                out.push('\n');
            }
        }

        out.push('\n');
        out.push_str(&self.message);

        out.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &[u8] = b"tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147\n\
        parent 206941306e8a8af65b66eaaaea388a7ae24d49a0\n\
        parent 34b1b34b5bbd506c4876e74c0d5f1eebedf47b2a\n\
        author Alice <alice@example.com> 1527025023 +0200\n\
        committer Alice <alice@example.com> 1527025044 +0200\n\
        \n\
        Merge branch 'topic'\n";

    #[test]
    fn parses_keys_in_order_with_repeats_collapsed() {
        let kvlm = Kvlm::parse(SAMPLE).unwrap();

        let keys: Vec<&str> = kvlm.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["tree", "parent", "author", "committer"]);
        assert_eq!(
            kvlm.get_all("parent"),
            &[
                "206941306e8a8af65b66eaaaea388a7ae24d49a0".to_string(),
                "34b1b34b5bbd506c4876e74c0d5f1eebedf47b2a".to_string(),
            ]
        );
        assert_eq!(kvlm.message(), "Merge branch 'topic'\n");
    }

    #[test]
    fn serialize_round_trips() {
        let kvlm = Kvlm::parse(SAMPLE).unwrap();
        assert_eq!(kvlm.serialize(), SAMPLE.to_vec());
    }

    #[test]
    fn continuation_lines_are_stripped_and_restored() {
        let raw = b"object 29ff16c9c14e2652b22f8b78bb08a5a07930c147\n\
            gpgsig -----BEGIN PGP SIGNATURE-----\n \n abcdef\n -----END PGP SIGNATURE-----\n\
            \n\
            signed\n";
        let kvlm = Kvlm::parse(raw).unwrap();

        assert_eq!(
            kvlm.get("gpgsig").unwrap(),
            "-----BEGIN PGP SIGNATURE-----\n\nabcdef\n-----END PGP SIGNATURE-----"
        );
        assert_eq!(kvlm.serialize(), raw.to_vec());
    }

    #[test]
    fn message_only_body() {
        let kvlm = Kvlm::parse(b"\njust a message").unwrap();
        assert_eq!(kvlm.fields().count(), 0);
        assert_eq!(kvlm.message(), "just a message");
    }

    #[test]
    fn many_continuation_lines_do_not_recurse() {
        let mut raw = b"note start".to_vec();
        for _ in 0..10_000 {
            raw.extend_from_slice(b"\n more");
        }
        raw.extend_from_slice(b"\n\ndone");

        let kvlm = Kvlm::parse(&raw).unwrap();
        assert_eq!(kvlm.message(), "done");
        assert!(kvlm.get("note").unwrap().lines().count() > 9_000);
    }
}
