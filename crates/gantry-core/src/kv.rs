//! Insertion-ordered key/value pairs for env vars, secrets, labels and
//! traffic splits.

use crate::error::Error;

/// An insertion-ordered string-to-string mapping.
///
/// Cloud Run flags receive key/value state as a single `k1=v1,k2=v2` blob
/// whose order is user-visible, so entries keep the order they were first
/// inserted in. Collections stay small (tens of pairs), so lookups scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueMap {
    entries: Vec<(String, String)>,
}

impl KeyValueMap {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse a raw `KEY=value` blob separated by commas and/or newlines.
    ///
    /// Values may be double-quoted to protect embedded commas; the quotes
    /// are stripped from the stored value. A pair without `=` is rejected.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let mut map = Self::new();
        for line in input.lines() {
            for pair in split_unquoted_commas(line) {
                let pair = pair.trim();
                if pair.is_empty() {
                    continue;
                }
                let (key, value) = pair.split_once('=').ok_or_else(|| {
                    Error::Configuration(format!(
                        "invalid key/value pair '{pair}', expected KEY=value"
                    ))
                })?;
                map.insert(key.trim(), unquote(value.trim()));
            }
        }
        Ok(map)
    }

    /// Insert a pair, replacing the value in place when the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge `overlay` into `self`; overlay entries win on key collision.
    ///
    /// This is the single merge function shared by env vars, secrets and
    /// labels, so explicit-overrides-default behaves the same everywhere.
    pub fn merge(&mut self, overlay: &KeyValueMap) {
        for (key, value) in overlay.iter() {
            self.insert(key, value);
        }
    }

    /// Serialize as `k1=v1,k2=v2` in insertion order.
    ///
    /// The single serialization function shared by every flag that takes a
    /// key/value blob.
    pub fn join(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Split on commas that are not inside a double-quoted substring.
fn split_unquoted_commas(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&line[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&line[start..]);
    parts
}

/// Strip one pair of surrounding double quotes, if present.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_empty_map() {
        assert_eq!(KeyValueMap::new().join(), "");
    }

    #[test]
    fn join_single_pair() {
        let map: KeyValueMap = [("FOO", "bar")].into_iter().collect();
        assert_eq!(map.join(), "FOO=bar");
    }

    #[test]
    fn join_preserves_insertion_order() {
        let map: KeyValueMap = [("FOO", "bar"), ("ZIP", "zap")].into_iter().collect();
        assert_eq!(map.join(), "FOO=bar,ZIP=zap");
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map: KeyValueMap = [("FOO", "bar"), ("ZIP", "zap")].into_iter().collect();
        map.insert("FOO", "baz");
        assert_eq!(map.join(), "FOO=baz,ZIP=zap");
    }

    #[test]
    fn merge_overlay_wins() {
        let mut base: KeyValueMap = [("managed-by", "github-actions"), ("commit-sha", "abc")]
            .into_iter()
            .collect();
        let overlay: KeyValueMap = [("managed-by", "me")].into_iter().collect();
        base.merge(&overlay);
        assert_eq!(base.get("managed-by"), Some("me"));
        assert_eq!(base.get("commit-sha"), Some("abc"));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn parse_comma_separated() {
        let map = KeyValueMap::parse("FOO=bar,ZIP=zap").unwrap();
        assert_eq!(map.join(), "FOO=bar,ZIP=zap");
    }

    #[test]
    fn parse_newline_separated() {
        let map = KeyValueMap::parse("FOO=bar\nZIP=zap\n").unwrap();
        assert_eq!(map.join(), "FOO=bar,ZIP=zap");
    }

    #[test]
    fn parse_mixed_separators_and_blanks() {
        let map = KeyValueMap::parse("FOO=bar, ZIP=zap\n\n BAZ=qux ,").unwrap();
        assert_eq!(map.join(), "FOO=bar,ZIP=zap,BAZ=qux");
    }

    #[test]
    fn parse_quoted_value_keeps_commas() {
        let map = KeyValueMap::parse("LIST=\"a,b,c\",OTHER=x").unwrap();
        assert_eq!(map.get("LIST"), Some("a,b,c"));
        assert_eq!(map.get("OTHER"), Some("x"));
    }

    #[test]
    fn parse_value_with_equals_sign() {
        let map = KeyValueMap::parse("QUERY=a=b").unwrap();
        assert_eq!(map.get("QUERY"), Some("a=b"));
    }

    #[test]
    fn parse_rejects_pair_without_equals() {
        let err = KeyValueMap::parse("FOO").unwrap_err();
        assert!(err.to_string().contains("FOO"));
    }
}
