//! Short, typeable aliases for conversation ids.
//!
//! A full alias is `:` followed by the hex of the id with the two shard bytes
//! moved to the end. Shortened aliases are prefixes of the full alias, cut at
//! whole bytes, long enough to keep every id in a listing distinct.

use regex::Regex;
use std::collections::HashSet;

use super::types::ConversationId;
use crate::error::{Error, Result};

/// Leading hex characters holding the shard bits.
const SHARD_HEX_LEN: usize = 4;

pub const ALIAS_MARKER: char = ':';

/// Full alias for an id: shard bytes rotated to the end, `:` in front.
pub fn full_alias(id: &ConversationId) -> String {
    let hex = hex::encode(id.as_bytes());
    let (shard, rest) = hex.split_at(SHARD_HEX_LEN.min(hex.len()));
    format!("{}{}{}", ALIAS_MARKER, rest, shard)
}

/// Validate user input as an alias and return it lowercased.
pub fn parse_alias(input: &str) -> Result<String> {
    let re = Regex::new(r"^:(?:[0-9a-fA-F]{2})+$")
        .map_err(|e| Error::InvalidRequest(format!("alias pattern: {}", e)))?;
    let input = input.trim();
    if !re.is_match(input) {
        return Err(Error::InvalidRequest(format!(
            "'{}' is not a conversation alias (expected ':' followed by hex bytes)",
            input
        )));
    }
    Ok(input.to_lowercase())
}

fn truncate(alias: &str, width: usize) -> &str {
    &alias[..(1 + 2 * width).min(alias.len())]
}

fn all_distinct(aliases: &[String], width: usize) -> bool {
    let mut seen = HashSet::with_capacity(aliases.len());
    aliases.iter().all(|a| seen.insert(truncate(a, width)))
}

/// Shortest-prefix aliases over a fixed snapshot of conversation ids.
///
/// The width is computed once at construction. Build a new shortener when the
/// set of ids changes.
#[derive(Debug, Clone)]
pub struct AliasShortener {
    aliases: Vec<String>,
    width: usize,
}

impl AliasShortener {
    /// Compute the alias width for `ids`, starting from `min_bytes`.
    ///
    /// # Panics
    ///
    /// Panics if two ids are byte-for-byte identical. Use [`AliasShortener::try_new`]
    /// when the ids come from untrusted input.
    pub fn new(ids: &[ConversationId], min_bytes: usize) -> Self {
        match Self::try_new(ids, min_bytes) {
            Ok(shortener) => shortener,
            Err(e) => panic!("alias shortener precondition violated: {}", e),
        }
    }

    /// Like [`AliasShortener::new`], but reports duplicate ids as an error.
    ///
    /// A floor of zero is raised to one byte so every alias carries hex.
    pub fn try_new(ids: &[ConversationId], min_bytes: usize) -> Result<Self> {
        let min_bytes = min_bytes.max(1);
        let aliases: Vec<String> = ids.iter().map(full_alias).collect();
        let max_width = ids.iter().map(|id| id.len()).max().unwrap_or(min_bytes);

        let mut width = min_bytes.min(max_width).max(1);
        while !all_distinct(&aliases, width) {
            if width >= max_width {
                let mut seen = HashSet::new();
                let dup = ids
                    .iter()
                    .find(|id| !seen.insert(id.as_bytes().to_vec()))
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                return Err(Error::DuplicateConversationId(dup));
            }
            width += 1;
        }

        Ok(Self { aliases, width })
    }

    /// Length of every shortened alias: the marker plus `width` bytes of hex.
    pub fn shortened_length(&self) -> usize {
        1 + 2 * self.width
    }

    /// Width in bytes.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Shortened alias for the id at `index`.
    pub fn shorten(&self, index: usize) -> &str {
        truncate(&self.aliases[index], self.width)
    }

    pub fn full(&self, index: usize) -> &str {
        &self.aliases[index]
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Index of the single id whose full alias starts with `alias`.
    ///
    /// Returns `None` when the input is malformed, or when it matches no id or
    /// more than one.
    pub fn find(&self, alias: &str) -> Option<usize> {
        let alias = parse_alias(alias).ok()?;
        let mut matches = self
            .aliases
            .iter()
            .enumerate()
            .filter(|(_, full)| full.starts_with(&alias))
            .map(|(i, _)| i);
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ConversationId {
        s.parse().unwrap()
    }

    #[test]
    fn test_full_alias_rotates_shard_bytes() {
        assert_eq!(full_alias(&id("0000010000000000000a")), ":010000000000000a0000");
        assert_eq!(full_alias(&id("abcd")), ":abcd");
        assert_eq!(full_alias(&id("ab")), ":ab");
    }

    #[test]
    fn test_shorten_at_floor() {
        let ids = vec![id("00000100000000000000"), id("00000200000000000000")];
        let s = AliasShortener::new(&ids, 2);
        assert_eq!(s.shorten(0), ":0100");
        assert_eq!(s.shorten(1), ":0200");
        assert_eq!(s.shortened_length(), 5);
    }

    #[test]
    fn test_width_grows_to_first_differing_byte() {
        let ids = vec![id("00000000100000000000"), id("00000000200000000000")];
        let s = AliasShortener::new(&ids, 2);
        assert_eq!(s.shortened_length(), 7);
        assert_eq!(s.shorten(0), ":000010");
        assert_eq!(s.shorten(1), ":000020");
    }

    #[test]
    fn test_width_is_smallest_distinguishing() {
        let ids = vec![
            id("0000aa00000000000000"),
            id("0000ab00000000000000"),
            id("0000ab01000000000000"),
        ];
        let s = AliasShortener::new(&ids, 1);
        assert_eq!(s.width(), 2);
        for w in 1..s.width() {
            assert!(!all_distinct(&ids.iter().map(full_alias).collect::<Vec<_>>(), w));
        }
    }

    #[test]
    fn test_single_and_empty_sets_keep_floor() {
        let s = AliasShortener::new(&[id("00000100000000000000")], 2);
        assert_eq!(s.shortened_length(), 5);
        assert_eq!(s.shorten(0), ":0100");

        let empty = AliasShortener::new(&[], 3);
        assert!(empty.is_empty());
        assert_eq!(empty.shortened_length(), 7);
    }

    #[test]
    fn test_floor_clamped_to_id_length() {
        let ids = vec![id("00000100"), id("00000200")];
        let s = AliasShortener::new(&ids, 10);
        assert_eq!(s.width(), 4);
        assert_eq!(s.shorten(0), ":01000000");
    }

    #[test]
    fn test_zero_floor_raised_to_one_byte() {
        let s = AliasShortener::new(&[id("00000100000000000000")], 0);
        assert_eq!(s.width(), 1);
        assert_eq!(s.shorten(0), ":01");
        assert_eq!(s.find(s.shorten(0)), Some(0));

        assert_eq!(AliasShortener::new(&[], 0).shortened_length(), 3);
    }

    #[test]
    #[should_panic(expected = "precondition")]
    fn test_duplicate_ids_fail_fast() {
        let ids = vec![id("00000100000000000000"), id("00000100000000000000")];
        let s = AliasShortener::new(&ids, 2);
        let _ = s.shorten(0);
    }

    #[test]
    fn test_duplicate_ids_typed_error() {
        let ids = vec![
            id("00000300000000000000"),
            id("00000100000000000000"),
            id("00000100000000000000"),
        ];
        let err = AliasShortener::try_new(&ids, 10).unwrap_err();
        match err {
            Error::DuplicateConversationId(dup) => assert_eq!(dup, "00000100000000000000"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_find_accepts_short_and_long_aliases() {
        let ids = vec![id("00000100000000000000"), id("00000200000000000000")];
        let s = AliasShortener::new(&ids, 2);

        assert_eq!(s.find(":0100"), Some(0));
        assert_eq!(s.find(":0200"), Some(1));
        assert_eq!(s.find(":02000000"), Some(1));
        assert_eq!(s.find(":0200000000000000000000"), None);
        assert_eq!(s.find(":03"), None);
        // marker only
        assert_eq!(s.find(":"), None);
        assert_eq!(s.find("0100"), None);
    }

    #[test]
    fn test_parse_alias() {
        assert_eq!(parse_alias(" :0A1b ").unwrap(), ":0a1b");
        assert!(parse_alias(":0a1").is_err());
        assert!(parse_alias(":xyz0").is_err());
        assert!(parse_alias("abcd").is_err());
    }
}
