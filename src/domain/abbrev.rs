//! Abbreviation expansion
//!
//! A mapping from short token to expansion string, loaded from the server
//! at startup and mutated through it. On a space keystroke in the
//! transcript field, the token directly before the cursor is looked up;
//! on a hit it is replaced in place and the cursor lands right after the
//! expansion plus one trailing space. An expansion is never re-expanded.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Wire tuple for one abbreviation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abbrev {
    pub abbrev: String,
    pub expansion: String,
}

/// Result of an in-place expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expanded {
    pub text: String,
    /// Byte position directly after the expansion and its trailing space
    pub cursor: usize,
}

/// Token to expansion mapping
#[derive(Debug, Clone, Default)]
pub struct AbbrevMap {
    map: HashMap<String, String>,
}

impl AbbrevMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = Abbrev>) -> Self {
        Self {
            map: entries
                .into_iter()
                .map(|a| (a.abbrev, a.expansion))
                .collect(),
        }
    }

    pub fn insert(&mut self, abbrev: impl Into<String>, expansion: impl Into<String>) {
        self.map.insert(abbrev.into(), expansion.into());
    }

    pub fn remove(&mut self, abbrev: &str) -> bool {
        self.map.remove(abbrev).is_some()
    }

    pub fn get(&self, abbrev: &str) -> Option<&str> {
        self.map.get(abbrev).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries sorted by abbreviation, for display
    pub fn entries(&self) -> Vec<Abbrev> {
        let mut entries: Vec<Abbrev> = self
            .map
            .iter()
            .map(|(k, v)| Abbrev {
                abbrev: k.clone(),
                expansion: v.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.abbrev.cmp(&b.abbrev));
        entries
    }

    /// Expand the token before `cursor`, which must sit directly after a
    /// just-typed space. Returns `None` when there is nothing to expand.
    pub fn expand(&self, text: &str, cursor: usize) -> Option<Expanded> {
        if cursor == 0 || cursor > text.len() || !text.is_char_boundary(cursor) {
            return None;
        }
        if !text[..cursor].ends_with(' ') {
            return None;
        }

        let before_space = &text[..cursor - 1];
        let token_start = before_space.rfind(' ').map(|i| i + 1).unwrap_or(0);
        let token = &before_space[token_start..];
        if token.is_empty() {
            return None;
        }
        let expansion = self.map.get(token)?;

        let mut out = String::with_capacity(text.len() + expansion.len());
        out.push_str(&text[..token_start]);
        out.push_str(expansion);
        out.push(' ');
        let cursor_after = out.len();
        out.push_str(&text[cursor..]);
        Some(Expanded {
            text: out,
            cursor: cursor_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> AbbrevMap {
        AbbrevMap::from_entries([
            Abbrev {
                abbrev: "tst".to_string(),
                expansion: "test".to_string(),
            },
            Abbrev {
                abbrev: "tstg".to_string(),
                expansion: "testing".to_string(),
            },
        ])
    }

    #[test]
    fn expands_token_before_cursor() {
        let expanded = map().expand("tst ", 4).unwrap();
        assert_eq!(expanded.text, "test ");
        assert_eq!(expanded.cursor, 5);
    }

    #[test]
    fn expands_mid_text_and_keeps_tail() {
        let text = "say tst now";
        // Cursor sits right after the space following "tst"
        let expanded = map().expand(text, 8).unwrap();
        assert_eq!(expanded.text, "say test now");
        assert_eq!(expanded.cursor, "say test ".len());
    }

    #[test]
    fn longest_matching_token_wins_by_exact_lookup() {
        let expanded = map().expand("tstg ", 5).unwrap();
        assert_eq!(expanded.text, "testing ");
    }

    #[test]
    fn unknown_token_is_left_alone() {
        assert!(map().expand("hello ", 6).is_none());
    }

    #[test]
    fn cursor_not_after_space_is_ignored() {
        assert!(map().expand("tst", 3).is_none());
        assert!(map().expand("tst x", 5).is_none());
    }

    #[test]
    fn expansion_output_is_not_re_expanded() {
        let mut m = AbbrevMap::new();
        m.insert("a", "a b");
        let expanded = m.expand("a ", 2).unwrap();
        assert_eq!(expanded.text, "a b ");
        // A second pass over the produced cursor finds "b", not "a"
        assert!(m.expand(&expanded.text, expanded.cursor).is_none());
    }

    #[test]
    fn double_space_is_ignored() {
        assert!(map().expand("tst  ", 5).is_none());
    }

    #[test]
    fn out_of_range_cursor_is_ignored() {
        assert!(map().expand("tst ", 9).is_none());
        assert!(map().expand("tst ", 0).is_none());
    }

    #[test]
    fn entries_are_sorted() {
        let entries = map().entries();
        assert_eq!(entries[0].abbrev, "tst");
        assert_eq!(entries[1].abbrev, "tstg");
    }

    #[test]
    fn insert_and_remove() {
        let mut m = map();
        m.insert("brb", "be right back");
        assert_eq!(m.get("brb"), Some("be right back"));
        assert!(m.remove("brb"));
        assert!(!m.remove("brb"));
        assert!(m.get("brb").is_none());
    }
}
