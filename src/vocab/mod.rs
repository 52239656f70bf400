//! # Vocabulary Lookup
//!
//! Answers "is this word in the vocabulary, and if not, what are the
//! nearest candidates?" behind a small facade that owns two indexes over
//! the same word set:
//!
//! - a [`Trie`] for exact membership tests, and
//! - a [`BkTree`] over Levenshtein distance for nearby candidates.
//!
//! Construction fully consumes its input; afterwards the facade is
//! read-only and safe to share across threads.

pub mod bktree;
pub mod distance;
pub mod trie;

pub use bktree::BkTree;
pub use distance::{levenshtein, Levenshtein, Metric};
pub use trie::{Trie, TrieStatistics};

use eyre::{Result, WrapErr};
use std::io::BufRead;

/// Default edit distance for suggestion queries.
pub const DEFAULT_MAX_DISTANCE: usize = 2;

const MAX_SUGGESTIONS: usize = 5;

/// A static vocabulary with exact and approximate lookup.
#[derive(Debug, Default)]
pub struct Vocabulary {
    trie: Trie,
    bk_tree: BkTree,
}

impl Vocabulary {
    /// Builds the vocabulary from a reader with one word per line.
    /// Lines are trimmed and lower-cased; blank lines are skipped. The
    /// reader is fully consumed, and read failures surface after
    /// whatever was read so far has been released.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut vocabulary = Vocabulary::default();
        for line in reader.lines() {
            let line = line.wrap_err("failed to read vocabulary input")?;
            let word = line.trim().to_lowercase();
            if !word.is_empty() {
                vocabulary.insert(&word);
            }
        }
        Ok(vocabulary)
    }

    /// Builds the vocabulary from an in-memory word sequence.
    pub fn from_words<I>(words: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut vocabulary = Vocabulary::default();
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() {
                vocabulary.insert(&word);
            }
        }
        vocabulary
    }

    fn insert(&mut self, word: &str) {
        self.trie.insert(word);
        self.bk_tree.insert(word);
    }

    /// Exact membership test, case-folded.
    pub fn contains(&self, word: &str) -> bool {
        self.trie.contains(&word.to_lowercase())
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    pub fn statistics(&self) -> TrieStatistics {
        self.trie.statistics()
    }

    /// Nearest vocabulary words within `max_distance` of the query, at
    /// most five, ordered by length ascending (stable over the BK-tree's
    /// distance order).
    pub fn suggestions(&self, word: &str, max_distance: usize) -> Vec<String> {
        let mut matches = self.bk_tree.search(&word.to_lowercase(), max_distance);
        matches.sort_by_key(|m| m.chars().count());
        matches.truncate(MAX_SUGGESTIONS);
        matches
    }

    /// Verifies every word of a free-text input and renders the
    /// per-word report the verification endpoint returns:
    ///
    /// ```text
    /// ✓ hello
    /// ✘ wrld; world
    /// ```
    ///
    /// Words are whitespace-separated, stripped to ASCII letters,
    /// de-duplicated in first-seen order. Suggestions use the default
    /// distance of 2. The report carries no trailing newline; input with
    /// no usable words yields an empty string.
    pub fn verify_report(&self, input: &str) -> String {
        let mut seen: Vec<String> = Vec::new();
        for raw in input.split_whitespace() {
            let word: String = raw.chars().filter(char::is_ascii_alphabetic).collect();
            if word.is_empty() || seen.iter().any(|w| w == &word) {
                continue;
            }
            seen.push(word);
        }

        let mut lines = Vec::with_capacity(seen.len());
        for word in &seen {
            if self.contains(word) {
                lines.push(format!("✓ {word}"));
            } else {
                let matches = self.suggestions(word, DEFAULT_MAX_DISTANCE);
                lines.push(format!("✘ {word}; {}", matches.join(", ")));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Vocabulary {
        Vocabulary::from_words(["hello", "help", "hell", "world", "yellow"])
    }

    #[test]
    fn from_reader_trims_folds_and_skips_blanks() {
        let input = Cursor::new("Hello\n\n  WORLD  \nhelp\n");
        let vocabulary = Vocabulary::from_reader(input).unwrap();
        assert_eq!(vocabulary.len(), 3);
        assert!(vocabulary.contains("hello"));
        assert!(vocabulary.contains("World"));
        assert!(vocabulary.contains("HELP"));
    }

    #[test]
    fn contains_is_case_insensitive() {
        let vocabulary = sample();
        assert!(vocabulary.contains("HELLO"));
        assert!(vocabulary.contains("Hello"));
        assert!(!vocabulary.contains("missing"));
    }

    #[test]
    fn suggestions_are_ordered_by_length() {
        let vocabulary = sample();
        let suggestions = vocabulary.suggestions("hell", 1);
        assert_eq!(suggestions, vec!["help".to_string(), "hello".to_string()]);
    }

    #[test]
    fn suggestions_cap_at_five() {
        let vocabulary =
            Vocabulary::from_words(["cat", "bat", "hat", "mat", "rat", "sat", "vat"]);
        assert_eq!(vocabulary.suggestions("fat", 1).len(), 5);
    }

    #[test]
    fn report_marks_known_and_unknown_words() {
        let vocabulary = sample();
        let report = vocabulary.verify_report("hello wrld");
        assert_eq!(report, "✓ hello\n✘ wrld; world");
    }

    #[test]
    fn report_strips_punctuation_and_dedupes() {
        let vocabulary = sample();
        let report = vocabulary.verify_report("hello, hello! world.");
        assert_eq!(report, "✓ hello\n✓ world");
    }

    #[test]
    fn report_has_no_trailing_newline() {
        let vocabulary = sample();
        let report = vocabulary.verify_report("hello");
        assert!(!report.ends_with('\n'));
    }

    #[test]
    fn unusable_input_yields_empty_report() {
        let vocabulary = sample();
        assert_eq!(vocabulary.verify_report("123 ... 456"), "");
        assert_eq!(vocabulary.verify_report(""), "");
    }

    #[test]
    fn unknown_word_with_no_candidates_lists_none() {
        let vocabulary = sample();
        let report = vocabulary.verify_report("qqqqqqq");
        assert_eq!(report, "✘ qqqqqqq; ");
    }
}
