//! # Integration Tests for Vocabulary Lookup
//!
//! Facade-level tests for the trie + BK-tree vocabulary: construction
//! from a reader, exact membership, approximate suggestions, and the
//! plain-text verification report consumed by the HTTP front-end.
//!
//! ## Running Tests
//!
//! ```sh
//! cargo test --test vocabulary
//! ```

use relq::Vocabulary;
use std::io::Cursor;

fn sample() -> Vocabulary {
    Vocabulary::from_reader(Cursor::new("hello\nhelp\nhell\nworld\nyellow\n")).unwrap()
}

mod construction {
    use super::*;

    #[test]
    fn reader_is_fully_consumed_and_folded() {
        let vocabulary =
            Vocabulary::from_reader(Cursor::new("  Alpha \n\nBETA\nbeta\ngamma")).unwrap();
        assert_eq!(vocabulary.len(), 3);
        assert!(vocabulary.contains("alpha"));
        assert!(vocabulary.contains("Beta"));
        assert!(vocabulary.contains("GAMMA"));
    }

    #[test]
    fn statistics_reflect_the_loaded_words() {
        let vocabulary = sample();
        let stats = vocabulary.statistics();
        assert_eq!(stats.word_count, 5);
        assert_eq!(stats.total_characters, 5 + 4 + 4 + 5 + 6);
        assert_eq!(stats.max_word_length, 6);
    }

    #[test]
    fn empty_input_builds_an_empty_vocabulary() {
        let vocabulary = Vocabulary::from_reader(Cursor::new("")).unwrap();
        assert!(vocabulary.is_empty());
        assert!(vocabulary.suggestions("anything", 2).is_empty());
    }
}

mod lookup {
    use super::*;

    #[test]
    fn membership_consults_the_trie() {
        let vocabulary = sample();
        assert!(vocabulary.contains("hello"));
        assert!(vocabulary.contains("WORLD"));
        assert!(!vocabulary.contains("hel"));
        assert!(!vocabulary.contains("helloo"));
    }

    #[test]
    fn near_misses_return_neighbors_within_distance() {
        let vocabulary = sample();
        let suggestions = vocabulary.suggestions("hell", 1);
        assert_eq!(suggestions, vec!["help".to_string(), "hello".to_string()]);
    }

    #[test]
    fn inserted_pairs_within_distance_are_mutually_findable() {
        let vocabulary = sample();
        // levenshtein(hello, help) = 2: searching either at distance 2
        // must return the other.
        assert!(vocabulary
            .suggestions("hello", 2)
            .contains(&"help".to_string()));
        assert!(vocabulary
            .suggestions("help", 2)
            .contains(&"hello".to_string()));
    }

    #[test]
    fn exact_word_is_never_its_own_suggestion() {
        let vocabulary = sample();
        assert!(!vocabulary
            .suggestions("hello", 2)
            .contains(&"hello".to_string()));
    }
}

mod reports {
    use super::*;

    #[test]
    fn mixed_input_produces_one_line_per_distinct_word() {
        let vocabulary = sample();
        let report = vocabulary.verify_report("hello wrld hello");
        assert_eq!(report, "✓ hello\n✘ wrld; world");
    }

    #[test]
    fn punctuation_is_stripped_before_lookup() {
        let vocabulary = sample();
        assert_eq!(vocabulary.verify_report("hello, world!"), "✓ hello\n✓ world");
    }

    #[test]
    fn report_suggestions_are_length_ordered_and_capped() {
        let vocabulary = Vocabulary::from_reader(Cursor::new(
            "cat\nbat\nhat\nmat\nrat\nsat\nvat\n",
        ))
        .unwrap();
        let report = vocabulary.verify_report("fat");
        let (marker, rest) = report.split_once(' ').unwrap();
        assert_eq!(marker, "✘");
        let (_, suggestions) = rest.split_once("; ").unwrap();
        assert_eq!(suggestions.split(", ").count(), 5);
    }

    #[test]
    fn numeric_only_input_yields_empty_report() {
        let vocabulary = sample();
        assert_eq!(vocabulary.verify_report("42 7 99"), "");
    }
}
