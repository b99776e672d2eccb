//! Property tests for word handling.

use define_core::word::{MAX_WORD_LEN, pick_word};
use define_core::{lemmas, valid_word};
use proptest::prelude::*;

proptest! {
    #[test]
    fn lemmas_start_with_lowercased_word(word in "[A-Za-z]{1,20}") {
        let candidates = lemmas(&word);
        prop_assert_eq!(&candidates[0], &word.to_lowercase());
    }

    #[test]
    fn lemmas_have_no_duplicates(word in "[a-z]{1,20}") {
        let candidates = lemmas(&word);
        for (i, c) in candidates.iter().enumerate() {
            prop_assert!(!candidates[i + 1..].contains(c));
        }
    }

    #[test]
    fn lemmas_never_strip_double_s(stem in "[a-z]{2,12}") {
        let word = format!("{stem}ss");
        prop_assert_eq!(lemmas(&word), vec![word.clone()]);
    }

    #[test]
    fn lemmas_are_shorter_than_word(word in "[a-z]{1,20}") {
        for candidate in lemmas(&word).iter().skip(1) {
            prop_assert!(candidate.len() < word.len());
            prop_assert!(!candidate.is_empty());
        }
    }

    #[test]
    fn valid_words_respect_length_bound(word in "[a-z'-]{1,100}") {
        prop_assert_eq!(valid_word(&word), word.chars().count() <= MAX_WORD_LEN);
    }

    #[test]
    fn picked_word_has_no_whitespace(raw in ".{0,80}") {
        let picked = pick_word(&raw);
        prop_assert!(!picked.chars().any(char::is_whitespace));
    }
}
