use std::fmt;

use icu_normalizer::ComposingNormalizerBorrowed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("word is empty after normalization")]
pub struct EmptyWord;

/// A drill target: NFC-composed, trimmed, lower-cased, never empty.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Word(String);

impl Word {
    pub fn parse(raw: &str) -> Option<Self> {
        let nfc = ComposingNormalizerBorrowed::new_nfc().normalize(raw.trim());
        let lowered = nfc.to_lowercase();
        if lowered.is_empty() {
            None
        } else {
            Some(Self(lowered))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Word {
    type Error = EmptyWord;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Word::parse(&raw).ok_or(EmptyWord)
    }
}

impl From<Word> for String {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Split free-form input on newlines and commas into normalized words.
/// Order and duplicates are preserved.
pub fn parse_word_input(text: &str) -> Vec<Word> {
    text.split(['\n', ','])
        .filter_map(Word::parse)
        .collect()
}

pub fn normalize_all<S: AsRef<str>>(raw: &[S]) -> Vec<Word> {
    raw.iter().filter_map(|s| Word::parse(s.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_lowercases() {
        let w = Word::parse("  Necessary \t").unwrap();
        assert_eq!(w.as_str(), "necessary");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!(Word::parse("").is_none());
        assert!(Word::parse("   \n").is_none());
    }

    #[test]
    fn test_parse_composes_decomposed_accents() {
        // "cafe" + combining acute accent
        let decomposed = Word::parse("cafe\u{0301}").unwrap();
        let composed = Word::parse("café").unwrap();
        assert_eq!(decomposed, composed);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let w = Word::parse("rhythm").unwrap();
        assert_eq!(Word::parse("RHYTHM "), Some(w.clone()));
        assert_ne!(Word::parse("rythm"), Some(w));
        assert_eq!(Word::parse("  "), None);
    }

    #[test]
    fn test_parse_word_input_splits_on_commas_and_newlines() {
        let words = parse_word_input("Cat, dog\n\n  bird ,,cat");
        let strs: Vec<&str> = words.iter().map(Word::as_str).collect();
        assert_eq!(strs, vec!["cat", "dog", "bird", "cat"]);
    }

    #[test]
    fn test_serializes_as_bare_string() {
        let w = Word::parse("Ghost").unwrap();
        assert_eq!(serde_json::to_string(&w).unwrap(), "\"ghost\"");
    }

    #[test]
    fn test_deserialize_normalizes_and_rejects_empty() {
        let w: Word = serde_json::from_str("\" Ghost \"").unwrap();
        assert_eq!(w.as_str(), "ghost");
        assert!(serde_json::from_str::<Word>("\"  \"").is_err());
    }
}
