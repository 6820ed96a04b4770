use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::context::cache::{DiskCache, encode_path_segment, fetch_url};
use crate::engine::word::Word;

pub const DEFAULT_API_BASE: &str = "https://api.dictionaryapi.dev/api/v2/entries/en/";

#[derive(Clone, Debug, Deserialize)]
pub struct DictionaryEntry {
    pub meanings: Vec<Meaning>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Meaning {
    pub definitions: Vec<Definition>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Definition {
    pub definition: String,
    #[serde(default)]
    pub example: Option<String>,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no dictionary entry")]
    NotFound,
    #[error("dictionary returned status {0}")]
    Status(u16),
    #[error("dictionary request failed: {0}")]
    Transport(String),
    #[error("malformed dictionary payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("dictionary lookups are disabled")]
    Disabled,
}

/// External definition/example source keyed by a single word.
pub trait DefinitionSource: Send + Sync {
    fn lookup(&self, word: &Word) -> Result<Vec<DictionaryEntry>, LookupError>;
}

pub fn parse_entries(body: &str) -> Result<Vec<DictionaryEntry>, LookupError> {
    let entries: Vec<DictionaryEntry> = serde_json::from_str(body)?;
    if entries.is_empty() {
        return Err(LookupError::NotFound);
    }
    Ok(entries)
}

/// Free dictionary API over blocking HTTP, with successful payloads cached
/// on disk per word.
pub struct HttpDictionary {
    base_url: String,
    timeout: Duration,
    cache: Option<DiskCache>,
}

impl HttpDictionary {
    pub fn new(base_url: &str, timeout: Duration, cache: Option<DiskCache>) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            timeout,
            cache,
        }
    }

    fn url_for(&self, word: &Word) -> String {
        format!("{}{}", self.base_url, encode_path_segment(word.as_str()))
    }
}

impl DefinitionSource for HttpDictionary {
    fn lookup(&self, word: &Word) -> Result<Vec<DictionaryEntry>, LookupError> {
        if let Some(body) = self.cache.as_ref().and_then(|c| c.get(word.as_str())) {
            match parse_entries(&body) {
                Ok(entries) => return Ok(entries),
                Err(e) => log::debug!("ignoring cached payload for {word}: {e}"),
            }
        }

        let body = fetch_url(&self.url_for(word), self.timeout)?;
        let entries = parse_entries(&body)?;
        if let Some(cache) = &self.cache {
            if !cache.put(word.as_str(), &body) {
                log::debug!("could not cache lookup for {word}");
            }
        }
        Ok(entries)
    }
}

/// Source used when lookups are turned off; every word falls through to
/// the generic prompt unless it has a curated cue.
pub struct OfflineDictionary;

impl DefinitionSource for OfflineDictionary {
    fn lookup(&self, _word: &Word) -> Result<Vec<DictionaryEntry>, LookupError> {
        Err(LookupError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries_reads_payload_shape() {
        let body = r#"[{"word":"cat","phonetic":"/kat/","meanings":[
            {"partOfSpeech":"noun","definitions":[
                {"definition":"A small domesticated feline.","synonyms":[]},
                {"definition":"A person.","example":"He is a cool cat."}
            ]}
        ]}]"#;
        let entries = parse_entries(body).unwrap();
        assert_eq!(entries.len(), 1);
        let defs = &entries[0].meanings[0].definitions;
        assert_eq!(defs.len(), 2);
        assert!(defs[0].example.is_none());
        assert_eq!(defs[1].example.as_deref(), Some("He is a cool cat."));
    }

    #[test]
    fn test_not_found_payload_is_malformed() {
        let body = r#"{"title":"No Definitions Found","message":"Sorry pal"}"#;
        assert!(matches!(parse_entries(body), Err(LookupError::Malformed(_))));
    }

    #[test]
    fn test_empty_array_is_not_found() {
        assert!(matches!(parse_entries("[]"), Err(LookupError::NotFound)));
    }

    #[test]
    fn test_url_encodes_word() {
        let dict = HttpDictionary::new("https://example.test/entries/en", Duration::from_secs(1), None);
        let word = Word::parse("ice cream").unwrap();
        assert_eq!(dict.url_for(&word), "https://example.test/entries/en/ice%20cream");
        let word = Word::parse("café").unwrap();
        assert_eq!(dict.url_for(&word), "https://example.test/entries/en/caf%C3%A9");
    }

    #[test]
    fn test_cached_payload_served_without_network() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = DiskCache::with_base_dir(dir.path().to_path_buf()).unwrap();
        cache.put(
            "cat",
            r#"[{"meanings":[{"definitions":[{"definition":"A feline."}]}]}]"#,
        );
        // Unroutable base URL: only the cache can answer.
        let dict = HttpDictionary::new("http://127.0.0.1:9/", Duration::from_millis(50), Some(cache));
        let entries = dict.lookup(&Word::parse("cat").unwrap()).unwrap();
        assert_eq!(entries[0].meanings[0].definitions[0].definition, "A feline.");
    }

    #[test]
    fn test_offline_dictionary_always_fails() {
        let err = OfflineDictionary.lookup(&Word::parse("cat").unwrap()).unwrap_err();
        assert!(matches!(err, LookupError::Disabled));
    }
}
