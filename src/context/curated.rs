use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rust_embed::Embed;
use serde::Deserialize;

use crate::engine::word::Word;

#[derive(Embed)]
#[folder = "assets/curated/"]
struct CuratedAssets;

const BUNDLED_FILE: &str = "default.toml";

/// Author-provided cue for a word. Used verbatim.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CuratedCue {
    pub display: String,
    #[serde(default)]
    pub speak: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CuratedFile {
    #[serde(default)]
    words: HashMap<String, CuratedCue>,
}

#[derive(Clone, Debug, Default)]
pub struct CuratedContexts {
    entries: HashMap<Word, CuratedCue>,
}

impl CuratedContexts {
    /// Bundled cues, overlaid by `<config_dir>/spelldrill/curated.toml`.
    pub fn load() -> Self {
        let mut curated = Self::bundled();
        if let Some(config_dir) = dirs::config_dir() {
            let user_path = config_dir.join("spelldrill").join("curated.toml");
            curated.merge_file(&user_path);
        }
        log::debug!("{} curated cues available", curated.len());
        curated
    }

    pub fn bundled() -> Self {
        let mut curated = Self::default();
        if let Some(file) = CuratedAssets::get(BUNDLED_FILE) {
            match std::str::from_utf8(file.data.as_ref()) {
                Ok(content) => curated.merge_str(content),
                Err(e) => log::warn!("bundled curated cues are not utf-8: {e}"),
            }
        }
        curated
    }

    pub fn merge_file(&mut self, path: &Path) {
        if let Ok(content) = fs::read_to_string(path) {
            self.merge_str(&content);
        }
    }

    /// Later entries win over earlier ones for the same word.
    pub fn merge_str(&mut self, content: &str) {
        match toml::from_str::<CuratedFile>(content) {
            Ok(file) => {
                for (raw, cue) in file.words {
                    if let Some(word) = Word::parse(&raw) {
                        self.entries.insert(word, cue);
                    }
                }
            }
            Err(e) => log::warn!("skipping unreadable curated cues: {e}"),
        }
    }

    pub fn insert(&mut self, word: Word, cue: CuratedCue) {
        self.entries.insert(word, cue);
    }

    pub fn get(&self, word: &Word) -> Option<&CuratedCue> {
        self.entries.get(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_cues_parse() {
        let curated = CuratedContexts::bundled();
        assert!(!curated.is_empty());
        let cue = curated.get(&Word::parse("necessary").unwrap()).unwrap();
        assert!(cue.display.contains("____"));
    }

    #[test]
    fn test_user_entries_override_bundled() {
        let mut curated = CuratedContexts::bundled();
        curated.merge_str(
            r#"
[words.Necessary]
display = "Water is ____."
"#,
        );
        let cue = curated.get(&Word::parse("necessary").unwrap()).unwrap();
        assert_eq!(cue.display, "Water is ____.");
        assert!(cue.speak.is_none());
    }

    #[test]
    fn test_broken_file_is_ignored() {
        let mut curated = CuratedContexts::default();
        curated.merge_str("[words.cat\ndisplay = ");
        assert!(curated.is_empty());
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut curated = CuratedContexts::default();
        curated.merge_file(&dir.path().join("nope.toml"));
        assert!(curated.is_empty());
    }
}
