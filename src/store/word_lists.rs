use thiserror::Error;

use crate::engine::word::{Word, parse_word_input};
use crate::store::json_store::JsonStore;
use crate::store::schema::WordListMap;

#[derive(Debug, Error)]
pub enum ListError {
    #[error("Name the list before saving it.")]
    EmptyName,
    #[error("There are no words to save.")]
    NoWords,
    #[error("No saved list named \"{0}\".")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Named word lists. Every call reads the file fresh and writes it back,
/// so a failed write leaves the previous lists intact on disk.
pub struct WordLists {
    store: JsonStore,
}

impl WordLists {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// Save `raw_text` (comma or newline separated) under `name`,
    /// replacing any list with the same name. Returns the stored words.
    pub fn save(&self, name: &str, raw_text: &str) -> Result<Vec<Word>, ListError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ListError::EmptyName);
        }
        let words = parse_word_input(raw_text);
        if words.is_empty() {
            return Err(ListError::NoWords);
        }
        let mut lists = self.store.load_word_lists()?;
        lists.insert(name.to_string(), words.clone());
        self.store.save_word_lists(&lists)?;
        log::info!("saved list {name:?} ({} words)", words.len());
        Ok(words)
    }

    pub fn load(&self, name: &str) -> Result<Vec<Word>, ListError> {
        let mut lists = self.store.load_word_lists()?;
        lists
            .remove(name.trim())
            .ok_or_else(|| ListError::NotFound(name.trim().to_string()))
    }

    pub fn delete(&self, name: &str) -> Result<(), ListError> {
        let mut lists = self.store.load_word_lists()?;
        if lists.remove(name.trim()).is_none() {
            return Err(ListError::NotFound(name.trim().to_string()));
        }
        self.store.save_word_lists(&lists)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ListError> {
        self.store.remove_word_lists()?;
        Ok(())
    }

    /// Names with their word counts, sorted by name.
    pub fn summaries(&self) -> Result<Vec<(String, usize)>, ListError> {
        let lists: WordListMap = self.store.load_word_lists()?;
        Ok(lists.into_iter().map(|(name, words)| (name, words.len())).collect())
    }
}

/// Render a list back into the editable comma-separated form.
pub fn join_words(words: &[Word]) -> String {
    words.iter().map(Word::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lists() -> (TempDir, WordLists) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, WordLists::new(store))
    }

    #[test]
    fn test_save_then_load_round_trips_normalized_words() {
        let (_dir, lists) = lists();
        let saved = lists.save("Week 1", " Cat,dog\nBIRD , cat").unwrap();
        let loaded = lists.load("Week 1").unwrap();
        assert_eq!(saved, loaded);
        let strs: Vec<&str> = loaded.iter().map(Word::as_str).collect();
        assert_eq!(strs, vec!["cat", "dog", "bird", "cat"]);
    }

    #[test]
    fn test_save_rejects_empty_name_and_words() {
        let (_dir, lists) = lists();
        assert!(matches!(lists.save("  ", "cat"), Err(ListError::EmptyName)));
        assert!(matches!(lists.save("x", " ,\n "), Err(ListError::NoWords)));
        assert!(lists.summaries().unwrap().is_empty());
    }

    #[test]
    fn test_save_replaces_same_name() {
        let (_dir, lists) = lists();
        lists.save("a", "one").unwrap();
        lists.save("a", "two, three").unwrap();
        assert_eq!(lists.summaries().unwrap(), vec![("a".to_string(), 2)]);
    }

    #[test]
    fn test_delete_and_clear() {
        let (_dir, lists) = lists();
        lists.save("a", "one").unwrap();
        lists.save("b", "two").unwrap();
        lists.delete("a").unwrap();
        assert_eq!(lists.summaries().unwrap(), vec![("b".to_string(), 1)]);
        assert!(matches!(lists.delete("a"), Err(ListError::NotFound(_))));
        lists.clear().unwrap();
        assert!(lists.summaries().unwrap().is_empty());
        lists.clear().unwrap();
    }

    #[test]
    fn test_join_words() {
        let words = parse_word_input("cat\ndog");
        assert_eq!(join_words(&words), "cat, dog");
    }
}
