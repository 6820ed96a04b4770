use std::sync::Arc;
use std::thread;

use regex::Regex;

use crate::context::curated::CuratedContexts;
use crate::context::dictionary::{DefinitionSource, DictionaryEntry};
use crate::engine::word::Word;

pub const BLANK: &str = "____";
pub const GENERIC_PROMPT: &str = "Spell the word: \"___\"";
const DEFINITION_PREFIX: &str = "What word means: ";
const DEFINITION_MAX_CHARS: usize = 120;

/// The cue shown for one word, plus the sentence to narrate if there is one.
#[derive(Clone, Debug, PartialEq)]
pub struct WordContext {
    pub display: String,
    pub speak_sentence: Option<String>,
    pub target_word: Word,
}

impl WordContext {
    pub fn generic(word: &Word) -> Self {
        Self {
            display: GENERIC_PROMPT.to_string(),
            speak_sentence: None,
            target_word: word.clone(),
        }
    }
}

/// Tiered cue lookup: curated entry, then dictionary example, then
/// dictionary definition, then a generic prompt. Never fails.
pub struct WordContextResolver {
    curated: CuratedContexts,
    source: Box<dyn DefinitionSource>,
}

impl WordContextResolver {
    pub fn new(curated: CuratedContexts, source: Box<dyn DefinitionSource>) -> Self {
        Self { curated, source }
    }

    pub fn resolve(&self, word: &Word) -> WordContext {
        if let Some(cue) = self.curated.get(word) {
            return WordContext {
                display: cue.display.clone(),
                speak_sentence: cue.speak.clone(),
                target_word: word.clone(),
            };
        }

        match self.source.lookup(word) {
            Ok(entries) => context_from_entries(word, &entries).unwrap_or_else(|| {
                log::debug!("no usable example or definition for {word}");
                WordContext::generic(word)
            }),
            Err(e) => {
                log::debug!("lookup for {word} failed, using generic prompt: {e}");
                WordContext::generic(word)
            }
        }
    }

    /// Resolve one word at a time, in list order.
    pub fn resolve_all(&self, words: &[Word]) -> Vec<WordContext> {
        words.iter().map(|w| self.resolve(w)).collect()
    }
}

/// Resolve `words` on a worker thread and hand the ordered result to
/// `on_done`. The caller decides whether the result is still wanted.
pub fn spawn_resolution<F>(resolver: Arc<WordContextResolver>, words: Vec<Word>, on_done: F)
where
    F: FnOnce(Vec<WordContext>) + Send + 'static,
{
    thread::spawn(move || {
        let contexts = resolver.resolve_all(&words);
        on_done(contexts);
    });
}

fn context_from_entries(word: &Word, entries: &[DictionaryEntry]) -> Option<WordContext> {
    let entry = entries.first()?;
    let pattern = word_pattern(word)?;

    let example = entry
        .meanings
        .iter()
        .flat_map(|m| m.definitions.iter())
        .filter_map(|d| d.example.as_deref())
        .find(|ex| pattern.is_match(ex));
    if let Some(example) = example {
        return Some(WordContext {
            display: pattern.replace_all(example, BLANK).into_owned(),
            speak_sentence: Some(example.to_string()),
            target_word: word.clone(),
        });
    }

    let definition = entry
        .meanings
        .first()?
        .definitions
        .iter()
        .map(|d| d.definition.trim())
        .find(|d| !d.is_empty())?;
    // Blank the definition alone so the fixed prefix survives words like "word".
    let definition = truncate_chars(definition, DEFINITION_MAX_CHARS);
    Some(WordContext {
        display: format!("{DEFINITION_PREFIX}{}", pattern.replace_all(&definition, BLANK)),
        speak_sentence: None,
        target_word: word.clone(),
    })
}

/// Whole-word, case-insensitive matcher for `word`. Boundaries are only
/// required on sides where the word starts or ends with a word character.
fn word_pattern(word: &Word) -> Option<Regex> {
    let text = word.as_str();
    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if text.chars().next().is_some_and(is_word_char) { r"\b" } else { "" };
    let trail = if text.chars().last().is_some_and(is_word_char) { r"\b" } else { "" };
    Regex::new(&format!("(?i){lead}{}{trail}", regex::escape(text))).ok()
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
