use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::engine::word::Word;

pub type MistakeCounts = BTreeMap<Word, u32>;

/// Durable backing for the ledger. Every mutation is written through
/// before the in-memory copy changes.
pub trait LedgerStore: Send {
    fn load_mistakes(&self) -> anyhow::Result<MistakeCounts>;
    fn save_mistakes(&self, counts: &MistakeCounts) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Per-word cumulative miss counts, shared by every session in the process.
pub struct MistakeLedger {
    counts: MistakeCounts,
    store: Box<dyn LedgerStore>,
}

pub type SharedLedger = Arc<Mutex<MistakeLedger>>;

impl MistakeLedger {
    /// Load from the store. A store that cannot be read starts the ledger
    /// empty rather than refusing to run.
    pub fn open(store: Box<dyn LedgerStore>) -> Self {
        let counts = match store.load_mistakes() {
            Ok(counts) => counts,
            Err(e) => {
                log::warn!("mistake ledger unreadable, starting empty: {e:#}");
                MistakeCounts::new()
            }
        };
        Self { counts, store }
    }

    pub fn shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    pub fn count(&self, word: &Word) -> u32 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Word, u32)> {
        self.counts.iter().map(|(w, &c)| (w, c))
    }

    pub fn snapshot(&self) -> MistakeCounts {
        self.counts.clone()
    }

    pub fn increment(&mut self, word: &Word) -> Result<u32, LedgerError> {
        let mut staged = self.counts.clone();
        let count = staged.entry(word.clone()).or_insert(0);
        *count = count.saturating_add(1);
        let new_count = *count;
        self.commit(staged)?;
        Ok(new_count)
    }

    /// Halve (floor) the count of every listed word that has a record.
    /// Duplicates in `words` are halved once.
    pub fn halve(&mut self, words: &[Word]) -> Result<(), LedgerError> {
        let unique: BTreeSet<&Word> = words.iter().collect();
        let mut staged = self.counts.clone();
        for word in unique {
            if let Some(count) = staged.get_mut(word) {
                *count /= 2;
            }
        }
        self.commit(staged)
    }

    /// Up to `n` words by count descending, ties broken alphabetically.
    /// Entries halved down to zero are still ranked, after every missed word.
    pub fn top_misses(&self, n: usize) -> Vec<Word> {
        let mut ranked: Vec<(&Word, u32)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().take(n).map(|(w, _)| w.clone()).collect()
    }

    pub fn clear(&mut self) -> Result<(), LedgerError> {
        self.commit(MistakeCounts::new())
    }

    /// Replace every count, e.g. when importing an export bundle.
    pub fn replace(&mut self, counts: MistakeCounts) -> Result<(), LedgerError> {
        self.commit(counts)
    }

    fn commit(&mut self, staged: MistakeCounts) -> Result<(), LedgerError> {
        self.store.save_mistakes(&staged)?;
        self.counts = staged;
        Ok(())
    }
}

/// Lock a shared ledger, recovering the data if a holder panicked.
pub fn lock(ledger: &SharedLedger) -> MutexGuard<'_, MistakeLedger> {
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory store for tests and for running with persistence disabled.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    saved: Arc<Mutex<MistakeCounts>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryLedgerStore {
    pub fn with_counts(counts: MistakeCounts) -> Self {
        Self {
            saved: Arc::new(Mutex::new(counts)),
            failing: Arc::new(Mutex::new(false)),
        }
    }

    pub fn saved(&self) -> MistakeCounts {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(PoisonError::into_inner) = failing;
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load_mistakes(&self) -> anyhow::Result<MistakeCounts> {
        Ok(self.saved())
    }

    fn save_mistakes(&self, counts: &MistakeCounts) -> anyhow::Result<()> {
        if *self.failing.lock().unwrap_or_else(PoisonError::into_inner) {
            anyhow::bail!("storage unavailable");
        }
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = counts.clone();
        Ok(())
    }
}
