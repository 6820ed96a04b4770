use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::ledger::MistakeCounts;
use crate::engine::word::Word;

pub const MISTAKES_FILE: &str = "mistakes.json";
pub const WORD_LISTS_FILE: &str = "word_lists.json";

/// List name to its ordered, normalized words.
pub type WordListMap = BTreeMap<String, Vec<Word>>;

pub const EXPORT_VERSION: u32 = 1;

/// Everything needed to move progress to another machine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub spelldrill_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: Config,
    pub mistakes: MistakeCounts,
    pub word_lists: WordListMap,
}
