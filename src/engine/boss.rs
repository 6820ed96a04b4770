use serde::{Deserialize, Serialize};

use crate::engine::ledger::MistakeLedger;
use crate::engine::word::Word;

pub const FULL_HEALTH: f64 = 100.0;
/// Health at or below this at report time counts as slain.
pub const DEFEAT_EPSILON: f64 = 0.1;
const EASY_AVERAGE: f64 = 1.5;
const ENRAGE_BELOW: u32 = 30;

pub const ROSTER: &[&str] = &[
    "The Hollow Scribe",
    "Grimwald of the Blotted Page",
    "Vesper, Keeper of Silent Letters",
    "The Misspelt Colossus",
    "Orthog the Unhyphenated",
    "Lady Apostrophe, the Possessive",
    "The Homophone Twins",
    "Barrow-King of Double Consonants",
    "Syllabus, the Endless Lecture",
    "The Ink Leviathan",
    "Queen Diphthong",
    "Marrow, Eater of Vowels",
    "The Illegible Hand",
    "Cantor of Schwa",
    "The Errata Knight",
    "Palimpsest Wraith",
    "Lexicon Devourer",
    "The Silent-E Sentinel",
    "Glyphmother of the Scriptorium",
    "Thorn, Last of the Old Letters",
    "The Unabridged",
    "Etymos, Root of All Words",
];

#[derive(Clone, Debug, PartialEq)]
pub struct Encounter {
    pub index: usize,
    pub name: &'static str,
    pub initial_health: f64,
}

/// Mean ledger weight of the set, counting a never-missed word as 1.
pub fn average_misses(words: &[Word], ledger: &MistakeLedger) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let total: u64 = words
        .iter()
        .map(|w| match ledger.count(w) {
            0 => 1,
            c => u64::from(c),
        })
        .sum();
    total as f64 / words.len() as f64
}

pub fn encounter_index(word_count: usize, avg_misses: f64) -> usize {
    let last = ROSTER.len() - 1;
    let raw = if avg_misses < EASY_AVERAGE {
        word_count / 3
    } else {
        avg_misses.floor() as usize
    };
    raw.min(last)
}

pub fn select_encounter(words: &[Word], ledger: &MistakeLedger) -> Encounter {
    let index = encounter_index(words.len(), average_misses(words, ledger));
    Encounter {
        index,
        name: ROSTER[index],
        initial_health: FULL_HEALTH,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BossState {
    pub encounter: Encounter,
    pub health_percent: f64,
    pub total_words: usize,
    hits: usize,
}

impl BossState {
    pub fn new(encounter: Encounter, total_words: usize) -> Self {
        debug_assert!(total_words > 0, "boss needs at least one word");
        Self {
            health_percent: encounter.initial_health,
            encounter,
            total_words,
            hits: 0,
        }
    }

    pub fn per_hit_damage(&self) -> f64 {
        FULL_HEALTH / self.total_words as f64
    }

    /// Apply one correct answer. The running value is not rounded or clamped.
    pub fn strike(&mut self) {
        self.hits += 1;
        debug_assert!(self.hits <= self.total_words, "more hits than words");
        self.health_percent = self.encounter.initial_health - self.hits as f64 * self.per_hit_damage();
    }

    pub fn display_health(&self) -> u32 {
        self.health_percent.round().max(0.0) as u32
    }

    pub fn is_enraged(&self) -> bool {
        self.display_health() < ENRAGE_BELOW
    }

    /// Snap near-zero health to zero and decide the outcome.
    pub fn settle(&mut self) -> BossOutcome {
        if self.health_percent <= DEFEAT_EPSILON {
            self.health_percent = 0.0;
        }
        BossOutcome {
            encounter: self.encounter.name.to_string(),
            slain: self.health_percent <= 0.0,
            health_remaining: self.health_percent.max(0.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossOutcome {
    pub encounter: String,
    pub slain: bool,
    pub health_remaining: f64,
}

impl BossOutcome {
    /// Remaining health rounded up, so a boss left at 0.4% still shows 1%.
    pub fn remaining_display(&self) -> u32 {
        self.health_remaining.ceil().max(0.0) as u32
    }
}
