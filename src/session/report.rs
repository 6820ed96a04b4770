use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::boss::BossOutcome;
use crate::engine::word::Word;
use crate::session::controller::SessionMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Flawless,
    Strong,
    Survived,
    BossSlain,
    Fallen,
}

/// Immutable summary of a finished session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub total: usize,
    pub score: usize,
    pub percent: u32,
    pub mistakes: Vec<Word>,
    pub mode: SessionMode,
    pub boss_outcome: Option<BossOutcome>,
    pub retest_offered: bool,
    pub verdict: Verdict,
    pub finished_at: DateTime<Utc>,
}

pub fn percent(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (score as f64 / total as f64 * 100.0).round() as u32
}

impl SessionReport {
    pub fn new(
        total: usize,
        score: usize,
        mistakes: Vec<Word>,
        mode: SessionMode,
        boss_outcome: Option<BossOutcome>,
    ) -> Self {
        let percent = percent(score, total);
        let verdict = match &boss_outcome {
            Some(outcome) if outcome.slain => Verdict::BossSlain,
            Some(_) => Verdict::Fallen,
            None if percent == 100 => Verdict::Flawless,
            None if percent >= 60 => Verdict::Strong,
            None => Verdict::Survived,
        };
        Self {
            total,
            score,
            percent,
            retest_offered: !mistakes.is_empty(),
            mistakes,
            mode,
            boss_outcome,
            verdict,
            finished_at: Utc::now(),
        }
    }

    pub fn headline(&self) -> &'static str {
        match self.verdict {
            Verdict::Flawless => "FLAWLESS!",
            Verdict::Strong => "WELL FOUGHT!",
            Verdict::Survived => "SURVIVED!",
            Verdict::BossSlain => "BOSS SLAIN!",
            Verdict::Fallen => "YOU FELL",
        }
    }

    pub fn summary_line(&self) -> String {
        let tally = format!("{}/{} ({}%)", self.score, self.total, self.percent);
        match (&self.boss_outcome, self.mode) {
            (Some(outcome), _) if outcome.slain => format!("Boss defeated! {tally}"),
            (Some(outcome), _) => format!(
                "The boss yet stands... {tally}, health remaining {}%",
                outcome.remaining_display()
            ),
            (None, SessionMode::Retest) => format!("Retest: {tally}"),
            (None, _) => format!("Score: {tally}"),
        }
    }
}
