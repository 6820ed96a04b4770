use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::resolver::WordContext;
use crate::engine::boss::{self, BossState};
use crate::engine::ledger::{self, SharedLedger};
use crate::engine::word::{Word, normalize_all};
use crate::session::report::SessionReport;
use crate::session::scheduler::{Scheduler, TaskKind};

pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(2400);
pub const DEFAULT_BOSS_WORDS: usize = 12;
/// How long a narrated sentence may run before the word is announced anyway.
const NARRATION_FALLBACK: Duration = Duration::from_secs(15);
const ANNOUNCE_PAUSE: Duration = Duration::from_millis(400);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    Practice,
    Retest,
    Boss,
}

impl SessionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionMode::Practice => "practice",
            SessionMode::Retest => "retest",
            SessionMode::Boss => "boss",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Add some words first.")]
    EmptyWordList,
    #[error("Type an answer before submitting.")]
    EmptyAnswer,
    #[error("The boss arena is empty: no recorded mistakes to fight.")]
    NoBossAvailable,
    #[error("No mistakes remain to retest.")]
    NoMistakesToRetest,
}

#[derive(Clone, Debug)]
pub struct StartRequest {
    pub words: Vec<String>,
    pub mode: SessionMode,
}

impl StartRequest {
    pub fn new<S: AsRef<str>>(words: &[S], mode: SessionMode) -> Self {
        Self {
            words: words.iter().map(|s| s.as_ref().to_string()).collect(),
            mode,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SessionSettings {
    pub feedback_delay: Duration,
    pub boss_word_count: usize,
    pub auto_speak: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
            boss_word_count: DEFAULT_BOSS_WORDS,
            auto_speak: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Idle,
    Loading { generation: u64 },
    Active,
    Evaluating,
    Ended(SessionReport),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub words: Vec<Word>,
    pub contexts: Vec<WordContext>,
    pub current_index: usize,
    pub score: usize,
    pub session_mistakes: Vec<Word>,
    pub mode: SessionMode,
    pub phase: Phase,
    pub boss: Option<BossState>,
}

impl SessionState {
    fn idle() -> Self {
        Self {
            words: Vec::new(),
            contexts: Vec::new(),
            current_index: 0,
            score: 0,
            session_mistakes: Vec::new(),
            mode: SessionMode::Practice,
            phase: Phase::Idle,
            boss: None,
        }
    }

    pub fn answering(&self) -> bool {
        matches!(self.phase, Phase::Evaluating)
    }

    pub fn current_context(&self) -> Option<&WordContext> {
        match self.phase {
            Phase::Active | Phase::Evaluating => self.contexts.get(self.current_index),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Feedback {
    Correct,
    Incorrect { expected: Word },
}

/// What the presentation should do in response to a command.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    ResolveContexts { generation: u64, words: Vec<Word> },
    ShowCue { index: usize, total: usize, display: String },
    Narrate(String),
    StopNarration,
    Feedback(Feedback),
    BossStruck { health: u32, enraged: bool },
    PlayerStruck,
    SessionEnded(SessionReport),
}

/// Drives one session at a time: start, resolve cues, evaluate answers,
/// advance after the feedback delay, and settle the report.
pub struct SessionController {
    ledger: SharedLedger,
    settings: SessionSettings,
    state: SessionState,
    scheduler: Scheduler,
    generation: u64,
}

impl SessionController {
    pub fn new(ledger: SharedLedger, settings: SessionSettings) -> Self {
        Self {
            ledger,
            settings,
            state: SessionState::idle(),
            scheduler: Scheduler::new(),
            generation: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn set_auto_speak(&mut self, on: bool) {
        self.settings.auto_speak = on;
    }

    pub fn report(&self) -> Option<&SessionReport> {
        match &self.state.phase {
            Phase::Ended(report) => Some(report),
            _ => None,
        }
    }

    /// Begin a session. Boss mode ignores the request's words and fights
    /// the ledger's most-missed entries instead.
    pub fn start_session(&mut self, request: StartRequest) -> Result<Vec<Effect>, SessionError> {
        let words = match request.mode {
            SessionMode::Boss => {
                let words = ledger::lock(&self.ledger).top_misses(self.settings.boss_word_count);
                if words.is_empty() {
                    return Err(SessionError::NoBossAvailable);
                }
                words
            }
            _ => {
                let words = normalize_all(&request.words);
                if words.is_empty() {
                    return Err(SessionError::EmptyWordList);
                }
                words
            }
        };
        Ok(self.begin(words, request.mode))
    }

    pub fn start_boss(&mut self) -> Result<Vec<Effect>, SessionError> {
        self.start_session(StartRequest {
            words: Vec::new(),
            mode: SessionMode::Boss,
        })
    }

    /// Start a retest from the finished session's mistakes, consuming them.
    pub fn start_retest(&mut self) -> Result<Vec<Effect>, SessionError> {
        if !matches!(self.state.phase, Phase::Ended(_)) || self.state.session_mistakes.is_empty() {
            return Err(SessionError::NoMistakesToRetest);
        }
        let words = std::mem::take(&mut self.state.session_mistakes);
        Ok(self.begin(words, SessionMode::Retest))
    }

    fn begin(&mut self, words: Vec<Word>, mode: SessionMode) -> Vec<Effect> {
        self.scheduler.cancel_all();
        self.generation += 1;

        let boss = (mode == SessionMode::Boss).then(|| {
            let encounter = boss::select_encounter(&words, &ledger::lock(&self.ledger));
            BossState::new(encounter, words.len())
        });
        if let Some(b) = &boss {
            log::info!("boss session against {} ({} words)", b.encounter.name, words.len());
        } else {
            log::info!("{} session with {} words", mode.as_str(), words.len());
        }

        self.state = SessionState {
            words: words.clone(),
            mode,
            phase: Phase::Loading {
                generation: self.generation,
            },
            boss,
            ..SessionState::idle()
        };

        vec![
            Effect::StopNarration,
            Effect::ResolveContexts {
                generation: self.generation,
                words,
            },
        ]
    }

    /// Accept resolved cues. Results from an aborted or replaced load are
    /// dropped.
    pub fn contexts_resolved(
        &mut self,
        generation: u64,
        mut contexts: Vec<WordContext>,
        now: Instant,
    ) -> Vec<Effect> {
        if self.state.phase != (Phase::Loading { generation }) {
            log::debug!("discarding stale contexts for load {generation}");
            return Vec::new();
        }
        debug_assert_eq!(contexts.len(), self.state.words.len());
        contexts.truncate(self.state.words.len());
        for word in &self.state.words[contexts.len()..] {
            contexts.push(WordContext::generic(word));
        }

        self.state.contexts = contexts;
        self.state.phase = Phase::Active;
        self.show_cue(now)
    }

    /// Evaluate an answer for the current cue. A submission while the
    /// previous one is still on screen, or outside an active cue, does
    /// nothing.
    pub fn submit_answer(&mut self, raw: &str, now: Instant) -> Result<Vec<Effect>, SessionError> {
        if self.state.phase != Phase::Active {
            return Ok(Vec::new());
        }
        let Some(answer) = Word::parse(raw) else {
            return Err(SessionError::EmptyAnswer);
        };

        self.state.phase = Phase::Evaluating;
        self.scheduler.cancel_kind(TaskKind::AnnounceWord);
        let expected = self.state.words[self.state.current_index].clone();
        let mut effects = Vec::new();

        if answer == expected {
            self.state.score += 1;
            effects.push(Effect::Feedback(Feedback::Correct));
            if let Some(boss) = self.state.boss.as_mut() {
                boss.strike();
                effects.push(Effect::BossStruck {
                    health: boss.display_health(),
                    enraged: boss.is_enraged(),
                });
            }
        } else {
            self.state.session_mistakes.push(expected.clone());
            if let Err(e) = ledger::lock(&self.ledger).increment(&expected) {
                log::error!("failed to record miss for {expected}: {e:#}");
            }
            effects.push(Effect::Feedback(Feedback::Incorrect { expected }));
            if self.state.boss.is_some() {
                effects.push(Effect::PlayerStruck);
            }
        }

        self.scheduler.schedule(
            TaskKind::AdvanceAfterFeedback,
            now + self.settings.feedback_delay,
        );
        Ok(effects)
    }

    /// Run every scheduled task that is due.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        for kind in self.scheduler.take_due(now) {
            match kind {
                TaskKind::AdvanceAfterFeedback => {
                    if self.state.phase == Phase::Evaluating {
                        self.state.current_index += 1;
                        self.state.phase = Phase::Active;
                        effects.extend(self.show_cue(now));
                    }
                }
                TaskKind::AnnounceWord => {
                    if let Some(ctx) = self.state.current_context() {
                        effects.push(Effect::Narrate(announcement(&ctx.target_word)));
                    }
                }
            }
        }
        effects
    }

    /// The presentation finished speaking the example sentence; announce
    /// the word shortly after instead of waiting for the fallback.
    pub fn narration_finished(&mut self, now: Instant) {
        if self.scheduler.is_pending(TaskKind::AnnounceWord) {
            self.scheduler.cancel_kind(TaskKind::AnnounceWord);
            self.scheduler
                .schedule(TaskKind::AnnounceWord, now + ANNOUNCE_PAUSE);
        }
    }

    /// Narrate the current cue again on request.
    pub fn replay_hint(&mut self, now: Instant) -> Vec<Effect> {
        if self.state.phase != Phase::Active {
            return Vec::new();
        }
        self.narrate_current(now)
    }

    /// Drop the session without a report. Pending timers and in-flight
    /// lookups are discarded; the ledger is not touched.
    pub fn abort(&mut self) -> Vec<Effect> {
        self.scheduler.cancel_all();
        self.generation += 1;
        if self.state.phase != Phase::Idle {
            log::info!("session aborted at word {}", self.state.current_index);
        }
        self.state = SessionState::idle();
        vec![Effect::StopNarration]
    }

    fn show_cue(&mut self, now: Instant) -> Vec<Effect> {
        let state = &self.state;
        debug_assert_eq!(
            state.score + state.session_mistakes.len(),
            state.current_index,
            "every settled cue is either scored or missed"
        );
        if state.current_index >= state.words.len() {
            return self.finish();
        }

        let mut effects = vec![Effect::ShowCue {
            index: state.current_index,
            total: state.words.len(),
            display: state.contexts[state.current_index].display.clone(),
        }];
        if self.settings.auto_speak || state.mode == SessionMode::Boss {
            effects.extend(self.narrate_current(now));
        }
        effects
    }

    fn narrate_current(&mut self, now: Instant) -> Vec<Effect> {
        self.scheduler.cancel_kind(TaskKind::AnnounceWord);
        let Some(ctx) = self.state.current_context() else {
            return Vec::new();
        };
        let mut effects = vec![Effect::StopNarration];
        match &ctx.speak_sentence {
            Some(sentence) => {
                effects.push(Effect::Narrate(sentence.clone()));
                self.scheduler
                    .schedule(TaskKind::AnnounceWord, now + NARRATION_FALLBACK);
            }
            None => effects.push(Effect::Narrate(announcement(&ctx.target_word))),
        }
        effects
    }

    fn finish(&mut self) -> Vec<Effect> {
        self.scheduler.cancel_all();
        let state = &mut self.state;
        let boss_outcome = state.boss.take().map(|mut boss| boss.settle());

        if let Some(outcome) = &boss_outcome {
            if outcome.slain {
                if let Err(e) = ledger::lock(&self.ledger).halve(&state.words) {
                    log::error!("failed to apply victory relief: {e:#}");
                }
            }
        }

        let report = SessionReport::new(
            state.words.len(),
            state.score,
            state.session_mistakes.clone(),
            state.mode,
            boss_outcome,
        );
        log::info!(
            "{} session ended: {}/{}",
            state.mode.as_str(),
            report.score,
            report.total
        );
        state.phase = Phase::Ended(report.clone());
        vec![Effect::StopNarration, Effect::SessionEnded(report)]
    }
}

fn announcement(word: &Word) -> String {
    format!("The word is {word}.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ledger::{MemoryLedgerStore, MistakeCounts, MistakeLedger};

    fn w(s: &str) -> Word {
        Word::parse(s).unwrap()
    }

    fn controller(entries: &[(&str, u32)]) -> (SessionController, MemoryLedgerStore) {
        let counts: MistakeCounts = entries.iter().map(|&(k, v)| (w(k), v)).collect();
        let store = MemoryLedgerStore::with_counts(counts);
        let ledger = MistakeLedger::open(Box::new(store.clone())).shared();
        let settings = SessionSettings {
            auto_speak: false,
            ..SessionSettings::default()
        };
        (SessionController::new(ledger, settings), store)
    }

    fn load(c: &mut SessionController, effects: Vec<Effect>, now: Instant) -> Vec<Effect> {
        let Some(Effect::ResolveContexts { generation, words }) = effects
            .into_iter()
            .find(|e| matches!(e, Effect::ResolveContexts { .. }))
        else {
            panic!("no resolve effect");
        };
        let contexts = words.iter().map(WordContext::generic).collect();
        c.contexts_resolved(generation, contexts, now)
    }

    fn answer(c: &mut SessionController, raw: &str, now: &mut Instant) -> Vec<Effect> {
        let mut effects = c.submit_answer(raw, *now).unwrap();
        *now += DEFAULT_FEEDBACK_DELAY;
        effects.extend(c.tick(*now));
        effects
    }

    #[test]
    fn test_start_resets_state() {
        let (mut c, _) = controller(&[]);
        let effects = c
            .start_session(StartRequest::new(&[" Cat", "DOG ", ""], SessionMode::Practice))
            .unwrap();
        let s = c.state();
        assert_eq!(s.words, vec![w("cat"), w("dog")]);
        assert_eq!(s.score, 0);
        assert_eq!(s.current_index, 0);
        assert!(s.session_mistakes.is_empty());
        assert_eq!(s.phase, Phase::Loading { generation: 1 });
        assert!(effects.contains(&Effect::ResolveContexts {
            generation: 1,
            words: vec![w("cat"), w("dog")],
        }));
    }

    #[test]
    fn test_empty_word_list_rejected_without_mutation() {
        let (mut c, _) = controller(&[]);
        let err = c
            .start_session(StartRequest::new(&["  ", ""], SessionMode::Practice))
            .unwrap_err();
        assert_eq!(err, SessionError::EmptyWordList);
        assert_eq!(c.state().phase, Phase::Idle);
    }

    #[test]
    fn test_first_cue_shown_after_resolution() {
        let (mut c, _) = controller(&[]);
        let now = Instant::now();
        let start = c.start_session(StartRequest::new(&["cat"], SessionMode::Practice)).unwrap();
        let effects = load(&mut c, start, now);
        assert_eq!(c.state().phase, Phase::Active);
        assert!(matches!(
            &effects[0],
            Effect::ShowCue { index: 0, total: 1, .. }
        ));
    }

    #[test]
    fn test_stale_contexts_discarded() {
        let (mut c, _) = controller(&[]);
        let now = Instant::now();
        c.start_session(StartRequest::new(&["cat"], SessionMode::Practice)).unwrap();
        c.abort();
        let effects = c.contexts_resolved(1, vec![WordContext::generic(&w("cat"))], now);
        assert!(effects.is_empty());
        assert_eq!(c.state().phase, Phase::Idle);
    }

    #[test]
    fn test_empty_answer_is_rejected_and_changes_nothing() {
        let (mut c, _) = controller(&[]);
        let now = Instant::now();
        let start = c.start_session(StartRequest::new(&["cat"], SessionMode::Practice)).unwrap();
        load(&mut c, start, now);
        let before = c.state().clone();
        assert_eq!(c.submit_answer("   ", now), Err(SessionError::EmptyAnswer));
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_double_submit_is_noop() {
        let (mut c, store) = controller(&[]);
        let now = Instant::now();
        let start = c.start_session(StartRequest::new(&["cat", "dog"], SessionMode::Practice)).unwrap();
        load(&mut c, start, now);
        c.submit_answer("cta", now).unwrap();
        assert!(c.state().answering());
        let before = c.state().clone();
        assert!(c.submit_answer("cat", now).unwrap().is_empty());
        assert!(c.submit_answer("cta", now).unwrap().is_empty());
        assert_eq!(c.state(), &before);
        assert_eq!(store.saved().get(&w("cat")), Some(&1));
    }

    #[test]
    fn test_advance_waits_for_feedback_delay() {
        let (mut c, _) = controller(&[]);
        let now = Instant::now();
        let start = c.start_session(StartRequest::new(&["cat", "dog"], SessionMode::Practice)).unwrap();
        load(&mut c, start, now);
        c.submit_answer("cat", now).unwrap();
        assert!(c.tick(now + Duration::from_millis(2399)).is_empty());
        assert_eq!(c.state().current_index, 0);
        let effects = c.tick(now + DEFAULT_FEEDBACK_DELAY);
        assert_eq!(c.state().current_index, 1);
        assert!(matches!(&effects[0], Effect::ShowCue { index: 1, .. }));
    }

    #[test]
    fn test_scenario_all_correct() {
        let (mut c, store) = controller(&[]);
        let mut now = Instant::now();
        let start = c.start_session(StartRequest::new(&["cat", "dog"], SessionMode::Practice)).unwrap();
        load(&mut c, start, now);
        answer(&mut c, "cat", &mut now);
        let effects = answer(&mut c, "DOG", &mut now);
        let report = c.report().unwrap();
        assert_eq!((report.score, report.total, report.percent), (2, 2, 100));
        assert!(report.mistakes.is_empty());
        assert!(!report.retest_offered);
        assert!(effects.iter().any(|e| matches!(e, Effect::SessionEnded(_))));
        assert!(store.saved().is_empty());
        assert_eq!(c.start_retest(), Err(SessionError::NoMistakesToRetest));
    }

    #[test]
    fn test_scenario_one_miss_offers_retest() {
        let (mut c, store) = controller(&[]);
        let mut now = Instant::now();
        let start = c.start_session(StartRequest::new(&["cat", "dog"], SessionMode::Practice)).unwrap();
        load(&mut c, start, now);
        let effects = answer(&mut c, "cta", &mut now);
        assert!(effects.contains(&Effect::Feedback(Feedback::Incorrect { expected: w("cat") })));
        assert_eq!(c.state().score + c.state().session_mistakes.len(), c.state().current_index);
        answer(&mut c, "dog", &mut now);

        let report = c.report().unwrap().clone();
        assert_eq!((report.score, report.total, report.percent), (1, 2, 50));
        assert_eq!(report.mistakes, vec![w("cat")]);
        assert!(report.retest_offered);
        assert_eq!(store.saved().get(&w("cat")), Some(&1));

        let effects = c.start_retest().unwrap();
        assert_eq!(c.state().mode, SessionMode::Retest);
        assert_eq!(c.state().words, vec![w("cat")]);
        assert!(c.state().session_mistakes.is_empty());
        load(&mut c, effects, now);
        answer(&mut c, "cat", &mut now);
        let retest = c.report().unwrap();
        assert_eq!(retest.mode, SessionMode::Retest);
        assert_eq!(retest.summary_line(), "Retest: 1/1 (100%)");
    }

    #[test]
    fn test_retest_keeps_duplicate_misses() {
        let (mut c, store) = controller(&[]);
        let mut now = Instant::now();
        let start = c.start_session(StartRequest::new(&["cat", "cat"], SessionMode::Practice)).unwrap();
        load(&mut c, start, now);
        answer(&mut c, "x", &mut now);
        answer(&mut c, "y", &mut now);
        assert_eq!(store.saved().get(&w("cat")), Some(&2));
        c.start_retest().unwrap();
        assert_eq!(c.state().words, vec![w("cat"), w("cat")]);
    }

    #[test]
    fn test_boss_requires_ledger_entries() {
        let (mut c, _) = controller(&[]);
        assert_eq!(c.start_boss(), Err(SessionError::NoBossAvailable));
        assert_eq!(c.state().phase, Phase::Idle);
    }

    #[test]
    fn test_boss_keeps_words_halved_to_zero() {
        let (mut c, _) = controller(&[("cat", 0), ("dog", 0)]);
        c.start_boss().unwrap();
        assert_eq!(c.state().words, vec![w("cat"), w("dog")]);
        let boss = c.state().boss.as_ref().unwrap();
        assert_eq!(boss.total_words, 2);
        assert_eq!(boss.encounter.index, 0);
    }

    #[test]
    fn test_boss_uses_top_misses() {
        let entries: Vec<(String, u32)> = (0..15).map(|i| (format!("w{i:02}"), 20 - i)).collect();
        let refs: Vec<(&str, u32)> = entries.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        let (mut c, _) = controller(&refs);
        c.start_session(StartRequest::new(&["ignored"], SessionMode::Boss)).unwrap();
        let words = &c.state().words;
        assert_eq!(words.len(), DEFAULT_BOSS_WORDS);
        assert_eq!(words[0], w("w00"));
        assert!(!words.contains(&w("ignored")));
        assert!(c.state().boss.is_some());
    }

    #[test]
    fn test_scenario_boss_slain_halves_ledger() {
        let (mut c, store) = controller(&[("a", 4), ("b", 3), ("c", 2), ("d", 5)]);
        let mut now = Instant::now();
        let start = c.start_boss().unwrap();
        assert_eq!(c.state().words.len(), 4);
        load(&mut c, start, now);

        let mut last_health = 100.0;
        for _ in 0..4 {
            let word = c.state().words[c.state().current_index].clone();
            c.submit_answer(word.as_str(), now).unwrap();
            let health = c.state().boss.as_ref().map(|b| b.health_percent).unwrap_or(0.0);
            assert!(health <= last_health);
            last_health = health;
            now += DEFAULT_FEEDBACK_DELAY;
            c.tick(now);
        }

        let report = c.report().unwrap();
        let outcome = report.boss_outcome.as_ref().unwrap();
        assert!(outcome.slain);
        assert_eq!(outcome.health_remaining, 0.0);
        assert!(c.state().boss.is_none());
        let saved = store.saved();
        assert_eq!(saved.get(&w("a")), Some(&2));
        assert_eq!(saved.get(&w("b")), Some(&1));
        assert_eq!(saved.get(&w("c")), Some(&1));
        assert_eq!(saved.get(&w("d")), Some(&2));
    }

    #[test]
    fn test_scenario_boss_survives() {
        let (mut c, store) = controller(&[("a", 4), ("b", 3), ("c", 2), ("d", 5)]);
        let mut now = Instant::now();
        let start = c.start_boss().unwrap();
        load(&mut c, start, now);
        // order: d, a, b, c
        answer(&mut c, "d", &mut now);
        let effects = answer(&mut c, "wrong", &mut now);
        assert!(effects.contains(&Effect::PlayerStruck));
        answer(&mut c, "b", &mut now);
        answer(&mut c, "nope", &mut now);

        let report = c.report().unwrap();
        let outcome = report.boss_outcome.as_ref().unwrap();
        assert!(!outcome.slain);
        assert_eq!(outcome.health_remaining, 50.0);
        assert_eq!(report.mistakes, vec![w("a"), w("c")]);
        assert!(report.retest_offered);

        let saved = store.saved();
        assert_eq!(saved.get(&w("a")), Some(&5));
        assert_eq!(saved.get(&w("c")), Some(&3));
        assert_eq!(saved.get(&w("d")), Some(&5));

        c.start_retest().unwrap();
        assert_eq!(c.state().words, vec![w("a"), w("c")]);
        assert_eq!(c.state().mode, SessionMode::Retest);
        assert!(c.state().boss.is_none());
    }

    #[test]
    fn test_ledger_failure_does_not_abort_session() {
        let (mut c, store) = controller(&[]);
        let mut now = Instant::now();
        let start = c.start_session(StartRequest::new(&["cat"], SessionMode::Practice)).unwrap();
        load(&mut c, start, now);
        store.set_failing(true);
        answer(&mut c, "kat", &mut now);
        let report = c.report().unwrap();
        assert_eq!(report.mistakes, vec![w("cat")]);
        assert!(store.saved().is_empty());
    }

    #[test]
    fn test_abort_cancels_feedback_and_keeps_ledger() {
        let (mut c, store) = controller(&[]);
        let now = Instant::now();
        let start = c.start_session(StartRequest::new(&["cat", "dog"], SessionMode::Practice)).unwrap();
        load(&mut c, start, now);
        c.submit_answer("cta", now).unwrap();
        let effects = c.abort();
        assert_eq!(effects, vec![Effect::StopNarration]);
        assert!(c.tick(now + Duration::from_secs(60)).is_empty());
        assert_eq!(c.state().phase, Phase::Idle);
        assert!(c.report().is_none());
        assert_eq!(store.saved().get(&w("cat")), Some(&1));
    }

    #[test]
    fn test_narration_sentence_then_announcement() {
        let (mut c, _) = controller(&[]);
        c.set_auto_speak(true);
        let now = Instant::now();
        let start = c.start_session(StartRequest::new(&["cat"], SessionMode::Practice)).unwrap();
        let ctx = WordContext {
            display: "The ____ sat.".to_string(),
            speak_sentence: Some("The cat sat.".to_string()),
            target_word: w("cat"),
        };
        let Some(Effect::ResolveContexts { generation, .. }) = start.last().cloned() else {
            panic!("no resolve effect");
        };
        let effects = c.contexts_resolved(generation, vec![ctx], now);
        assert!(effects.contains(&Effect::Narrate("The cat sat.".to_string())));

        c.narration_finished(now + Duration::from_secs(2));
        assert!(c.tick(now + Duration::from_secs(2)).is_empty());
        let effects = c.tick(now + Duration::from_millis(2400));
        assert_eq!(effects, vec![Effect::Narrate("The word is cat.".to_string())]);
    }

    #[test]
    fn test_narration_fallback_fires_without_finish() {
        let (mut c, _) = controller(&[]);
        c.set_auto_speak(true);
        let now = Instant::now();
        let start = c.start_session(StartRequest::new(&["cat"], SessionMode::Practice)).unwrap();
        let Some(Effect::ResolveContexts { generation, .. }) = start.last().cloned() else {
            panic!("no resolve effect");
        };
        let ctx = WordContext {
            display: "The ____ sat.".to_string(),
            speak_sentence: Some("The cat sat.".to_string()),
            target_word: w("cat"),
        };
        c.contexts_resolved(generation, vec![ctx], now);
        assert!(c.tick(now + Duration::from_secs(14)).is_empty());
        let effects = c.tick(now + Duration::from_secs(15));
        assert_eq!(effects, vec![Effect::Narrate("The word is cat.".to_string())]);
    }

    #[test]
    fn test_replay_hint_without_sentence_announces_word() {
        let (mut c, _) = controller(&[]);
        let now = Instant::now();
        let start = c.start_session(StartRequest::new(&["dog"], SessionMode::Practice)).unwrap();
        load(&mut c, start, now);
        let effects = c.replay_hint(now);
        assert_eq!(
            effects,
            vec![
                Effect::StopNarration,
                Effect::Narrate("The word is dog.".to_string())
            ]
        );
    }
}
