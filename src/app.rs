use std::sync::Arc;
use std::sync::mpsc;
use std::time::Instant;

use crate::config::Config;
use crate::context::cache::DiskCache;
use crate::context::curated::CuratedContexts;
use crate::context::dictionary::{DefinitionSource, HttpDictionary, OfflineDictionary};
use crate::context::resolver::{WordContext, WordContextResolver, spawn_resolution};
use crate::engine::ledger::{self, LedgerStore, MemoryLedgerStore, MistakeLedger};
use crate::engine::word::{Word, parse_word_input};
use crate::event::AppEvent;
use crate::narration::{LogNarrator, NarrationStatus, Narrator};
use crate::session::controller::{
    Effect, Feedback, Phase, SessionController, SessionError, SessionMode, StartRequest,
};
use crate::store::json_store::JsonStore;
use crate::store::word_lists::{ListError, WordLists, join_words};
use crate::ui::components::cue_panel::CueView;
use crate::ui::components::menu::{Menu, MenuAction};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

const LIST_NAME_LIMIT: usize = 40;
const ANSWER_LIMIT: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    WordEntry,
    SaveList,
    Lists,
    Drill,
    Results,
}

/// Which side landed the last blow in a boss fight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strike {
    Boss,
    Player,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub screen: AppScreen,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub config: Config,
    pub controller: SessionController,
    pub store: Option<JsonStore>,
    pub word_input: LineInput,
    pub list_name_input: LineInput,
    pub answer_input: LineInput,
    pub list_summaries: Vec<(String, usize)>,
    pub list_selected: usize,
    pub cue: Option<CueView>,
    pub feedback: Option<Feedback>,
    pub strike: Option<Strike>,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
    lists: Option<WordLists>,
    resolver: Arc<WordContextResolver>,
    narrator: Box<dyn Narrator>,
    events: Option<mpsc::Sender<AppEvent>>,
}

impl App {
    pub fn new(config: Config, store: Option<JsonStore>, offline: bool) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let resolver = build_resolver(&config, offline);
        Self::with_parts(config, store, resolver, Box::new(LogNarrator), theme)
    }

    pub fn with_parts(
        config: Config,
        store: Option<JsonStore>,
        resolver: WordContextResolver,
        narrator: Box<dyn Narrator>,
        theme: &'static Theme,
    ) -> Self {
        let ledger_store: Box<dyn LedgerStore> = match &store {
            Some(s) => Box::new(s.clone()),
            None => {
                log::warn!("no data directory; mistakes will not be kept");
                Box::new(MemoryLedgerStore::default())
            }
        };
        let ledger = MistakeLedger::open(ledger_store).shared();
        let controller = SessionController::new(ledger, config.session_settings());

        Self {
            screen: AppScreen::Menu,
            menu: Menu::new(theme),
            theme,
            controller,
            lists: store.clone().map(WordLists::new),
            store,
            config,
            word_input: LineInput::new(""),
            list_name_input: LineInput::new("").with_limit(LIST_NAME_LIMIT),
            answer_input: LineInput::new("").with_limit(ANSWER_LIMIT),
            list_summaries: Vec::new(),
            list_selected: 0,
            cue: None,
            feedback: None,
            strike: None,
            status: None,
            should_quit: false,
            resolver: Arc::new(resolver),
            narrator,
            events: None,
        }
    }

    /// Resolve cues on worker threads and deliver them through `tx`.
    /// Without a sender, cues are resolved inline.
    pub fn attach_events(&mut self, tx: mpsc::Sender<AppEvent>) {
        self.events = Some(tx);
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    // --- navigation ---

    pub fn go_to_menu(&mut self) {
        let effects = self.controller.abort();
        self.apply(effects, Instant::now());
        self.cue = None;
        self.feedback = None;
        self.strike = None;
        self.screen = AppScreen::Menu;
    }

    pub fn open_word_entry(&mut self) {
        self.status = None;
        self.screen = AppScreen::WordEntry;
    }

    pub fn open_save_prompt(&mut self) {
        if self.word_input.is_blank() {
            self.error(ListError::NoWords.to_string());
            return;
        }
        self.list_name_input.clear();
        self.screen = AppScreen::SaveList;
    }

    pub fn open_lists(&mut self) {
        self.refresh_lists();
        self.list_selected = 0;
        self.screen = AppScreen::Lists;
    }

    pub fn menu_action(&mut self, action: MenuAction, now: Instant) {
        match action {
            MenuAction::Practice => self.open_word_entry(),
            MenuAction::SavedLists => self.open_lists(),
            MenuAction::Boss => self.start_boss(now),
            MenuAction::ResetMistakes => self.reset_mistakes(),
            MenuAction::Quit => self.should_quit = true,
        }
    }

    // --- sessions ---

    pub fn start_practice(&mut self, now: Instant) {
        let words: Vec<String> = parse_word_input(self.word_input.value())
            .into_iter()
            .map(String::from)
            .collect();
        let started = self
            .controller
            .start_session(StartRequest::new(&words, SessionMode::Practice));
        self.launch(started, now);
    }

    pub fn start_boss(&mut self, now: Instant) {
        let started = self.controller.start_boss();
        self.launch(started, now);
    }

    pub fn start_retest(&mut self, now: Instant) {
        let started = self.controller.start_retest();
        self.launch(started, now);
    }

    fn launch(&mut self, started: Result<Vec<Effect>, SessionError>, now: Instant) {
        match started {
            Ok(effects) => {
                self.status = None;
                self.cue = None;
                self.feedback = None;
                self.strike = None;
                self.answer_input.clear();
                self.screen = AppScreen::Drill;
                self.apply(effects, now);
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    pub fn submit_answer(&mut self, now: Instant) {
        match self.controller.submit_answer(self.answer_input.value(), now) {
            Ok(effects) => {
                self.status = None;
                self.apply(effects, now);
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    pub fn replay_hint(&mut self, now: Instant) {
        let effects = self.controller.replay_hint(now);
        self.apply(effects, now);
    }

    pub fn toggle_auto_speak(&mut self) {
        self.config.auto_speak = !self.config.auto_speak;
        self.controller.set_auto_speak(self.config.auto_speak);
        if let Err(e) = self.config.save() {
            log::warn!("could not save config: {e:#}");
        }
        let state = if self.config.auto_speak { "on" } else { "off" };
        self.info(format!("Auto-speak {state}"));
    }

    pub fn on_tick(&mut self, now: Instant) {
        let effects = self.controller.tick(now);
        self.apply(effects, now);
    }

    pub fn on_contexts_ready(&mut self, generation: u64, contexts: Vec<WordContext>, now: Instant) {
        let effects = self.controller.contexts_resolved(generation, contexts, now);
        self.apply(effects, now);
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.controller.state().phase, Phase::Loading { .. })
    }

    /// Whether typing goes to the answer field right now.
    pub fn accepts_answer_input(&self) -> bool {
        self.controller.state().phase == Phase::Active
    }

    fn apply(&mut self, effects: Vec<Effect>, now: Instant) {
        for effect in effects {
            match effect {
                Effect::ResolveContexts { generation, words } => {
                    self.resolve(generation, words, now)
                }
                Effect::ShowCue {
                    index,
                    total,
                    display,
                } => {
                    self.cue = Some(CueView {
                        index,
                        total,
                        display,
                    });
                    self.feedback = None;
                    self.strike = None;
                    self.answer_input.clear();
                }
                Effect::Narrate(text) => {
                    if self.narrator.speak(&text) == NarrationStatus::Finished {
                        self.controller.narration_finished(now);
                    }
                }
                Effect::StopNarration => self.narrator.stop(),
                Effect::Feedback(feedback) => self.feedback = Some(feedback),
                Effect::BossStruck { .. } => self.strike = Some(Strike::Boss),
                Effect::PlayerStruck => self.strike = Some(Strike::Player),
                Effect::SessionEnded(_) => {
                    self.cue = None;
                    self.screen = AppScreen::Results;
                }
            }
        }
    }

    fn resolve(&mut self, generation: u64, words: Vec<Word>, now: Instant) {
        if let Some(tx) = self.events.clone() {
            spawn_resolution(Arc::clone(&self.resolver), words, move |contexts| {
                // The loop may be gone if the user quit mid-load.
                let _ = tx.send(AppEvent::ContextsReady {
                    generation,
                    contexts,
                });
            });
        } else {
            let contexts = self.resolver.resolve_all(&words);
            self.on_contexts_ready(generation, contexts, now);
        }
    }

    // --- ledger ---

    /// Most-missed words with their counts, for the sidebar.
    /// Most-missed words with their counts. Entries halved to zero stay in
    /// the ledger for boss selection but are not listed.
    pub fn ledger_top(&self, n: usize) -> Vec<(Word, u32)> {
        let ledger = ledger::lock(self.controller.ledger());
        ledger
            .top_misses(usize::MAX)
            .into_iter()
            .map(|w| {
                let count = ledger.count(&w);
                (w, count)
            })
            .filter(|&(_, count)| count > 0)
            .take(n)
            .collect()
    }

    pub fn reset_mistakes(&mut self) {
        let cleared = ledger::lock(self.controller.ledger()).clear();
        match cleared {
            Ok(()) => self.info("Mistake ledger cleared."),
            Err(e) => self.error(format!("Could not clear mistakes: {e}")),
        }
    }

    // --- saved lists ---

    fn word_lists(&self) -> Result<&WordLists, ListError> {
        self.lists
            .as_ref()
            .ok_or_else(|| ListError::Storage(anyhow::anyhow!("no data directory available")))
    }

    pub fn refresh_lists(&mut self) {
        match self.word_lists().and_then(|l| l.summaries()) {
            Ok(summaries) => self.list_summaries = summaries,
            Err(e) => {
                self.list_summaries.clear();
                self.error(e.to_string());
            }
        }
        if self.list_selected >= self.list_summaries.len() {
            self.list_selected = self.list_summaries.len().saturating_sub(1);
        }
    }

    pub fn list_next(&mut self) {
        if !self.list_summaries.is_empty() {
            self.list_selected = (self.list_selected + 1).min(self.list_summaries.len() - 1);
        }
    }

    pub fn list_prev(&mut self) {
        self.list_selected = self.list_selected.saturating_sub(1);
    }

    pub fn save_list(&mut self) {
        let name = self.list_name_input.value().to_string();
        let saved = self
            .word_lists()
            .and_then(|l| l.save(&name, self.word_input.value()));
        match saved {
            Ok(words) => {
                self.info(format!("Saved \"{}\" ({} words).", name.trim(), words.len()));
                self.screen = AppScreen::WordEntry;
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    /// Put a saved list into the word entry field.
    pub fn load_list(&mut self, name: &str) -> Result<(), ListError> {
        let words = self.word_lists()?.load(name)?;
        self.word_input.set(&join_words(&words));
        self.info(format!("Loaded \"{}\".", name.trim()));
        Ok(())
    }

    pub fn load_selected_list(&mut self) {
        let Some((name, _)) = self.list_summaries.get(self.list_selected).cloned() else {
            return;
        };
        match self.load_list(&name) {
            Ok(()) => self.screen = AppScreen::WordEntry,
            Err(e) => self.error(e.to_string()),
        }
    }

    pub fn delete_selected_list(&mut self) {
        let Some((name, _)) = self.list_summaries.get(self.list_selected).cloned() else {
            return;
        };
        match self.word_lists().and_then(|l| l.delete(&name)) {
            Ok(()) => self.info(format!("Deleted \"{name}\".")),
            Err(e) => self.error(e.to_string()),
        }
        self.refresh_lists();
    }
}

/// Curated cues first, then the dictionary unless lookups are off.
pub fn build_resolver(config: &Config, offline: bool) -> WordContextResolver {
    let source: Box<dyn DefinitionSource> = if offline || !config.lookups_enabled {
        Box::new(OfflineDictionary)
    } else {
        let cache = if config.cache_lookups {
            DiskCache::new("lookups")
        } else {
            None
        };
        Box::new(HttpDictionary::new(
            &config.dictionary_api_base,
            config.lookup_timeout(),
            cache,
        ))
    };
    WordContextResolver::new(CuratedContexts::load(), source)
}
