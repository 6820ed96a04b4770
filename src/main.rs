use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};

use spelldrill::app::{App, AppScreen, Strike};
use spelldrill::config::Config;
use spelldrill::engine::ledger::{LedgerStore, MistakeCounts};
use spelldrill::event::{AppEvent, EventHandler};
use spelldrill::session::controller::SessionMode;
use spelldrill::store::json_store::JsonStore;
use spelldrill::store::schema::ExportData;
use spelldrill::ui;
use spelldrill::ui::components::cue_panel::CuePanel;
use spelldrill::ui::components::health_bar::HealthBar;
use spelldrill::ui::components::ledger_sidebar::LedgerSidebar;
use spelldrill::ui::components::report_view::ReportView;
use spelldrill::ui::line_input::InputResult;
use spelldrill::ui::layout::{AppLayout, pack_hint_lines};
use spelldrill::ui::theme::Theme;

#[derive(Parser)]
#[command(
    name = "spelldrill",
    version,
    about = "Spelling drills with dictionary cues and mistake-weighted boss battles"
)]
struct Cli {
    #[arg(short, long, help = "Comma-separated words to drill right away")]
    words: Option<String>,

    #[arg(short, long, help = "Drill a saved word list")]
    list: Option<String>,

    #[arg(short, long, help = "Start a boss battle against your most-missed words")]
    boss: bool,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Skip dictionary lookups")]
    offline: bool,

    #[arg(long, value_name = "PATH", help = "Write mistakes, lists and config to a JSON file")]
    export: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Replace mistakes and lists from an export file")]
    import: Option<PathBuf>,

    #[arg(long, help = "Clear the mistake ledger")]
    reset_mistakes: bool,
}

impl Cli {
    fn is_batch(&self) -> bool {
        self.export.is_some() || self.import.is_some() || self.reset_mistakes
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_file = if cli.is_batch() { None } else { log_path() };
    init_logging(log_file.as_deref());

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("config unreadable, using defaults: {e:#}");
        Config::default()
    });
    if let Some(theme) = &cli.theme {
        config.theme = theme.clone();
    }

    if cli.is_batch() {
        return run_batch(&cli, &config);
    }

    let store = match JsonStore::new() {
        Ok(store) => {
            if store.check_interrupted_import() {
                log::warn!("cleaned up backups from an interrupted import");
            }
            Some(store)
        }
        Err(e) => {
            log::warn!("data directory unavailable: {e:#}");
            None
        }
    };

    if let Some(name) = &cli.theme {
        if Theme::load(name).is_none() {
            eprintln!(
                "Unknown theme {name:?}; available: {}",
                Theme::available_themes().join(", ")
            );
        }
    }
    let mut app = App::new(config, store, cli.offline);
    if let Some(name) = &cli.list {
        app.load_list(name)?;
    } else if let Some(words) = &cli.words {
        app.word_input.set(words);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));
    app.attach_events(events.sender());

    let now = Instant::now();
    if cli.boss {
        app.start_boss(now);
    } else if cli.list.is_some() || cli.words.is_some() {
        app.start_practice(now);
    }

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn log_path() -> Option<PathBuf> {
    let dir = dirs::data_dir()?.join("spelldrill");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join("spelldrill.log"))
}

/// `RUST_LOG` controls the filter. The terminal UI owns stderr, so
/// interactive runs log to a file or not at all.
fn init_logging(log_file: Option<&Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(_) => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }
    builder.init();
}

fn run_batch(cli: &Cli, config: &Config) -> Result<()> {
    let store = JsonStore::new().context("opening data directory")?;

    if let Some(path) = &cli.import {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let data: ExportData = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        store.import_all(&data)?;
        data.config.save()?;
        println!(
            "Imported {} mistakes and {} lists from {}",
            data.mistakes.len(),
            data.word_lists.len(),
            path.display()
        );
    }

    if cli.reset_mistakes {
        store.save_mistakes(&MistakeCounts::new())?;
        println!("Mistake ledger cleared.");
    }

    if let Some(path) = &cli.export {
        let data = store.export_all(config)?;
        let json = serde_json::to_string_pretty(&data)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Exported to {}", path.display());
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.on_tick(Instant::now()),
            AppEvent::Resize(_, _) => {}
            AppEvent::ContextsReady {
                generation,
                contexts,
            } => app.on_contexts_ready(generation, contexts, Instant::now()),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::WordEntry => handle_word_entry_key(app, key),
        AppScreen::SaveList => handle_save_list_key(app, key),
        AppScreen::Lists => handle_lists_key(app, key),
        AppScreen::Drill => handle_drill_key(app, key),
        AppScreen::Results => handle_results_key(app, key),
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    let now = Instant::now();
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => app.menu_action(app.menu.selected_action(), now),
        KeyCode::Char(ch) => {
            if let Some(action) = app.menu.action_for_key(ch) {
                app.menu_action(action, now);
            }
        }
        _ => {}
    }
}

fn handle_word_entry_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
        app.open_save_prompt();
        return;
    }
    match app.word_input.handle(key) {
        InputResult::Submit => app.start_practice(Instant::now()),
        InputResult::Cancel => app.go_to_menu(),
        InputResult::Continue => {}
    }
}

fn handle_save_list_key(app: &mut App, key: KeyEvent) {
    match app.list_name_input.handle(key) {
        InputResult::Submit => app.save_list(),
        InputResult::Cancel => app.screen = AppScreen::WordEntry,
        InputResult::Continue => {}
    }
}

fn handle_lists_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Up | KeyCode::Char('k') => app.list_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.list_next(),
        KeyCode::Enter => app.load_selected_list(),
        KeyCode::Char('x') | KeyCode::Delete => app.delete_selected_list(),
        KeyCode::Char('n') => app.open_word_entry(),
        _ => {}
    }
}

fn handle_drill_key(app: &mut App, key: KeyEvent) {
    let now = Instant::now();
    match key.code {
        KeyCode::Esc => app.go_to_menu(),
        KeyCode::Tab => app.replay_hint(now),
        KeyCode::F(2) => app.toggle_auto_speak(),
        _ if app.accepts_answer_input() => {
            if app.answer_input.handle(key) == InputResult::Submit {
                app.submit_answer(now);
            }
        }
        _ => {}
    }
}

fn handle_results_key(app: &mut App, key: KeyEvent) {
    let now = Instant::now();
    match key.code {
        KeyCode::Char('r') => app.start_retest(now),
        KeyCode::Char('b') => app.start_boss(now),
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::WordEntry => render_word_entry(frame, app),
        AppScreen::SaveList => render_save_list(frame, app),
        AppScreen::Lists => render_lists(frame, app),
        AppScreen::Drill => render_drill(frame, app),
        AppScreen::Results => render_results(frame, app),
    }
}

fn render_header(frame: &mut ratatui::Frame, area: Rect, app: &App, info: &str) {
    let colors = &app.theme.colors;
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " spelldrill ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info.to_string(),
            Style::default().fg(colors.header_fg()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

/// Status message (if any) above the packed key hints.
fn render_footer(frame: &mut ratatui::Frame, area: Rect, app: &App, hints: &[&str]) {
    let colors = &app.theme.colors;
    let mut lines = Vec::new();
    if let Some(status) = &app.status {
        let color = if status.is_error {
            colors.error()
        } else {
            colors.success()
        };
        lines.push(Line::from(Span::styled(
            format!(" {}", status.text),
            Style::default().fg(color),
        )));
    }
    for hint in pack_hint_lines(hints, area.width as usize) {
        lines.push(Line::from(Span::styled(
            hint,
            Style::default().fg(colors.accent_dim()),
        )));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn screen_rows(area: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(area);
    (rows[0], rows[1], rows[2])
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let (header, body, footer) = screen_rows(frame.area());

    let tracked = app.ledger_top(usize::MAX).len();
    render_header(
        frame,
        header,
        app,
        &format!("| {tracked} words in the mistake ledger"),
    );

    let menu_area = ui::layout::centered_rect(50, 80, body);
    frame.render_widget(&app.menu, menu_area);

    render_footer(frame, footer, app, &["[1/2/b] Choose", "[j/k] Move", "[q] Quit"]);
}

fn render_word_entry(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let (header, body, footer) = screen_rows(frame.area());
    render_header(frame, header, app, "| Practice");

    let area = ui::layout::centered_rect(70, 40, body);
    let block = Block::bordered()
        .title(" Words to practice ")
        .border_style(Style::default().fg(colors.border_focused()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(Span::styled(
            " Separate words with commas.",
            Style::default().fg(colors.accent_dim()),
        )),
        Line::from(""),
        app.word_input.styled_line(
            " ",
            Style::default(),
            Style::default().fg(colors.fg()),
            Style::default().fg(colors.bg()).bg(colors.accent()),
        ),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    render_footer(
        frame,
        footer,
        app,
        &["[Enter] Start", "[Ctrl+S] Save as list", "[Esc] Menu"],
    );
}

fn render_save_list(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let (header, body, footer) = screen_rows(frame.area());
    render_header(frame, header, app, "| Save list");

    let area = ui::layout::centered_rect(50, 20, body);
    let block = Block::bordered()
        .title(" List name ")
        .border_style(Style::default().fg(colors.border_focused()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(app.list_name_input.styled_line(
            " ",
            Style::default(),
            Style::default().fg(colors.fg()),
            Style::default().fg(colors.bg()).bg(colors.accent()),
        )),
        inner,
    );

    render_footer(frame, footer, app, &["[Enter] Save", "[Esc] Back"]);
}

fn render_lists(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let (header, body, footer) = screen_rows(frame.area());
    render_header(frame, header, app, "| Saved lists");

    let area = ui::layout::centered_rect(50, 70, body);
    let block = Block::bordered()
        .title(" Saved lists ")
        .border_style(Style::default().fg(colors.border()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = if app.list_summaries.is_empty() {
        vec![Line::from(Span::styled(
            " No saved lists yet.",
            Style::default().fg(colors.accent_dim()),
        ))]
    } else {
        app.list_summaries
            .iter()
            .enumerate()
            .map(|(i, (name, count))| {
                let selected = i == app.list_selected;
                let style = if selected {
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                let marker = if selected { ">" } else { " " };
                Line::from(Span::styled(format!(" {marker} {name} ({count})"), style))
            })
            .collect()
    };
    frame.render_widget(Paragraph::new(lines), inner);

    render_footer(
        frame,
        footer,
        app,
        &["[Enter] Load", "[x] Delete", "[n] New", "[Esc] Menu"],
    );
}

fn render_drill(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let layout = AppLayout::new(frame.area());
    let state = app.controller.state();

    let mode = match state.mode {
        SessionMode::Practice => "Practice".to_string(),
        SessionMode::Retest => "Retest".to_string(),
        SessionMode::Boss => match &state.boss {
            Some(boss) => format!("Boss: {}", boss.encounter.name),
            None => "Boss".to_string(),
        },
    };
    render_header(
        frame,
        layout.header,
        app,
        &format!(
            "| {mode} | Score {} | Missed {}",
            state.score,
            state.session_mistakes.len()
        ),
    );

    let mut main = layout.main;
    if let Some(boss) = &state.boss {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(5)])
            .split(main);
        let label = match app.strike {
            Some(Strike::Boss) => format!("{} staggers!", boss.encounter.name),
            Some(Strike::Player) => format!("{} strikes you!", boss.encounter.name),
            None => boss.encounter.name.to_string(),
        };
        frame.render_widget(
            HealthBar::new(&label, boss.display_health(), boss.is_enraged(), app.theme),
            rows[0],
        );
        main = rows[1];
    }

    if app.is_loading() {
        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(main);
        frame.render_widget(block, main);
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" Looking up {} words...", state.words.len()),
                Style::default().fg(colors.accent_dim()),
            )),
            inner,
        );
    } else if let Some(cue) = &app.cue {
        frame.render_widget(
            CuePanel::new(cue, &app.answer_input, app.feedback.as_ref(), app.theme),
            main,
        );
    }

    if let Some(sidebar) = layout.sidebar {
        let top = app.ledger_top(sidebar.height.saturating_sub(2) as usize);
        frame.render_widget(LedgerSidebar::new(&top, app.theme), sidebar);
    }

    let speak = if app.config.auto_speak {
        "[F2] Auto-speak off"
    } else {
        "[F2] Auto-speak on"
    };
    render_footer(
        frame,
        layout.footer,
        app,
        &["[Enter] Submit", "[Tab] Hear again", speak, "[Esc] Quit drill"],
    );
}

fn render_results(frame: &mut ratatui::Frame, app: &App) {
    let (header, body, footer) = screen_rows(frame.area());
    render_header(frame, header, app, "| Results");
    if let Some(report) = app.controller.report() {
        let centered = ui::layout::centered_rect(60, 50, body);
        frame.render_widget(ReportView::new(report, app.theme), centered);
    }
    render_footer(frame, footer, app, &["[b] Boss battle"]);
}
