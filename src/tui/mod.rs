// File: ./src/tui/mod.rs
// Terminal driver: renders an in-memory timeline and its filter panel
pub mod action;
pub mod state;
pub mod view;

use crate::config::Config;
use crate::dom::Tree;
use crate::engine::Engine;
use crate::storage::{JsonFileStore, KeyValueStore, MemoryStore};
use crate::visibility::VisibilityStore;
use action::Action;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use state::AppState;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Timeline shown when no fixture path is given.
pub const DEMO_FIXTURE: &str = include_str!("../../fixtures/pull_request.json");

/// Sends logs to `gtf.log` in the data dir; the terminal belongs to the UI.
fn init_logging() {
    let Some(dir) = JsonFileStore::data_dir() else {
        return;
    };
    let _ = fs::create_dir_all(&dir);
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("gtf.log"))
    else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn open_backend(config: &Config) -> Box<dyn KeyValueStore> {
    match JsonFileStore::open(&config.namespace) {
        Some(store) => Box::new(store),
        None => {
            tracing::warn!("no data directory, preferences will not survive a restart");
            Box::new(MemoryStore::new())
        }
    }
}

pub fn run(fixture: Option<&Path>) -> Result<()> {
    init_logging();
    let config = Config::load()?;

    let json = match fixture {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?,
        None => DEMO_FIXTURE.to_string(),
    };
    let mut tree = Tree::from_json(&json).context("parsing fixture")?;

    // The preference is loaded before anything is classified.
    let store = VisibilityStore::load(open_backend(&config), &config.storage_key);
    let engine = Engine::start(&mut tree, store, config.profiles(), config.engine_options());
    // Only the panel insertion is queued at this point, and that change is ours.
    let _ = tree.take_records();
    let mut app_state = AppState::new(tree, engine);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app_state);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app_state: &mut AppState<S>,
) -> Result<()> {
    loop {
        terminal.draw(|f| view::draw(f, app_state))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(action) = Action::from_key(key.code)
            && !app_state.apply(action)
        {
            return Ok(());
        }
    }
}
