use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use regex::Regex;

use crate::auth::authorizer::Authorizer;
use crate::auth::oauth::GoogleAuthorizer;
use crate::auth::session::{SessionEvent, SessionManager, SessionState};
use crate::auth::store::{CredentialStore, FileCredentialStore};
use crate::io::config_io::{credential_path, load_config};
use crate::io::state::{UiState, read_ui_state, write_ui_state};
use crate::io::watcher::{CredentialEvent, CredentialWatcher};
use crate::model::config::AppConfig;
use crate::model::task::TaskNode;
use crate::remote::tasks_api::GoogleTasksSource;
use crate::sync::refresh::{RefreshController, RefreshEvent, RefreshTrigger};

use super::input;
use super::render;
use super::theme::Theme;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Search,
}

/// A flattened row in the visible task list
#[derive(Debug, Clone)]
pub struct FlatItem {
    /// Path through the tree: child indices at each nesting level
    pub path: Vec<usize>,
    pub depth: usize,
    pub has_children: bool,
    pub is_collapsed: bool,
}

/// Main application state
pub struct App {
    pub config: AppConfig,
    pub config_dir: PathBuf,
    pub theme: Theme,
    pub session: SessionManager,
    pub refresh: RefreshController,
    pub watcher: Option<CredentialWatcher>,
    pub mode: Mode,
    pub should_quit: bool,
    /// Cursor index into the flat visible items list
    pub cursor: usize,
    /// Scroll offset (first visible row)
    pub scroll_offset: usize,
    /// Task ids whose children are hidden
    pub collapsed: HashSet<String>,
    /// Search mode: current query being typed
    pub search_input: String,
    /// Last executed search pattern
    pub last_search: Option<String>,
    /// Last focus-triggered refresh, for the debounce
    last_focus_refresh: Option<Instant>,
}

impl App {
    pub fn new(config: AppConfig, config_dir: PathBuf) -> Self {
        let theme = Theme::from_config(&config.ui);
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(credential_path(&config_dir)));
        let authorizer: Arc<dyn Authorizer> =
            Arc::new(GoogleAuthorizer::new(config.google.clone()));
        let source = Arc::new(GoogleTasksSource::new(config.google.tasklist.clone()));

        let session = SessionManager::new(authorizer.clone(), store.clone());
        let refresh = RefreshController::new(source, authorizer, store);

        let watcher =
            match CredentialWatcher::start(&config_dir, credential_path(&config_dir)) {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::warn!(error = %e, "credential watcher unavailable");
                    None
                }
            };

        App {
            config,
            config_dir,
            theme,
            session,
            refresh,
            watcher,
            mode: Mode::Navigate,
            should_quit: false,
            cursor: 0,
            scroll_offset: 0,
            collapsed: HashSet::new(),
            search_input: String::new(),
            last_search: None,
            last_focus_refresh: None,
        }
    }

    pub fn signed_in(&self) -> bool {
        matches!(self.session.state(), SessionState::Authenticated { .. })
    }

    /// Start a refresh using the credential published right now.
    pub fn trigger_refresh(&mut self, trigger: RefreshTrigger) {
        let Some(credential) = self.session.credential().cloned() else {
            return;
        };
        self.refresh.refresh(trigger, &credential);
    }

    /// Window regained focus. Fires a refresh, debounced per config.
    pub fn on_focus_gained(&mut self) {
        if !self.signed_in() {
            return;
        }
        let debounce = Duration::from_millis(self.config.refresh.focus_debounce_ms);
        if let Some(last) = self.last_focus_refresh
            && !debounce.is_zero()
            && last.elapsed() < debounce
        {
            return;
        }
        self.last_focus_refresh = Some(Instant::now());
        self.trigger_refresh(RefreshTrigger::Focus);
    }

    pub fn sign_out(&mut self) {
        self.session.sign_out();
        self.refresh.reset();
        self.cursor = 0;
        self.scroll_offset = 0;
    }

    /// Apply background completions. Runs once per event-loop tick; every
    /// transition lands on this thread.
    pub fn tick(&mut self) {
        for event in self.session.poll() {
            match event {
                SessionEvent::Restored | SessionEvent::SignedIn => {
                    self.trigger_refresh(RefreshTrigger::Boot);
                }
                SessionEvent::RestoreFailed | SessionEvent::SignInFailed => {}
            }
        }

        for event in self.refresh.poll() {
            match event {
                RefreshEvent::Renewed(credential) => self.session.adopt_renewal(credential),
                RefreshEvent::SessionExpired(reason) => {
                    self.session.expire(&reason);
                    self.refresh.reset();
                }
                RefreshEvent::Published => self.clamp_cursor(),
                RefreshEvent::Failed => {}
            }
        }

        let credential_events: Vec<CredentialEvent> = self
            .watcher
            .as_ref()
            .map(|w| w.poll())
            .unwrap_or_default();
        for event in credential_events {
            match event {
                CredentialEvent::Changed => {
                    // another process signed in; pick the session up silently
                    if matches!(self.session.state(), SessionState::Unauthenticated { .. }) {
                        self.session.restore();
                    }
                }
                CredentialEvent::Removed => {
                    // another process signed out
                    if self.signed_in() {
                        self.sign_out();
                    }
                }
            }
        }
    }

    /// Build the flat list of visible rows from the published tree.
    pub fn flat_items(&self) -> Vec<FlatItem> {
        let Some(snapshot) = self.refresh.view().snapshot() else {
            return Vec::new();
        };
        let mut items = Vec::new();
        flatten(&snapshot.roots, 0, &[], &self.collapsed, &mut items);
        items
    }

    /// Keep the cursor inside the visible list after a tree swap.
    pub fn clamp_cursor(&mut self) {
        let len = self.flat_items().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    /// Toggle collapse on the node under the cursor.
    pub fn toggle_collapsed(&mut self) {
        let items = self.flat_items();
        let Some(item) = items.get(self.cursor) else {
            return;
        };
        if !item.has_children {
            return;
        }
        let Some(snapshot) = self.refresh.view().snapshot() else {
            return;
        };
        let Some(node) = node_at(&snapshot.roots, &item.path) else {
            return;
        };
        let id = node.id.clone();
        if !self.collapsed.remove(&id) {
            self.collapsed.insert(id);
        }
        self.clamp_cursor();
    }

    /// Get the active search regex for highlighting.
    /// In Search mode: compiles from current input. In Navigate: compiles
    /// from last_search.
    pub fn active_search_re(&self) -> Option<Regex> {
        let pattern = match self.mode {
            Mode::Search if !self.search_input.is_empty() => &self.search_input,
            Mode::Navigate => self.last_search.as_deref()?,
            _ => return None,
        };
        Regex::new(&format!("(?i){}", pattern))
            .or_else(|_| Regex::new(&format!("(?i){}", regex::escape(pattern))))
            .ok()
    }

    /// Move the cursor to the next/previous row whose title or notes match
    /// the active search.
    pub fn jump_to_match(&mut self, forward: bool) {
        let Some(re) = self.active_search_re() else {
            return;
        };
        let Some(snapshot) = self.refresh.view().snapshot().cloned() else {
            return;
        };
        let items = self.flat_items();
        if items.is_empty() {
            return;
        }
        let len = items.len();
        for step in 1..=len {
            let idx = if forward {
                (self.cursor + step) % len
            } else {
                (self.cursor + len - step) % len
            };
            if let Some(node) = node_at(&snapshot.roots, &items[idx].path)
                && (re.is_match(&node.title) || re.is_match(&node.notes))
            {
                self.cursor = idx;
                return;
            }
        }
    }
}

/// The node at a flat path, if still present in this snapshot.
pub fn node_at<'a>(roots: &'a [TaskNode], path: &[usize]) -> Option<&'a TaskNode> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.get(*first)?;
    for idx in rest {
        node = node.children.get(*idx)?;
    }
    Some(node)
}

/// Recursively flatten visible nodes, skipping collapsed subtrees.
fn flatten(
    nodes: &[TaskNode],
    depth: usize,
    parent_path: &[usize],
    collapsed: &HashSet<String>,
    items: &mut Vec<FlatItem>,
) {
    for (i, node) in nodes.iter().enumerate() {
        let mut path = parent_path.to_vec();
        path.push(i);
        let has_children = !node.children.is_empty();
        let is_collapsed = has_children && collapsed.contains(&node.id);
        items.push(FlatItem {
            path: path.clone(),
            depth,
            has_children,
            is_collapsed,
        });
        if has_children && !is_collapsed {
            flatten(&node.children, depth + 1, &path, collapsed, items);
        }
    }
}

/// Restore UI state from .state.json
pub fn restore_ui_state(app: &mut App) {
    let Some(state) = read_ui_state(&app.config_dir) else {
        return;
    };
    app.cursor = state.cursor;
    app.scroll_offset = state.scroll_offset;
    app.collapsed = state.collapsed;
    app.last_search = state.last_search;
}

/// Save UI state to .state.json
pub fn save_ui_state(app: &App) {
    let state = UiState {
        cursor: app.cursor,
        scroll_offset: app.scroll_offset,
        collapsed: app.collapsed.clone(),
        last_search: app.last_search.clone(),
    };
    let _ = write_ui_state(&app.config_dir, &state);
}

/// Run the TUI application
pub fn run(config_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_dir)?;

    let mut app = App::new(config, config_dir.to_path_buf());
    restore_ui_state(&mut app);

    // boot: silent session restore; success triggers the boot refresh
    app.session.restore();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableFocusChange);
        original_hook(panic_info);
    }));

    // Run event loop
    let result = run_event_loop(&mut terminal, &mut app);

    // Save UI state before exit
    save_ui_state(&app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableFocusChange)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key);
                }
                Event::FocusGained => app.on_focus_gained(),
                _ => {}
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
