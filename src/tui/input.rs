use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::auth::session::SessionState;
use crate::sync::refresh::RefreshTrigger;

use super::app::{App, Mode};

/// Route a key press to the active surface.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.session.state() {
        SessionState::Booting => handle_booting_key(app, key),
        SessionState::Unauthenticated { .. } | SessionState::Authenticating => {
            handle_signin_key(app, key)
        }
        SessionState::Authenticated { .. } => match app.mode {
            Mode::Navigate => handle_navigate_key(app, key),
            Mode::Search => handle_search_key(app, key),
        },
    }
}

fn handle_booting_key(app: &mut App, key: KeyEvent) {
    if let KeyCode::Char('q') = key.code {
        app.should_quit = true;
    }
}

fn handle_signin_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('s') | KeyCode::Enter => app.session.sign_in(),
        _ => {}
    }
}

fn handle_navigate_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => move_cursor(app, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(app, -1),
        KeyCode::Char('g') | KeyCode::Home => app.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => {
            let len = app.flat_items().len();
            app.cursor = len.saturating_sub(1);
        }
        KeyCode::Char('h') | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Tab => {
            app.toggle_collapsed();
        }
        KeyCode::Char('r') => app.trigger_refresh(RefreshTrigger::Manual),
        KeyCode::Char('S') => app.sign_out(),
        KeyCode::Char('/') => {
            app.mode = Mode::Search;
            app.search_input.clear();
        }
        KeyCode::Char('n') => app.jump_to_match(true),
        KeyCode::Char('N') => app.jump_to_match(false),
        KeyCode::Esc => app.last_search = None,
        _ => {}
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.mode = Mode::Navigate;
            app.search_input.clear();
        }
        KeyCode::Enter => {
            if !app.search_input.is_empty() {
                app.last_search = Some(app.search_input.clone());
            }
            app.mode = Mode::Navigate;
            app.search_input.clear();
            app.jump_to_match(true);
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => app.search_input.push(c),
        _ => {}
    }
}

fn move_cursor(app: &mut App, delta: isize) {
    let len = app.flat_items().len();
    if len == 0 {
        return;
    }
    let cursor = app.cursor as isize + delta;
    app.cursor = cursor.clamp(0, len as isize - 1) as usize;
}
