mod common;
mod confirm;
mod form;
mod login;
mod navigate;
mod quick_edit;
mod search;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mode};

// Import all submodule functions into this module's namespace
// so that submodules can access cross-module functions via `use super::*;`
#[allow(unused_imports)]
use common::*;
#[allow(unused_imports)]
use confirm::*;
#[allow(unused_imports)]
use form::*;
#[allow(unused_imports)]
use login::*;
#[allow(unused_imports)]
use navigate::*;
#[allow(unused_imports)]
use quick_edit::*;
#[allow(unused_imports)]
use search::*;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    let key = normalize_key(key);
    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::Picker => handle_picker(app, key),
        Mode::DateInput => handle_date_input(app, key),
        Mode::Form => handle_form(app, key),
        Mode::Confirm => handle_confirm(app, key),
        Mode::Login => handle_login(app, key),
        Mode::Detail => handle_detail(app, key),
        Mode::Search => handle_search(app, key),
        Mode::Help => handle_help(app, key),
    }
}

/// Handle a bracketed paste event. Goes into whichever text buffer has focus.
pub fn handle_paste(app: &mut App, text: &str) {
    if text.is_empty() {
        return;
    }
    let target = match app.mode {
        Mode::DateInput => app.date_input.as_mut(),
        Mode::Search => Some(&mut app.search_input),
        Mode::Form => app
            .form
            .as_mut()
            .filter(|f| !f.field().is_select())
            .map(|f| &mut f.input),
        Mode::Login => app.login.as_mut().map(|l| {
            if l.on_password {
                &mut l.password
            } else {
                &mut l.email
            }
        }),
        _ => None,
    };
    if let Some(input) = target {
        input.insert_str(text);
    }
}
