use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::App;

use super::*;

pub(super) fn handle_search(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.execute_search(),
        KeyCode::Up => app.browse_history(true),
        KeyCode::Down => app.browse_history(false),
        // Backspace on an empty prompt leaves search, like vim
        KeyCode::Backspace if app.search_input.is_empty() => app.cancel_search(),
        _ => {
            edit_text(&mut app.search_input, key);
        }
    }
}
