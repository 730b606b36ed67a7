use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::App;

use super::*;

/// Keys while a select cell's picker is open
pub(super) fn handle_picker(app: &mut App, key: KeyEvent) {
    let Some(picker) = &mut app.picker else {
        app.cancel_quick_edit();
        return;
    };
    let last = picker.options.len().saturating_sub(1);
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => picker.cursor = (picker.cursor + 1).min(last),
        KeyCode::Char('k') | KeyCode::Up => picker.cursor = picker.cursor.saturating_sub(1),
        KeyCode::Char('g') | KeyCode::Home => picker.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => picker.cursor = last,
        KeyCode::Enter => app.commit_picker(),
        KeyCode::Esc | KeyCode::Char('q') => app.cancel_quick_edit(),
        _ => {}
    }
}

/// Keys while typing into a date cell
pub(super) fn handle_date_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.commit_date_input(),
        KeyCode::Esc => app.cancel_quick_edit(),
        _ => {
            if let Some(input) = &mut app.date_input {
                edit_text(input, key);
            }
        }
    }
}
