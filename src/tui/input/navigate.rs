use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::App;

use super::*;

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::PageDown => app.move_cursor(10),
        KeyCode::PageUp => app.move_cursor(-10),
        KeyCode::Char('g') | KeyCode::Home => app.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => app.move_cursor(isize::MAX),
        KeyCode::Char('h') | KeyCode::Left => app.move_column(-1),
        KeyCode::Char('l') | KeyCode::Right => app.move_column(1),
        KeyCode::Tab => app.cycle_tab(true),
        KeyCode::BackTab => app.cycle_tab(false),
        KeyCode::Char(c @ '1'..='9') => {
            let idx = c as usize - '1' as usize;
            app.select_tab_index(idx);
        }
        KeyCode::Enter => app.begin_quick_edit(),
        KeyCode::Char('x') => app.toggle_hide_finished(),
        KeyCode::Char('n') => app.open_create_form(),
        KeyCode::Char('e') => app.open_edit_form(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('v') => app.open_detail(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('L') => app.open_login(),
        KeyCode::Char('O') => app.sign_out(),
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Esc => app.dismiss(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

pub(super) fn handle_detail(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('v') | KeyCode::Enter => {
            app.close_detail()
        }
        KeyCode::Char('e') => {
            app.close_detail();
            app.open_edit_form();
        }
        _ => {}
    }
}

pub(super) fn handle_help(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
        app.toggle_help();
    }
}
