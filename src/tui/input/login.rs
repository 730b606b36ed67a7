use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::App;

use super::*;

pub(super) fn handle_login(app: &mut App, key: KeyEvent) {
    let Some(login) = &mut app.login else {
        app.cancel_login();
        return;
    };
    match key.code {
        KeyCode::Esc => app.cancel_login(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
            login.on_password = !login.on_password;
        }
        KeyCode::Enter if !login.on_password => login.on_password = true,
        KeyCode::Enter => app.submit_login(),
        _ => {
            let input = if login.on_password {
                &mut login.password
            } else {
                &mut login.email
            };
            edit_text(input, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::common::keys::*;
    use super::super::handle_key;
    use crate::model::Role;
    use crate::tui::app::Mode;
    use crate::tui::test_helpers::*;
    use crossterm::event::KeyCode;

    #[test]
    fn test_enter_moves_to_password_then_signs_in() {
        let mut h = Harness::new(None);
        handle_key(&mut h.app, shift('l'));
        typed(&mut h.app, ADMIN_EMAIL);
        handle_key(&mut h.app, press(KeyCode::Enter));
        assert!(h.app.login.as_ref().unwrap().on_password);
        typed(&mut h.app, PASSWORD);
        handle_key(&mut h.app, press(KeyCode::Enter));

        assert_eq!(h.app.mode, Mode::Navigate);
        let actor = h.app.actor.as_ref().unwrap();
        assert_eq!(actor.role, Role::Admin);
        assert_eq!(h.flash_text().as_deref(), Some("已登入：boss@example.com"));
    }

    #[test]
    fn test_letters_are_typed_not_bound() {
        let mut h = Harness::new(None);
        handle_key(&mut h.app, shift('l'));
        typed(&mut h.app, "qn?");
        assert_eq!(h.app.mode, Mode::Login);
        assert!(!h.app.should_quit);
        assert_eq!(h.app.login.as_ref().unwrap().email.text, "qn?");
        handle_key(&mut h.app, press(KeyCode::Esc));
        assert!(h.app.login.is_none());
    }
}
