use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::App;

use super::*;

pub(super) fn handle_form(app: &mut App, key: KeyEvent) {
    let Some(form) = &mut app.form else {
        app.cancel_form();
        return;
    };
    let on_select = form.field().is_select();
    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => app.cancel_form(),
        (KeyModifiers::CONTROL, KeyCode::Char('s')) | (_, KeyCode::Enter) => app.submit_form(),
        (_, KeyCode::Tab) | (_, KeyCode::Down) => form.focus_step(true),
        (_, KeyCode::BackTab) | (_, KeyCode::Up) => form.focus_step(false),
        (_, KeyCode::Left) if on_select => app.cycle_form_field(false),
        (_, KeyCode::Right) | (_, KeyCode::Char(' ')) if on_select => app.cycle_form_field(true),
        _ if on_select => {}
        _ => {
            edit_text(&mut form.input, key);
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
    fn test_type_title_pick_assignee_and_save() {
        let mut h = Harness::new(Some(Role::Admin));
        handle_key(&mut h.app, ch('n'));
        assert_eq!(h.app.mode, Mode::Form);
        typed(&mut h.app, "Plan sprint");
        // Title -> Description -> Git Issue -> Assignee
        for _ in 0..3 {
            handle_key(&mut h.app, press(KeyCode::Tab));
        }
        handle_key(&mut h.app, press(KeyCode::Right));
        handle_key(&mut h.app, press(KeyCode::Right));
        handle_key(&mut h.app, press(KeyCode::Tab));
        typed(&mut h.app, "2025-04-02");
        handle_key(&mut h.app, ctrl('s'));

        assert_eq!(h.app.mode, Mode::Navigate);
        assert_eq!(h.store.create_calls(), 1);
        let created = h
            .store
            .tasks()
            .into_iter()
            .find(|t| t.title == "Plan sprint")
            .unwrap();
        assert_eq!(created.assignee_id.as_deref(), Some("m2"));
        assert_eq!(created.start_date, date(2025, 4, 2));
        assert_eq!(created.priority, "p-normal");
        assert_eq!(created.status, "s-todo");
    }

    #[test]
    fn test_letters_on_a_select_field_do_nothing() {
        let mut h = Harness::new(Some(Role::Admin));
        h.select("t-bo-1");
        handle_key(&mut h.app, ch('e'));
        for _ in 0..6 {
            handle_key(&mut h.app, press(KeyCode::Tab));
        }
        handle_key(&mut h.app, ch('x'));
        let form = h.app.form.as_ref().unwrap();
        assert_eq!(form.draft.priority, "p-high");
        handle_key(&mut h.app, press(KeyCode::Left));
        assert_eq!(h.app.form.as_ref().unwrap().draft.priority, "p-urgent");
    }

    #[test]
    fn test_escape_discards_the_form() {
        let mut h = Harness::new(Some(Role::Admin));
        handle_key(&mut h.app, ch('n'));
        typed(&mut h.app, "Throwaway");
        handle_key(&mut h.app, press(KeyCode::Esc));
        assert_eq!(h.app.mode, Mode::Navigate);
        assert!(h.app.form.is_none());
        assert_eq!(h.store.create_calls(), 0);
    }

    #[test]
    fn test_enter_with_empty_title_shows_error() {
        let mut h = Harness::new(Some(Role::Admin));
        handle_key(&mut h.app, ch('n'));
        handle_key(&mut h.app, press(KeyCode::Enter));
        assert_eq!(h.app.mode, Mode::Form);
        assert_eq!(
            h.app.form.as_ref().unwrap().error.as_deref(),
            Some("標題為必填欄位。")
        );
    }
}
