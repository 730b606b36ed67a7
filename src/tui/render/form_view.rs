use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::ops::lookup;
use crate::ops::task_ops::DraftField;
use crate::tui::app::{App, FormState};
use crate::util::unicode;

use super::input_spans;
use super::popups::{centered_rect_fixed, wrap_text};

const LABEL_W: usize = 10;

/// Display value of a select field
fn select_value(app: &App, form: &FormState, field: DraftField) -> String {
    let draft = &form.draft;
    match field.ref_kind() {
        Some(kind) => lookup::ref_name(&app.refs, kind, draft.text(field)).to_string(),
        None => lookup::assignee_label(&app.members, draft.assignee_id.as_deref()).to_string(),
    }
}

/// Render the create/edit form
pub fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let Some(form) = &app.form else {
        return;
    };
    let bg = app.theme.background;
    let popup_w: u16 = 72.min(area.width.saturating_sub(2));
    let inner_w = popup_w.saturating_sub(2) as usize;
    let value_w = inner_w.saturating_sub(LABEL_W + 3);

    let label_style = Style::default().fg(app.theme.dim).bg(bg);
    let focus_label = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let value_style = Style::default().fg(app.theme.text).bg(bg);
    let focus_value = Style::default().fg(app.theme.text_bright).bg(app.theme.cell_bg);
    let cursor_style = Style::default().fg(app.theme.highlight).bg(app.theme.cell_bg);

    let mut lines: Vec<Line> = vec![Line::from("")];
    for (i, field) in DraftField::ALL.into_iter().enumerate() {
        let focused = i == form.focus;
        let marker = if focused { "\u{25B8}" } else { " " };
        let required = if field == DraftField::Title { "*" } else { "" };
        let label = unicode::fit_to_width(&format!("{}{}", field.label(), required), LABEL_W);
        let mut spans = vec![Span::styled(
            format!("{} {} ", marker, label),
            if focused { focus_label } else { label_style },
        )];

        if field.is_select() {
            let value = select_value(app, form, field);
            let text = if focused {
                format!("< {} >", value)
            } else {
                value
            };
            let style = if focused { focus_value } else { value_style };
            spans.push(Span::styled(unicode::truncate_to_width(&text, value_w), style));
        } else if focused {
            spans.extend(input_spans(&form.input, focus_value, cursor_style));
        } else {
            let text = form.draft.text(field);
            let is_date = matches!(field, DraftField::StartDate | DraftField::DueDate);
            let shown = if text.is_empty() && is_date {
                "YYYY-MM-DD".to_string()
            } else {
                unicode::truncate_to_width(text, value_w)
            };
            let style = if text.is_empty() { label_style } else { value_style };
            spans.push(Span::styled(shown, style));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    if let Some(err) = &form.error {
        for s in wrap_text(" ", err, inner_w) {
            lines.push(Line::from(Span::styled(
                s,
                Style::default().fg(app.theme.red).bg(bg),
            )));
        }
    }

    let title = if form.draft.is_new() {
        " 新增任務 "
    } else {
        " 編輯任務 "
    };
    let popup_h = ((lines.len() as u16) + 2).min(area.height.saturating_sub(2));
    let overlay = centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, overlay);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            title,
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), overlay);
}

#[cfg(test)]
mod tests {
    use crate::model::Role;
    use crate::tui::test_helpers::*;

    #[test]
    fn test_create_form_shows_defaults() {
        let mut h = Harness::new(Some(Role::Admin));
        h.app.open_create_form();
        let out = h.render_sized(120, 30);
        assert!(out.contains("新增任務"));
        assert!(out.contains("標題*"));
        assert!(out.contains("一般"));
        assert!(out.contains("待安排"));
        assert!(out.contains("XQ"));
        assert!(out.contains("規格"));
    }

    #[test]
    fn test_focused_select_shows_arrows() {
        let mut h = Harness::new(Some(Role::Admin));
        h.select("t-bo-1");
        h.app.open_edit_form();
        let form = h.app.form.as_mut().unwrap();
        for _ in 0..3 {
            form.focus_step(true);
        }
        let out = h.render_sized(120, 30);
        assert!(out.contains("編輯任務"));
        assert!(out.contains("< Bo >"));
        assert!(out.contains("Write docs"));
    }

    #[test]
    fn test_error_line_appears_under_fields() {
        let mut h = Harness::new(Some(Role::Admin));
        h.app.open_create_form();
        h.app.submit_form();
        let out = h.render_sized(120, 30);
        assert!(out.contains("標題為必填欄位。"));
    }
}
