use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;
use crate::tui::text_input::TextInput;
use crate::util::unicode;

use super::input_spans;

/// Render the value picker for a quick-edit select cell
pub fn render_picker(frame: &mut Frame, app: &App, area: Rect) {
    let Some(picker) = &app.picker else {
        return;
    };
    let bg = app.theme.background;
    let widest = picker
        .options
        .iter()
        .map(|o| unicode::display_width(&o.label))
        .max()
        .unwrap_or(0)
        .max(unicode::display_width(picker.field.label()));
    let popup_w = ((widest + 6) as u16).min(area.width.saturating_sub(2));
    let inner_h = area.height.saturating_sub(4) as usize;
    let popup_h = (picker.options.len().min(inner_h) as u16) + 2;

    // Keep the highlighted option in view
    let skip = (picker.cursor + 1).saturating_sub(inner_h.max(1));
    let lines: Vec<Line> = picker
        .options
        .iter()
        .enumerate()
        .skip(skip)
        .take(inner_h.max(1))
        .map(|(i, option)| {
            let selected = i == picker.cursor;
            let style = if selected {
                Style::default()
                    .fg(app.theme.text_bright)
                    .bg(app.theme.selection_bg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.text).bg(bg)
            };
            let marker = if selected { "\u{25B8} " } else { "  " };
            let text = unicode::fit_to_width(&option.label, popup_w.saturating_sub(4) as usize);
            Line::from(Span::styled(format!("{}{}", marker, text), style))
        })
        .collect();

    let overlay = centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, overlay);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} ", picker.field.label()),
            Style::default().fg(app.theme.highlight).bg(bg),
        ))
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), overlay);
}

/// Render the delete confirmation
pub fn render_confirm(frame: &mut Frame, app: &App, area: Rect) {
    let Some(id) = &app.confirm_delete else {
        return;
    };
    let title = app
        .tasks
        .iter()
        .find(|t| &t.id == id)
        .map_or(id.as_str(), |t| t.title.as_str());

    let bg = app.theme.background;
    let popup_w: u16 = 44.min(area.width.saturating_sub(2));
    let inner_w = popup_w.saturating_sub(2) as usize;
    let header_style = Style::default()
        .fg(app.theme.red)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let text_style = Style::default().fg(app.theme.text).bg(bg);
    let bright_style = Style::default().fg(app.theme.text_bright).bg(bg);

    let mut styled_lines: Vec<(String, Style)> = vec![
        (" 刪除任務".into(), header_style),
        (String::new(), text_style),
    ];
    for s in wrap_text("   ", &format!("\u{201c}{}\u{201d}", title), inner_w) {
        styled_lines.push((s, bright_style));
    }
    styled_lines.push((String::new(), text_style));
    for s in wrap_text(" ", "確定要刪除這筆任務嗎？此操作無法復原。 (y/n)", inner_w) {
        styled_lines.push((s, text_style));
    }

    let popup_h = ((styled_lines.len() as u16) + 2).min(area.height.saturating_sub(2));
    let overlay = centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, overlay);

    let lines: Vec<Line> = styled_lines
        .into_iter()
        .map(|(text, style)| Line::from(Span::styled(text, style)))
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.red).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), overlay);
}

/// Render the sign-in dialog
pub fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let Some(login) = &app.login else {
        return;
    };
    let bg = app.theme.background;
    let popup_w: u16 = 48.min(area.width.saturating_sub(2));
    let inner_w = popup_w.saturating_sub(2) as usize;
    let label_style = Style::default().fg(app.theme.dim).bg(bg);
    let value_style = Style::default().fg(app.theme.text_bright).bg(bg);
    let cursor_style = Style::default().fg(app.theme.highlight).bg(bg);

    let masked = TextInput {
        text: login.password.masked(),
        cursor: login.password.text[..login.password.cursor].chars().count(),
    };
    let field = |label: &str, input: &TextInput, focused: bool| -> Line<'static> {
        let mut spans = vec![Span::styled(format!(" {:<4}", label), label_style)];
        if focused {
            spans.extend(input_spans(input, value_style, cursor_style));
        } else {
            spans.push(Span::styled(input.text.clone(), value_style));
        }
        Line::from(spans)
    };

    let mut lines = vec![
        Line::from(""),
        field("帳號", &login.email, !login.on_password),
        field("密碼", &masked, login.on_password),
        Line::from(""),
    ];
    if let Some(err) = &login.error {
        for s in wrap_text(" ", err, inner_w) {
            lines.push(Line::from(Span::styled(s, Style::default().fg(app.theme.red).bg(bg))));
        }
    }

    let popup_h = ((lines.len() as u16) + 2).min(area.height.saturating_sub(2));
    let overlay = centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, overlay);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            " 登入 ",
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), overlay);
}

/// Wrap `text` into lines of at most `max_width` terminal cells. Breaks
/// at spaces when it can and between characters otherwise, since CJK text
/// has no spaces. Every line is prefixed with `indent`.
pub(super) fn wrap_text(indent: &str, text: &str, max_width: usize) -> Vec<String> {
    let indent_w = unicode::display_width(indent);
    let avail = max_width.saturating_sub(indent_w).max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_w = 0;

    for word in text.split_inclusive(' ') {
        let word_w = unicode::display_width(word.trim_end());
        if current_w > 0 && current_w + word_w > avail {
            lines.push(format!("{}{}", indent, current.trim_end()));
            current.clear();
            current_w = 0;
        }
        for c in word.chars() {
            let cw = unicode::display_width(c.encode_utf8(&mut [0; 4]));
            if current_w + cw > avail && c != ' ' {
                lines.push(format!("{}{}", indent, current.trim_end()));
                current.clear();
                current_w = 0;
            }
            current.push(c);
            current_w += cw;
        }
    }
    if !current.trim_end().is_empty() || lines.is_empty() {
        lines.push(format!("{}{}", indent, current.trim_end()));
    }
    lines
}

pub(super) fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::tui::test_helpers::*;

    #[test]
    fn test_wrap_breaks_words_and_cjk() {
        assert_eq!(wrap_text(" ", "alpha beta gamma", 12), vec![" alpha beta", " gamma"]);
        let lines = wrap_text("", "確定要刪除這筆任務嗎", 8);
        assert_eq!(lines, vec!["確定要刪", "除這筆任", "務嗎"]);
        assert_eq!(wrap_text(" ", "", 10), vec![" "]);
    }

    #[test]
    fn test_picker_lists_options_with_current_highlighted() {
        let mut h = Harness::new(Some(Role::Admin));
        h.app.begin_quick_edit();
        let out = h.render();
        assert!(out.contains("優先級"));
        assert!(out.contains("\u{25B8} 一般"));
        assert!(out.contains("緊急"));
    }

    #[test]
    fn test_confirm_names_the_task() {
        let mut h = Harness::new(Some(Role::Admin));
        h.app.request_delete();
        let out = h.render();
        assert!(out.contains("刪除任務"));
        assert!(out.contains("\u{201c}Ship release\u{201d}"));
        assert!(out.contains("(y/n)"));
    }

    #[test]
    fn test_login_masks_password_and_shows_error() {
        let mut h = Harness::new(None);
        h.app.open_login();
        let login = h.app.login.as_mut().unwrap();
        login.email.set(ADMIN_EMAIL);
        login.password.set("nope");
        login.on_password = true;
        let out = h.render();
        assert!(out.contains(ADMIN_EMAIL));
        assert!(out.contains("****"));
        assert!(!out.contains("nope"));

        h.app.submit_login();
        let out = h.render();
        assert!(h.app.login.as_ref().unwrap().error.is_some());
        assert!(out.contains("登入"));
    }
}
