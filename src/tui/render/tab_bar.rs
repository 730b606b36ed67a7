use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::Role;
use crate::tui::app::App;
use crate::util::unicode;

/// Render the title bar: app title, assignee tabs, signed-in user, with
/// a separator line below
pub fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Length(1), // separator
        ])
        .split(area);

    let sep_cols = render_tabs(frame, app, chunks[0]);
    render_separator(frame, app, chunks[1], &sep_cols);
}

fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| unicode::display_width(&s.content)).sum()
}

/// Render tabs and return the column positions of each separator character.
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) -> Vec<usize> {
    let bg = app.theme.background;
    let bg_style = Style::default().bg(bg);
    let mut spans: Vec<Span> = Vec::new();
    let mut sep_cols: Vec<usize> = Vec::new();
    let sep = Span::styled("\u{2502}", Style::default().fg(app.theme.dim).bg(bg));

    spans.push(Span::styled(" ", bg_style));
    spans.push(Span::styled("\u{25B6}", Style::default().fg(app.theme.purple).bg(bg)));
    spans.push(Span::styled(
        format!(" {} ", app.config.app.title),
        Style::default()
            .fg(app.theme.text_bright)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    ));
    sep_cols.push(spans_width(&spans));
    spans.push(sep.clone());

    for (i, tab) in app.tabs().iter().enumerate() {
        let is_current = *tab == app.ui.view.active_tab;
        let label = app.tab_label(tab);
        let text = if i < 9 {
            format!(" {}:{} ", i + 1, label)
        } else {
            format!(" {} ", label)
        };
        spans.push(Span::styled(text, tab_style(app, is_current)));
        sep_cols.push(spans_width(&spans));
        spans.push(sep.clone());
    }

    // Signed-in user, right-aligned
    let user = match &app.actor {
        Some(actor) => {
            let role = match actor.role {
                Role::Admin => "管理員",
                Role::Viewer => "檢視者",
            };
            format!("{} ({}) ", actor.label(), role)
        }
        None => "未登入 ".to_string(),
    };
    let used = spans_width(&spans);
    let user_w = unicode::display_width(&user);
    let width = area.width as usize;
    if used + user_w < width {
        spans.push(Span::styled(" ".repeat(width - used - user_w), bg_style));
        let user_color = if app.actor.is_some() {
            app.theme.cyan
        } else {
            app.theme.dim
        };
        spans.push(Span::styled(user, Style::default().fg(user_color).bg(bg)));
    }

    let tabs = Paragraph::new(Line::from(spans)).style(bg_style);
    frame.render_widget(tabs, area);
    sep_cols
}

fn render_separator(frame: &mut Frame, app: &App, area: Rect, sep_cols: &[usize]) {
    let width = area.width as usize;
    let bg = app.theme.background;
    let dim = app.theme.dim;

    let indicator = app.ui.view.hide_completed_and_stopped.then_some("隱藏已完成/停止");
    let indicator_w = indicator.map_or(0, |s| unicode::display_width(s) + 2);
    let separator_end = width.saturating_sub(indicator_w);

    let mut sep_text = String::with_capacity(separator_end * 3);
    for col in 0..separator_end {
        if sep_cols.contains(&col) {
            sep_text.push('\u{2534}');
        } else {
            sep_text.push('\u{2500}');
        }
    }
    let mut spans = vec![Span::styled(sep_text, Style::default().fg(dim).bg(bg))];
    if let Some(text) = indicator {
        spans.push(Span::styled(" ", Style::default().bg(bg)));
        spans.push(Span::styled(text, Style::default().fg(app.theme.yellow).bg(bg)));
        spans.push(Span::styled(" ", Style::default().bg(bg)));
    }

    let sep_widget = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(sep_widget, area);
}

/// Style for a tab: highlighted if current, normal otherwise
fn tab_style(app: &App, is_current: bool) -> Style {
    if is_current {
        Style::default()
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text).bg(app.theme.background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::test_helpers::*;

    fn render(app: &App) -> String {
        render_to_string(TERM_W, 2, |frame, area| render_tab_bar(frame, app, area))
    }

    #[test]
    fn test_tabs_follow_roster_and_show_user() {
        let h = Harness::new(Some(Role::Admin));
        let out = render(&h.app);
        let first = out.lines().next().unwrap();
        assert!(first.contains("1:全部"));
        assert!(first.contains("2:Amy"));
        assert!(first.contains("3:Bo"));
        assert!(first.contains("4:未分配"));
        assert!(first.contains("boss@example.com (管理員)"));
        let (amy, bo) = (first.find("Amy").unwrap(), first.find("Bo ").unwrap());
        assert!(amy < bo);
    }

    #[test]
    fn test_anonymous_and_hidden_indicator() {
        let mut h = Harness::new(None);
        h.app.toggle_hide_finished();
        let out = render(&h.app);
        assert!(out.contains("未登入"));
        assert!(out.contains("隱藏已完成/停止"));
    }
}
