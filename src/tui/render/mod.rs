pub mod banner;
pub mod detail_view;
pub mod form_view;
pub mod help_overlay;
pub mod popups;
pub mod status_row;
pub mod tab_bar;
pub mod task_table;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::Block;
use regex::Regex;

use crate::ops::search;

use super::app::{App, Mode};
use super::text_input::TextInput;

/// Main render function. Dispatches to sub-renderers.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: tab bar (2 rows) | banner | table | status row
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // tab bar + separator
            Constraint::Length(1), // banner
            Constraint::Min(1),    // task table
            Constraint::Length(1), // status row
        ])
        .split(area);

    tab_bar::render_tab_bar(frame, app, chunks[0]);
    banner::render_banner(frame, app, chunks[1]);
    task_table::render_task_table(frame, app, chunks[2]);

    // Overlays on top of the table
    match app.mode {
        Mode::Picker => popups::render_picker(frame, app, chunks[2]),
        Mode::Confirm => popups::render_confirm(frame, app, area),
        Mode::Login => popups::render_login(frame, app, area),
        Mode::Form => form_view::render_form(frame, app, area),
        Mode::Detail => detail_view::render_detail(frame, app, area),
        Mode::Help => help_overlay::render_help_overlay(frame, app, area),
        Mode::Navigate | Mode::DateInput | Mode::Search => {}
    }

    status_row::render_status_row(frame, app, chunks[3]);
}

/// Push spans for text with regex match highlighting. If no regex or no matches,
/// pushes a single span with `base_style`. Otherwise splits text at match boundaries.
pub(super) fn push_highlighted_spans<'a>(
    spans: &mut Vec<Span<'a>>,
    text: &str,
    base_style: Style,
    highlight_style: Style,
    search_re: Option<&Regex>,
) {
    let ranges = search_re.map(|re| search::find_matches(re, text)).unwrap_or_default();
    if ranges.is_empty() {
        spans.push(Span::styled(text.to_string(), base_style));
        return;
    }

    let mut last_end = 0;
    for range in ranges {
        if range.start > last_end {
            spans.push(Span::styled(text[last_end..range.start].to_string(), base_style));
        }
        spans.push(Span::styled(text[range.clone()].to_string(), highlight_style));
        last_end = range.end;
    }
    if last_end < text.len() {
        spans.push(Span::styled(text[last_end..].to_string(), base_style));
    }
}

/// Spans for an edit buffer with a block cursor at the insertion point
pub(super) fn input_spans(
    input: &TextInput,
    style: Style,
    cursor_style: Style,
) -> Vec<Span<'static>> {
    let text = input.text.as_str();
    let split = input.cursor.min(text.len());
    let (before, after) = if text.is_char_boundary(split) {
        text.split_at(split)
    } else {
        (text, "")
    };
    vec![
        Span::styled(before.to_string(), style),
        Span::styled("\u{258C}", cursor_style),
        Span::styled(after.to_string(), style),
    ]
}
