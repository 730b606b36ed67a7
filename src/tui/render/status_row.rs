use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::unicode;

use super::input_spans;

/// Key hints shown at the right of the status row in each mode
fn hint(app: &App) -> &'static str {
    match app.mode {
        Mode::Navigate if app.ui.last_search.is_some() => "/ 新搜尋  Esc 清除",
        Mode::Navigate if app.actor.is_some() => {
            "Enter 編輯  n 新增  e 表單  d 刪除  / 搜尋  ? 說明  q 離開"
        }
        Mode::Navigate => "L 登入  v 詳情  / 搜尋  ? 說明  q 離開",
        Mode::Picker => "\u{2191}\u{2193} 選擇  Enter 確定  Esc 取消",
        Mode::DateInput => "YYYY-MM-DD，空白清除  Enter 確定  Esc 取消",
        Mode::Form => "Tab 下一欄  \u{2190}\u{2192} 切換選項  Ctrl+S 儲存  Esc 取消",
        Mode::Confirm => "y 確定  n 取消",
        Mode::Login => "Tab 切換欄位  Enter 登入  Esc 取消",
        Mode::Detail => "e 編輯  Esc 關閉",
        Mode::Search => "\u{2191}\u{2193} 歷史  Enter 搜尋  Esc 取消",
        Mode::Help => "? 或 Esc 關閉",
    }
}

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let prompt_style = Style::default().fg(app.theme.text_bright).bg(bg);
    let cursor_style = Style::default().fg(app.theme.highlight).bg(bg);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);

    let mut spans: Vec<Span> = match (app.mode, &app.date_input) {
        (Mode::Search, _) => {
            let mut spans = vec![Span::styled("/", prompt_style)];
            spans.extend(input_spans(&app.search_input, prompt_style, cursor_style));
            spans
        }
        (Mode::DateInput, Some(input)) => {
            let label = app
                .ui
                .view
                .editing
                .editing_field()
                .map_or("", |f| f.label());
            let mut spans = vec![Span::styled(format!(" {}: ", label), prompt_style)];
            spans.extend(input_spans(input, prompt_style, cursor_style));
            spans
        }
        (Mode::Navigate, _) => match &app.ui.last_search {
            Some(pattern) => vec![Span::styled(format!("/{}", pattern), dim_style)],
            None => Vec::new(),
        },
        _ => Vec::new(),
    };

    let hint = hint(app);
    let used: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
    let hint_w = unicode::display_width(hint);
    if used + hint_w < width {
        spans.push(Span::styled(" ".repeat(width - used - hint_w), Style::default().bg(bg)));
        spans.push(Span::styled(hint, dim_style));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
