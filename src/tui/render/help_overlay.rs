use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;
use crate::util::unicode;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        " 瀏覽",
        &[
            (" \u{2191}\u{2193}/jk", "上下移動"),
            (" \u{2190}\u{2192}/hl", "切換欄位"),
            (" g/G", "跳到頂端/底部"),
            (" Tab/1-9", "切換負責人分頁"),
            (" x", "隱藏/顯示已完成與停止"),
            (" v", "任務詳情"),
            (" /", "搜尋標題"),
            (" Esc", "清除訊息/搜尋"),
        ],
    ),
    (
        " 編輯（需管理員）",
        &[
            (" Enter", "快速編輯目前欄位"),
            (" n", "新增任務"),
            (" e", "以表單編輯"),
            (" d", "刪除任務"),
        ],
    ),
    (
        " 帳號",
        &[(" L", "登入"), (" O", "登出")],
    ),
    (
        " 一般",
        &[(" ?", "顯示/隱藏說明"), (" q", "離開"), (" Ctrl+C", "立即離開")],
    ),
];

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let overlay_area = centered_rect(60, 80, area);
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = vec![Line::from(Span::styled(" 按鍵說明", header_style)), Line::from("")];
    for (title, bindings) in SECTIONS {
        lines.push(Line::from(Span::styled(*title, header_style)));
        for (key, desc) in *bindings {
            add_binding(&mut lines, key, desc, key_style, desc_style);
        }
        lines.push(Line::from(""));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg));
    frame.render_widget(paragraph, overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let padded_key = unicode::fit_to_width(key, 14);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}

/// Create a centered rectangle of the given percentage of the parent
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
