use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;
use crate::util::unicode;

/// Render the banner row. A feed failure stays up until the next good
/// push and wins over the transient message.
pub fn render_banner(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let line = if let Some(err) = &app.feed_error {
        let text = unicode::fit_to_width(&format!(" \u{26A0} 無法載入任務：{}", err), width);
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(app.theme.text_bright)
                .bg(app.theme.alert_bg)
                .add_modifier(Modifier::BOLD),
        ))
    } else if let Some(flash) = &app.flash {
        let color = if flash.error {
            app.theme.red
        } else {
            app.theme.green
        };
        Line::from(Span::styled(
            unicode::truncate_to_width(&format!(" {}", flash.text), width),
            Style::default().fg(color).bg(bg),
        ))
    } else {
        Line::from("")
    };

    frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
}
