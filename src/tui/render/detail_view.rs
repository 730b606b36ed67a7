use chrono::{DateTime, Local, Utc};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::ops::lookup;
use crate::tui::app::App;
use crate::util::unicode;

use super::popups::{centered_rect_fixed, wrap_text};

const LABEL_W: usize = 10;

fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| lookup::FALLBACK_NAME.to_string())
}

/// Render the read-only detail popup for one task
pub fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);
    let text_style = Style::default().fg(app.theme.text).bg(bg);
    let popup_w: u16 = 76.min(area.width.saturating_sub(2));
    let inner_w = popup_w.saturating_sub(2) as usize;

    let Some(task) = app.detail_task() else {
        // Deleted while open
        let overlay = centered_rect_fixed(popup_w, 3, area);
        frame.render_widget(Clear, overlay);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(dim_style)
            .style(Style::default().bg(bg));
        frame.render_widget(Paragraph::new(" 任務已不存在").style(dim_style).block(block), overlay);
        return;
    };

    let overdue = lookup::is_overdue(task, &app.refs, &app.rules.ordering, app.today);
    let priority_style = Style::default()
        .fg(app.theme.class_color(lookup::priority_class(&app.refs, &task.priority)))
        .bg(bg);
    let status_style = Style::default()
        .fg(app.theme.class_color(lookup::status_class(&app.refs, &task.status)))
        .bg(bg);
    let due_style = if overdue {
        Style::default()
            .fg(app.theme.red)
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    } else {
        text_style
    };

    let mut lines: Vec<Line> = vec![Line::from("")];
    for s in wrap_text(" ", &task.title, inner_w) {
        lines.push(Line::from(Span::styled(
            s,
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));

    let row = |label: &str, value: String, style: Style| -> Line<'static> {
        Line::from(vec![
            Span::styled(format!(" {}", unicode::fit_to_width(label, LABEL_W)), dim_style),
            Span::styled(value, style),
        ])
    };
    let mut due = lookup::format_date(task.due_date);
    if overdue {
        due.push_str("（逾期）");
    }
    lines.push(row(
        "負責人",
        lookup::assignee_label(&app.members, task.assignee_id.as_deref()).to_string(),
        text_style,
    ));
    lines.push(row("優先級", lookup::priority_name(&app.refs, &task.priority).to_string(), priority_style));
    lines.push(row("狀態", lookup::status_name(&app.refs, &task.status).to_string(), status_style));
    lines.push(row("開始日期", lookup::format_date(task.start_date), text_style));
    lines.push(row("截止日期", due, due_style));
    lines.push(row("產品", lookup::product_name(&app.refs, &task.product).to_string(), text_style));
    lines.push(row("任務類型", lookup::task_type_name(&app.refs, &task.task_type).to_string(), text_style));
    if let Some(url) = &task.git_issue_url {
        lines.push(row("Git Issue", url.clone(), Style::default().fg(app.theme.cyan).bg(bg)));
    }

    for (label, body) in [("描述", &task.description), ("備註", &task.notes)] {
        let Some(body) = body.as_deref().filter(|b| !b.trim().is_empty()) else {
            continue;
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", label), dim_style)));
        for paragraph in body.lines() {
            for s in wrap_text("   ", paragraph, inner_w) {
                lines.push(Line::from(Span::styled(s, text_style)));
            }
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            " 建立 {}  更新 {}",
            timestamp(task.created_at),
            timestamp(task.updated_at)
        ),
        dim_style,
    )));

    let popup_h = ((lines.len() as u16) + 2).min(area.height.saturating_sub(2));
    let overlay = centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, overlay);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" 任務詳情 ", Style::default().fg(app.theme.highlight).bg(bg)))
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), overlay);
}
