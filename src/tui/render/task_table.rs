use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use regex::Regex;

use crate::model::Task;
use crate::ops::lookup;
use crate::ops::quick_edit::QuickField;
use crate::ops::view::{AssigneeTab, EMPTY_MESSAGE};
use crate::tui::app::{App, Mode};
use crate::util::unicode;

use super::push_highlighted_spans;

const GAP: &str = " ";
const MARKER_W: usize = 2;
const TITLE_HEADER: &str = "標題";
const NOTES_HEADER: &str = "備註";

/// Columns between title and notes: header and cell width
const FIXED: [(&str, usize); 7] = [
    ("優先級", 6),
    ("負責人", 8),
    ("狀態", 8),
    ("開始日期", 10),
    ("截止日期", 10),
    ("產品", 6),
    ("任務類型", 8),
];

/// Column widths for a given terminal width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub title: usize,
    pub notes: usize,
}

impl ColumnLayout {
    pub fn new(width: usize) -> Self {
        let fixed: usize = FIXED.iter().map(|(_, w)| w + GAP.len()).sum();
        let rest = width.saturating_sub(MARKER_W + fixed + GAP.len());
        let title = (rest * 2 / 3).max(rest.min(12));
        ColumnLayout {
            title,
            notes: rest - title,
        }
    }
}

/// Render the task table: header, then group headings and task rows
pub fn render_task_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);

    if app.loading {
        frame.render_widget(Paragraph::new(" 載入中\u{2026}").style(dim_style), area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    let layout = ColumnLayout::new(area.width as usize);
    frame.render_widget(
        Paragraph::new(header_line(app, &layout)).style(Style::default().bg(bg)),
        chunks[0],
    );

    let (lines, cursor_line) = build_rows(app, &layout);
    if lines.is_empty() {
        frame.render_widget(
            Paragraph::new(format!(" {}", EMPTY_MESSAGE)).style(dim_style),
            chunks[1],
        );
        return;
    }

    let height = chunks[1].height as usize;
    if cursor_line < app.scroll {
        app.scroll = cursor_line;
    } else if height > 0 && cursor_line >= app.scroll + height {
        app.scroll = cursor_line + 1 - height;
    }
    let visible: Vec<Line> = lines.into_iter().skip(app.scroll).take(height).collect();
    frame.render_widget(Paragraph::new(visible).style(Style::default().bg(bg)), chunks[1]);
}

fn header_line(app: &App, layout: &ColumnLayout) -> Line<'static> {
    let style = Style::default()
        .fg(app.theme.dim)
        .bg(app.theme.background)
        .add_modifier(Modifier::BOLD);
    let mut text = " ".repeat(MARKER_W);
    text.push_str(&unicode::fit_to_width(TITLE_HEADER, layout.title));
    for (header, w) in FIXED {
        text.push_str(GAP);
        text.push_str(&unicode::fit_to_width(header, w));
    }
    text.push_str(GAP);
    text.push_str(&unicode::fit_to_width(NOTES_HEADER, layout.notes));
    Line::from(Span::styled(text, style))
}

/// All table lines and the line index of the cursor row
fn build_rows(app: &App, layout: &ColumnLayout) -> (Vec<Line<'static>>, usize) {
    let search_re = app.active_search_re();
    let show_headings = app.ui.view.active_tab == AssigneeTab::All;
    let mut lines = Vec::new();
    let mut cursor_line = 0;
    let mut index = 0;

    for group in app.groups() {
        if show_headings {
            lines.push(heading_line(app, group.heading.label(), group.tasks.len()));
        }
        for task in group.tasks {
            let is_cursor = index == app.cursor;
            if is_cursor {
                cursor_line = lines.len();
            }
            lines.push(task_line(app, task, layout, is_cursor, search_re.as_ref()));
            index += 1;
        }
    }
    (lines, cursor_line)
}

fn heading_line(app: &App, label: &str, count: usize) -> Line<'static> {
    let bg = app.theme.background;
    Line::from(vec![
        Span::styled(" \u{2500}\u{2500} ", Style::default().fg(app.theme.dim).bg(bg)),
        Span::styled(
            label.to_string(),
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" ({})", count), Style::default().fg(app.theme.dim).bg(bg)),
    ])
}

/// Text shown in a quick-edit column for a task
fn cell_text(app: &App, task: &Task, field: QuickField) -> String {
    match field {
        QuickField::Priority => lookup::priority_name(&app.refs, &task.priority).to_string(),
        QuickField::Assignee => {
            lookup::assignee_label(&app.members, task.assignee_id.as_deref()).to_string()
        }
        QuickField::Status => lookup::status_name(&app.refs, &task.status).to_string(),
        QuickField::StartDate => lookup::format_date(task.start_date),
        QuickField::DueDate => lookup::format_date(task.due_date),
    }
}

fn task_line(
    app: &App,
    task: &Task,
    layout: &ColumnLayout,
    is_cursor: bool,
    search_re: Option<&Regex>,
) -> Line<'static> {
    let theme = &app.theme;
    let row_bg = if is_cursor {
        theme.selection_bg
    } else {
        theme.background
    };
    let base = Style::default().fg(theme.text).bg(row_bg);
    let overdue = lookup::is_overdue(task, &app.refs, &app.rules.ordering, app.today);

    let mut spans: Vec<Span<'static>> = Vec::new();
    let marker = if is_cursor { "\u{25B8} " } else { "  " };
    spans.push(Span::styled(marker, Style::default().fg(theme.highlight).bg(row_bg)));

    // Title with search highlights
    let title = unicode::truncate_to_width(&task.title, layout.title);
    let title_style = if is_cursor {
        base.fg(theme.text_bright).add_modifier(Modifier::BOLD)
    } else {
        base
    };
    let match_style = Style::default()
        .fg(theme.search_match_fg)
        .bg(theme.search_match_bg);
    push_highlighted_spans(&mut spans, &title, title_style, match_style, search_re);
    let pad = layout.title.saturating_sub(unicode::display_width(&title));
    spans.push(Span::styled(" ".repeat(pad), base));

    // Quick-edit columns
    for (col, field) in QuickField::ALL.into_iter().enumerate() {
        let width = FIXED[col].1;
        let editing = app.ui.view.editing.is_editing(&task.id, field);
        let text = match (&app.date_input, app.mode) {
            (Some(input), Mode::DateInput) if editing => format!("{}\u{258C}", input.text),
            _ => cell_text(app, task, field),
        };
        let fg = match field {
            QuickField::Priority => theme.class_color(lookup::priority_class(&app.refs, &task.priority)),
            QuickField::Status => theme.class_color(lookup::status_class(&app.refs, &task.status)),
            QuickField::Assignee if task.assignee_id.is_none() => theme.dim,
            QuickField::DueDate if overdue => theme.red,
            _ => theme.text,
        };
        let mut style = base.fg(fg);
        if overdue && field == QuickField::DueDate {
            style = style.add_modifier(Modifier::BOLD);
        }
        if editing {
            style = style.bg(theme.highlight).fg(theme.background);
        } else if is_cursor && col == app.column {
            style = style.bg(theme.cell_bg).add_modifier(Modifier::BOLD);
        }
        spans.push(Span::styled(GAP, base));
        spans.push(Span::styled(unicode::fit_to_width(&text, width), style));
    }

    // Read-only columns
    let product = lookup::product_name(&app.refs, &task.product);
    let task_type = lookup::task_type_name(&app.refs, &task.task_type);
    let notes = task
        .notes
        .as_deref()
        .and_then(|n| n.lines().next())
        .unwrap_or("");
    for (text, width) in [(product, FIXED[5].1), (task_type, FIXED[6].1), (notes, layout.notes)] {
        spans.push(Span::styled(GAP, base));
        spans.push(Span::styled(unicode::fit_to_width(text, width), base));
    }

    Line::from(spans)
}
