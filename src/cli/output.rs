use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::model::{Member, OrderingConfig, RefEntry, RefKind, ReferenceCache, Task};
use crate::ops::lookup;
use crate::ops::view::{EMPTY_MESSAGE, GroupHeading, TaskGroup};

/// Length of the id prefix shown in text output
pub const SHORT_ID_LEN: usize = 8;

/// Everything needed to turn ids into display names
pub struct DisplayContext<'a> {
    pub members: &'a [Member],
    pub refs: &'a ReferenceCache,
    pub ordering: &'a OrderingConfig,
    pub today: NaiveDate,
}

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct RefJson {
    pub id: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_issue_url: Option<String>,
    pub assignee_id: Option<String>,
    pub assignee: String,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub priority: RefJson,
    pub status: RefJson,
    pub product: RefJson,
    pub task_type: RefJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub overdue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct GroupJson {
    pub heading: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ListJson {
    pub tab: String,
    pub hide_finished: bool,
    pub groups: Vec<GroupJson>,
}

#[derive(Serialize)]
pub struct RefsJson {
    pub members: Vec<Member>,
    pub priorities: Vec<RefEntry>,
    pub statuses: Vec<RefEntry>,
    pub products: Vec<RefEntry>,
    pub task_types: Vec<RefEntry>,
}

#[derive(Serialize)]
pub struct SearchHitJson {
    pub task_id: String,
    pub title: String,
}

#[derive(Serialize)]
pub struct CreatedJson {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn ref_json(ctx: &DisplayContext, kind: RefKind, id: &str) -> RefJson {
    RefJson {
        id: id.to_string(),
        name: lookup::ref_name(ctx.refs, kind, id).to_string(),
    }
}

pub fn task_to_json(task: &Task, ctx: &DisplayContext) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        title: task.title.clone(),
        description: task.description.clone(),
        git_issue_url: task.git_issue_url.clone(),
        assignee_id: task.assignee_id.clone(),
        assignee: lookup::assignee_label(ctx.members, task.assignee_id.as_deref()).to_string(),
        start_date: task.start_date,
        due_date: task.due_date,
        priority: ref_json(ctx, RefKind::Priority, &task.priority),
        status: ref_json(ctx, RefKind::Status, &task.status),
        product: ref_json(ctx, RefKind::Product, &task.product),
        task_type: ref_json(ctx, RefKind::TaskType, &task.task_type),
        notes: task.notes.clone(),
        overdue: lookup::is_overdue(task, ctx.refs, ctx.ordering, ctx.today),
        created_at: task.created_at,
        updated_at: task.updated_at,
    }
}

pub fn group_to_json(group: &TaskGroup, ctx: &DisplayContext) -> GroupJson {
    GroupJson {
        heading: group.heading.label().to_string(),
        member_id: match &group.heading {
            GroupHeading::Member { id, .. } => Some(id.clone()),
            GroupHeading::Unassigned => None,
        },
        tasks: group.tasks.iter().map(|t| task_to_json(t, ctx)).collect(),
    }
}

pub fn refs_to_json(members: &[Member], refs: &ReferenceCache) -> RefsJson {
    let entries = |kind: RefKind| -> Vec<RefEntry> { refs.set(kind).iter().cloned().collect() };
    RefsJson {
        members: members.to_vec(),
        priorities: entries(RefKind::Priority),
        statuses: entries(RefKind::Status),
        products: entries(RefKind::Product),
        task_types: entries(RefKind::TaskType),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// One-line summary: `id [status] [priority] title @assignee due:date`
pub fn format_task_line(task: &Task, ctx: &DisplayContext) -> String {
    let mut line = format!(
        "{} [{}] [{}] {}",
        short_id(&task.id),
        lookup::status_name(ctx.refs, &task.status),
        lookup::priority_name(ctx.refs, &task.priority),
        task.title,
    );
    if task.assignee_id.is_some() {
        line.push_str(&format!(
            " @{}",
            lookup::assignee_label(ctx.members, task.assignee_id.as_deref())
        ));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due:{}", due.format("%Y-%m-%d")));
        if lookup::is_overdue(task, ctx.refs, ctx.ordering, ctx.today) {
            line.push_str(" (overdue)");
        }
    }
    line
}

/// Grouped listing with a `== heading ==` line per group
pub fn format_group_listing(groups: &[TaskGroup], ctx: &DisplayContext) -> Vec<String> {
    let mut lines = Vec::new();
    if groups.is_empty() {
        lines.push(EMPTY_MESSAGE.to_string());
        return lines;
    }
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(format!(
            "== {} ({}) ==",
            group.heading.label(),
            group.tasks.len()
        ));
        for task in &group.tasks {
            lines.push(format!("  {}", format_task_line(task, ctx)));
        }
    }
    lines
}

/// Full detail view of one task
pub fn format_task_detail(task: &Task, ctx: &DisplayContext) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", task.id, task.title),
        format!("負責人: {}", lookup::assignee_label(ctx.members, task.assignee_id.as_deref())),
        format!("優先級: {}", lookup::priority_name(ctx.refs, &task.priority)),
        format!("狀態: {}", lookup::status_name(ctx.refs, &task.status)),
        format!("產品: {}", lookup::product_name(ctx.refs, &task.product)),
        format!("任務類型: {}", lookup::task_type_name(ctx.refs, &task.task_type)),
        format!("開始日期: {}", lookup::format_date(task.start_date)),
        format!("截止日期: {}", lookup::format_date(task.due_date)),
    ];
    if let Some(url) = &task.git_issue_url {
        lines.push(format!("Git Issue: {}", url));
    }
    if let Some(desc) = &task.description {
        lines.push("描述:".to_string());
        lines.extend(desc.lines().map(|l| format!("  {}", l)));
    }
    if let Some(notes) = &task.notes {
        lines.push("備註:".to_string());
        lines.extend(notes.lines().map(|l| format!("  {}", l)));
    }
    if let Some(ts) = task.created_at {
        lines.push(format!("建立時間: {}", ts.format("%Y-%m-%d %H:%M")));
    }
    if let Some(ts) = task.updated_at {
        lines.push(format!("更新時間: {}", ts.format("%Y-%m-%d %H:%M")));
    }
    lines
}

pub fn format_refs(members: &[Member], refs: &ReferenceCache) -> Vec<String> {
    let mut lines = vec!["成員:".to_string()];
    lines.extend(members.iter().map(|m| format!("  {}  {}", m.id, m.display_name)));
    for kind in RefKind::ALL {
        lines.push(format!("{}:", kind.label()));
        lines.extend(
            refs.set(kind)
                .iter()
                .map(|e| format!("  {:>2}. {}  {}", e.ordinal, e.id, e.name)),
        );
    }
    lines
}
