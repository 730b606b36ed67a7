use chrono::NaiveDate;

use crate::model::{Member, OrderingConfig, RefKind, ReferenceCache, Task};

/// Shown in place of a reference id that is not in the loaded set
pub const FALLBACK_NAME: &str = "-";
pub const UNASSIGNED_LABEL: &str = "未分配";
pub const UNKNOWN_MEMBER_LABEL: &str = "未知用戶";

/// Visual category for a priority or status cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleClass {
    Urgent,
    High,
    Normal,
    Low,
    Shelved,
    Active,
    Review,
    Pending,
    Done,
    Stopped,
    Neutral,
}

/// Display name for `id` in the given set, or `-`
pub fn ref_name<'a>(refs: &'a ReferenceCache, kind: RefKind, id: &str) -> &'a str {
    refs.set(kind)
        .get(id)
        .map_or(FALLBACK_NAME, |e| e.name.as_str())
}

pub fn priority_name<'a>(refs: &'a ReferenceCache, id: &str) -> &'a str {
    ref_name(refs, RefKind::Priority, id)
}

pub fn status_name<'a>(refs: &'a ReferenceCache, id: &str) -> &'a str {
    ref_name(refs, RefKind::Status, id)
}

pub fn product_name<'a>(refs: &'a ReferenceCache, id: &str) -> &'a str {
    ref_name(refs, RefKind::Product, id)
}

pub fn task_type_name<'a>(refs: &'a ReferenceCache, id: &str) -> &'a str {
    ref_name(refs, RefKind::TaskType, id)
}

/// Resolved status name, `None` when the id is dangling
pub fn resolved_status<'a>(refs: &'a ReferenceCache, id: &str) -> Option<&'a str> {
    refs.statuses.get(id).map(|e| e.name.as_str())
}

pub fn priority_class(refs: &ReferenceCache, id: &str) -> StyleClass {
    match refs.priorities.get(id).map(|e| e.name.as_str()) {
        Some("緊急") => StyleClass::Urgent,
        Some("優先") => StyleClass::High,
        Some("一般") => StyleClass::Normal,
        Some("低") => StyleClass::Low,
        Some("擱置") => StyleClass::Shelved,
        _ => StyleClass::Neutral,
    }
}

pub fn status_class(refs: &ReferenceCache, id: &str) -> StyleClass {
    match resolved_status(refs, id) {
        Some("進行中") => StyleClass::Active,
        Some("評估中") | Some("測試中") | Some("待Merge") => StyleClass::Review,
        Some("待安排") | Some("追蹤") => StyleClass::Pending,
        Some("已完成") => StyleClass::Done,
        Some("停止") => StyleClass::Stopped,
        _ => StyleClass::Neutral,
    }
}

pub fn find_member<'a>(members: &'a [Member], id: &str) -> Option<&'a Member> {
    members.iter().find(|m| m.id == id)
}

/// Assignee display text: member name, unknown-member marker, or unassigned
pub fn assignee_label<'a>(members: &'a [Member], assignee_id: Option<&str>) -> &'a str {
    match assignee_id {
        None => UNASSIGNED_LABEL,
        Some(id) => find_member(members, id).map_or(UNKNOWN_MEMBER_LABEL, |m| m.display_name.as_str()),
    }
}

/// Whether the task's status resolves to one of the finished names
pub fn is_finished(task: &Task, refs: &ReferenceCache, ordering: &OrderingConfig) -> bool {
    resolved_status(refs, &task.status)
        .is_some_and(|name| ordering.finished_statuses.iter().any(|f| f == name))
}

/// Past its due date and not finished
pub fn is_overdue(
    task: &Task,
    refs: &ReferenceCache,
    ordering: &OrderingConfig,
    today: NaiveDate,
) -> bool {
    task.due_date.is_some_and(|due| due < today) && !is_finished(task, refs, ordering)
}

/// Format an optional date for a table cell
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| FALLBACK_NAME.to_string(), |d| d.format("%Y-%m-%d").to_string())
}
