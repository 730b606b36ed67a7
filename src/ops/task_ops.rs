use chrono::NaiveDate;

use crate::model::{
    DefaultsConfig, Member, NewTask, RefKind, ReferenceCache, ReferenceSet, Task, TaskPatch,
};

/// Error type for the task form
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("標題為必填欄位。")]
    EmptyTitle,
    #[error("日期格式錯誤: {field} = {value:?}")]
    BadDate { field: &'static str, value: String },
    #[error("缺少{}", .0.label())]
    MissingReference(RefKind),
}

pub const DUE_BEFORE_START_WARNING: &str = "截止日期早於開始日期";

/// A field of the full task form, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Description,
    GitIssueUrl,
    Assignee,
    StartDate,
    DueDate,
    Priority,
    Status,
    Product,
    TaskType,
    Notes,
}

impl DraftField {
    pub const ALL: [DraftField; 11] = [
        DraftField::Title,
        DraftField::Description,
        DraftField::GitIssueUrl,
        DraftField::Assignee,
        DraftField::StartDate,
        DraftField::DueDate,
        DraftField::Priority,
        DraftField::Status,
        DraftField::Product,
        DraftField::TaskType,
        DraftField::Notes,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DraftField::Title => "標題",
            DraftField::Description => "描述",
            DraftField::GitIssueUrl => "Git Issue",
            DraftField::Assignee => "負責人",
            DraftField::StartDate => "開始日期",
            DraftField::DueDate => "截止日期",
            DraftField::Priority => "優先級",
            DraftField::Status => "狀態",
            DraftField::Product => "產品",
            DraftField::TaskType => "任務類型",
            DraftField::Notes => "備註",
        }
    }

    /// Reference set backing a select field
    pub fn ref_kind(self) -> Option<RefKind> {
        match self {
            DraftField::Priority => Some(RefKind::Priority),
            DraftField::Status => Some(RefKind::Status),
            DraftField::Product => Some(RefKind::Product),
            DraftField::TaskType => Some(RefKind::TaskType),
            _ => None,
        }
    }

    /// Chosen from a list rather than typed
    pub fn is_select(self) -> bool {
        self.ref_kind().is_some() || self == DraftField::Assignee
    }
}

/// Editable form state for creating or updating a task.
///
/// Text and date fields hold raw input; select fields hold ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Id of the task being edited, `None` when creating
    pub task_id: Option<String>,
    pub title: String,
    pub description: String,
    pub git_issue_url: String,
    pub assignee_id: Option<String>,
    pub start_date: String,
    pub due_date: String,
    pub priority: String,
    pub status: String,
    pub product: String,
    pub task_type: String,
    pub notes: String,
}

/// A draft that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub task: NewTask,
    pub warnings: Vec<String>,
}

fn default_ref(set: &ReferenceSet, preferred: &str) -> String {
    set.find_by_name(preferred)
        .or_else(|| set.first())
        .map(|e| e.id.clone())
        .unwrap_or_default()
}

fn first_ref(set: &ReferenceSet) -> String {
    set.first().map(|e| e.id.clone()).unwrap_or_default()
}

fn date_text(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn optional_text(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse `YYYY-MM-DD`; blank input means no date
pub fn parse_date(field: &'static str, input: &str) -> Result<Option<NaiveDate>, DraftError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| DraftError::BadDate {
            field,
            value: trimmed.to_string(),
        })
}

impl TaskDraft {
    /// Blank draft with the configured default priority and status
    pub fn blank(refs: &ReferenceCache, defaults: &DefaultsConfig) -> Self {
        TaskDraft {
            task_id: None,
            title: String::new(),
            description: String::new(),
            git_issue_url: String::new(),
            assignee_id: None,
            start_date: String::new(),
            due_date: String::new(),
            priority: default_ref(&refs.priorities, &defaults.priority),
            status: default_ref(&refs.statuses, &defaults.status),
            product: first_ref(&refs.products),
            task_type: first_ref(&refs.task_types),
            notes: String::new(),
        }
    }

    /// Draft pre-filled from a stored task
    pub fn from_task(task: &Task) -> Self {
        TaskDraft {
            task_id: Some(task.id.clone()),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            git_issue_url: task.git_issue_url.clone().unwrap_or_default(),
            assignee_id: task.assignee_id.clone(),
            start_date: date_text(task.start_date),
            due_date: date_text(task.due_date),
            priority: task.priority.clone(),
            status: task.status.clone(),
            product: task.product.clone(),
            task_type: task.task_type.clone(),
            notes: task.notes.clone().unwrap_or_default(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.task_id.is_none()
    }

    /// Raw text of a typed field
    pub fn text(&self, field: DraftField) -> &str {
        match field {
            DraftField::Title => &self.title,
            DraftField::Description => &self.description,
            DraftField::GitIssueUrl => &self.git_issue_url,
            DraftField::StartDate => &self.start_date,
            DraftField::DueDate => &self.due_date,
            DraftField::Notes => &self.notes,
            DraftField::Assignee => self.assignee_id.as_deref().unwrap_or(""),
            DraftField::Priority => &self.priority,
            DraftField::Status => &self.status,
            DraftField::Product => &self.product,
            DraftField::TaskType => &self.task_type,
        }
    }

    pub fn text_mut(&mut self, field: DraftField) -> Option<&mut String> {
        match field {
            DraftField::Title => Some(&mut self.title),
            DraftField::Description => Some(&mut self.description),
            DraftField::GitIssueUrl => Some(&mut self.git_issue_url),
            DraftField::StartDate => Some(&mut self.start_date),
            DraftField::DueDate => Some(&mut self.due_date),
            DraftField::Notes => Some(&mut self.notes),
            _ => None,
        }
    }

    /// Step a select field to the next (or previous) option, wrapping.
    /// The assignee field cycles through "unassigned" as well.
    pub fn cycle(&mut self, field: DraftField, refs: &ReferenceCache, members: &[Member], forward: bool) {
        if field == DraftField::Assignee {
            let mut options: Vec<Option<String>> = vec![None];
            options.extend(members.iter().map(|m| Some(m.id.clone())));
            let pos = options
                .iter()
                .position(|o| *o == self.assignee_id)
                .unwrap_or(0);
            self.assignee_id = options[step(pos, options.len(), forward)].clone();
            return;
        }
        let Some(kind) = field.ref_kind() else {
            return;
        };
        let ids: Vec<&str> = refs.set(kind).iter().map(|e| e.id.as_str()).collect();
        if ids.is_empty() {
            return;
        }
        let current = match kind {
            RefKind::Priority => &mut self.priority,
            RefKind::Status => &mut self.status,
            RefKind::Product => &mut self.product,
            RefKind::TaskType => &mut self.task_type,
        };
        let next = match ids.iter().position(|id| *id == current.as_str()) {
            Some(pos) => ids[step(pos, ids.len(), forward)],
            None => ids[0],
        };
        *current = next.to_string();
    }

    /// Check the draft and build the task fields it describes
    pub fn validate(&self) -> Result<ValidDraft, DraftError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DraftError::EmptyTitle);
        }
        let start_date = parse_date("start_date", &self.start_date)?;
        let due_date = parse_date("due_date", &self.due_date)?;
        for (kind, id) in [
            (RefKind::Priority, &self.priority),
            (RefKind::Status, &self.status),
            (RefKind::Product, &self.product),
            (RefKind::TaskType, &self.task_type),
        ] {
            if id.trim().is_empty() {
                return Err(DraftError::MissingReference(kind));
            }
        }

        let mut warnings = Vec::new();
        if let (Some(start), Some(due)) = (start_date, due_date)
            && due < start
        {
            warnings.push(DUE_BEFORE_START_WARNING.to_string());
        }

        Ok(ValidDraft {
            task: NewTask {
                title: title.to_string(),
                description: optional_text(&self.description),
                git_issue_url: optional_text(&self.git_issue_url),
                assignee_id: self.assignee_id.clone().filter(|id| !id.is_empty()),
                start_date,
                due_date,
                priority: self.priority.clone(),
                status: self.status.clone(),
                product: self.product.clone(),
                task_type: self.task_type.clone(),
                notes: optional_text(&self.notes),
            },
            warnings,
        })
    }

    /// Validate into a full-replacement patch for an existing task
    pub fn to_patch(&self) -> Result<(TaskPatch, Vec<String>), DraftError> {
        let valid = self.validate()?;
        Ok((TaskPatch::replace_all(valid.task), valid.warnings))
    }
}

fn step(pos: usize, len: usize, forward: bool) -> usize {
    if forward {
        (pos + 1) % len
    } else {
        (pos + len - 1) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RefEntry;
    use pretty_assertions::assert_eq;

    fn refs() -> ReferenceCache {
        ReferenceCache {
            priorities: ReferenceSet::new(vec![
                RefEntry::new("p1", "緊急", 1),
                RefEntry::new("p3", "一般", 3),
            ]),
            statuses: ReferenceSet::new(vec![
                RefEntry::new("s1", "進行中", 1),
                RefEntry::new("s5", "待安排", 5),
            ]),
            products: ReferenceSet::new(vec![
                RefEntry::new("web", "Web", 2),
                RefEntry::new("xq", "XQ", 1),
            ]),
            task_types: ReferenceSet::new(vec![RefEntry::new("bug", "Bug", 1)]),
        }
    }

    #[test]
    fn test_blank_draft_uses_named_defaults() {
        let draft = TaskDraft::blank(&refs(), &DefaultsConfig::default());
        assert_eq!(draft.priority, "p3");
        assert_eq!(draft.status, "s5");
        assert_eq!(draft.product, "xq");
        assert_eq!(draft.task_type, "bug");
        assert!(draft.is_new());
    }

    #[test]
    fn test_blank_draft_falls_back_to_lowest_ordinal() {
        let defaults = DefaultsConfig {
            priority: "missing".into(),
            status: "missing".into(),
        };
        let draft = TaskDraft::blank(&refs(), &defaults);
        assert_eq!(draft.priority, "p1");
        assert_eq!(draft.status, "s1");
    }

    #[test]
    fn test_empty_title_is_rejected() {
        let mut draft = TaskDraft::blank(&refs(), &DefaultsConfig::default());
        draft.title = "   ".into();
        assert_eq!(draft.validate(), Err(DraftError::EmptyTitle));
        assert_eq!(DraftError::EmptyTitle.to_string(), "標題為必填欄位。");
    }

    #[test]
    fn test_text_is_trimmed_and_blanks_become_none() {
        let mut draft = TaskDraft::blank(&refs(), &DefaultsConfig::default());
        draft.title = "  Fix login  ".into();
        draft.notes = "  ".into();
        draft.description = " why ".into();
        let valid = draft.validate().unwrap();
        assert_eq!(valid.task.title, "Fix login");
        assert_eq!(valid.task.notes, None);
        assert_eq!(valid.task.description.as_deref(), Some("why"));
        assert!(valid.warnings.is_empty());
    }

    #[test]
    fn test_dates_parse_or_fail() {
        let mut draft = TaskDraft::blank(&refs(), &DefaultsConfig::default());
        draft.title = "T".into();
        draft.start_date = "2025-04-01".into();
        let valid = draft.validate().unwrap();
        assert_eq!(valid.task.start_date, NaiveDate::from_ymd_opt(2025, 4, 1));
        assert_eq!(valid.task.due_date, None);

        draft.due_date = "next week".into();
        assert!(matches!(
            draft.validate(),
            Err(DraftError::BadDate { field: "due_date", .. })
        ));
    }

    #[test]
    fn test_due_before_start_is_only_a_warning() {
        let mut draft = TaskDraft::blank(&refs(), &DefaultsConfig::default());
        draft.title = "T".into();
        draft.start_date = "2025-04-10".into();
        draft.due_date = "2025-04-01".into();
        let valid = draft.validate().unwrap();
        assert_eq!(valid.warnings, vec![DUE_BEFORE_START_WARNING.to_string()]);
    }

    #[test]
    fn test_missing_reference_is_an_error() {
        let mut draft = TaskDraft::blank(&ReferenceCache::default(), &DefaultsConfig::default());
        draft.title = "T".into();
        assert_eq!(
            draft.validate(),
            Err(DraftError::MissingReference(RefKind::Priority))
        );
    }

    #[test]
    fn test_existing_task_round_trips_to_full_patch() {
        let task = NewTask {
            title: "Ship".into(),
            description: None,
            git_issue_url: Some("https://git/1".into()),
            assignee_id: Some("m1".into()),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 2),
            due_date: None,
            priority: "p1".into(),
            status: "s1".into(),
            product: "xq".into(),
            task_type: "bug".into(),
            notes: None,
        }
        .into_task("t9".into(), chrono::Utc::now());
        let draft = TaskDraft::from_task(&task);
        assert_eq!(draft.start_date, "2025-01-02");
        let (patch, _) = draft.to_patch().unwrap();
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.git_issue_url, Some(Some("https://git/1".into())));
        assert_eq!(patch.title.as_deref(), Some("Ship"));
    }

    #[test]
    fn test_cycling_wraps_and_includes_unassigned() {
        let refs = refs();
        let members = vec![Member::new("m1", "Amy")];
        let mut draft = TaskDraft::blank(&refs, &DefaultsConfig::default());
        draft.cycle(DraftField::Priority, &refs, &members, true);
        assert_eq!(draft.priority, "p1");
        draft.cycle(DraftField::Priority, &refs, &members, false);
        assert_eq!(draft.priority, "p3");

        draft.cycle(DraftField::Assignee, &refs, &members, true);
        assert_eq!(draft.assignee_id.as_deref(), Some("m1"));
        draft.cycle(DraftField::Assignee, &refs, &members, true);
        assert_eq!(draft.assignee_id, None);
    }
}
