use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::io::backend::TaskGateway;
use crate::model::{Actor, Gesture, Task, TaskPatch, can_mutate};

/// A cell that can be edited inline from the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickField {
    Priority,
    Assignee,
    Status,
    StartDate,
    DueDate,
}

impl QuickField {
    /// Column order in the task table
    pub const ALL: [QuickField; 5] = [
        QuickField::Priority,
        QuickField::Assignee,
        QuickField::Status,
        QuickField::StartDate,
        QuickField::DueDate,
    ];

    pub fn is_date(self) -> bool {
        matches!(self, QuickField::StartDate | QuickField::DueDate)
    }

    pub fn label(self) -> &'static str {
        match self {
            QuickField::Priority => "優先級",
            QuickField::Assignee => "負責人",
            QuickField::Status => "狀態",
            QuickField::StartDate => "開始日期",
            QuickField::DueDate => "截止日期",
        }
    }

    /// Parse a CLI field name
    pub fn parse(s: &str) -> Option<QuickField> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "priority" => Some(QuickField::Priority),
            "assignee" => Some(QuickField::Assignee),
            "status" => Some(QuickField::Status),
            "start" | "start_date" => Some(QuickField::StartDate),
            "due" | "due_date" => Some(QuickField::DueDate),
            _ => None,
        }
    }
}

/// New value chosen for a quick-edit cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickValue {
    Priority(String),
    Assignee(Option<String>),
    Status(String),
    StartDate(Option<NaiveDate>),
    DueDate(Option<NaiveDate>),
}

impl QuickValue {
    pub fn field(&self) -> QuickField {
        match self {
            QuickValue::Priority(_) => QuickField::Priority,
            QuickValue::Assignee(_) => QuickField::Assignee,
            QuickValue::Status(_) => QuickField::Status,
            QuickValue::StartDate(_) => QuickField::StartDate,
            QuickValue::DueDate(_) => QuickField::DueDate,
        }
    }

    /// The task's current value for the same field
    pub fn current(field: QuickField, task: &Task) -> QuickValue {
        match field {
            QuickField::Priority => QuickValue::Priority(task.priority.clone()),
            QuickField::Assignee => QuickValue::Assignee(task.assignee_id.clone()),
            QuickField::Status => QuickValue::Status(task.status.clone()),
            QuickField::StartDate => QuickValue::StartDate(task.start_date),
            QuickField::DueDate => QuickValue::DueDate(task.due_date),
        }
    }

    /// Single-field patch carrying this value
    pub fn into_patch(self) -> TaskPatch {
        let mut patch = TaskPatch::default();
        match self {
            QuickValue::Priority(v) => patch.priority = Some(v),
            QuickValue::Assignee(v) => patch.assignee_id = Some(v),
            QuickValue::Status(v) => patch.status = Some(v),
            QuickValue::StartDate(v) => patch.start_date = Some(v),
            QuickValue::DueDate(v) => patch.due_date = Some(v),
        }
        patch
    }
}

/// Why a commit was refused before reaching the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    DueBeforeStart { start: NaiveDate, due: NaiveDate },
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::DueBeforeStart { .. } => "截止日期不能早於開始日期。",
        }
    }
}

/// Result of a commit; the state machine is idle afterwards in every case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Same value as before, no gateway call
    Unchanged,
    /// One update sent; the next feed push shows it
    Committed,
    Rejected(Rejection),
    /// The gateway call failed
    Failed(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuickEditError {
    #[error("{}", Gesture::Edit.denied_message())]
    NotAuthorized,
    #[error("cell {field:?} of task {task_id} is not being edited")]
    NotEditing { task_id: String, field: QuickField },
}

/// Inline edit state: idle, or exactly one cell being edited
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuickEdit {
    #[default]
    Idle,
    Editing { task_id: String, field: QuickField },
}

impl QuickEdit {
    /// Start editing a cell. Any other cell being edited loses focus.
    pub fn begin(
        &mut self,
        actor: Option<&Actor>,
        task_id: &str,
        field: QuickField,
    ) -> Result<(), QuickEditError> {
        if !can_mutate(actor) {
            tracing::info!(task_id, ?field, "quick edit refused for non-admin");
            return Err(QuickEditError::NotAuthorized);
        }
        *self = QuickEdit::Editing {
            task_id: task_id.to_string(),
            field,
        };
        Ok(())
    }

    /// Focus left the cell without a commit
    pub fn blur(&mut self) {
        *self = QuickEdit::Idle;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, QuickEdit::Idle)
    }

    pub fn is_editing(&self, task_id: &str, field: QuickField) -> bool {
        matches!(self, QuickEdit::Editing { task_id: t, field: f } if t == task_id && *f == field)
    }

    pub fn editing_field(&self) -> Option<QuickField> {
        match self {
            QuickEdit::Editing { field, .. } => Some(*field),
            QuickEdit::Idle => None,
        }
    }

    /// Commit `value` for the cell being edited on `task`.
    ///
    /// Sends at most one update. The task itself is not modified; the
    /// change shows up with the next feed push.
    pub fn commit(
        &mut self,
        task: &Task,
        value: QuickValue,
        gateway: &dyn TaskGateway,
    ) -> Result<CommitOutcome, QuickEditError> {
        let field = value.field();
        if !self.is_editing(&task.id, field) {
            return Err(QuickEditError::NotEditing {
                task_id: task.id.clone(),
                field,
            });
        }
        *self = QuickEdit::Idle;

        if value == QuickValue::current(field, task) {
            return Ok(CommitOutcome::Unchanged);
        }
        if let (QuickValue::DueDate(Some(due)), Some(start)) = (&value, task.start_date)
            && *due < start
        {
            tracing::debug!(task_id = %task.id, %start, %due, "due date before start rejected");
            return Ok(CommitOutcome::Rejected(Rejection::DueBeforeStart { start, due: *due }));
        }

        match gateway.update_task(&task.id, &value.into_patch()) {
            Ok(()) => {
                tracing::info!(task_id = %task.id, ?field, "quick edit committed");
                Ok(CommitOutcome::Committed)
            }
            Err(e) => {
                tracing::warn!(task_id = %task.id, ?field, error = %e, "quick edit failed");
                Ok(CommitOutcome::Failed(e.to_string()))
            }
        }
    }
}
