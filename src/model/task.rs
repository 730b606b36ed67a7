use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A task as stored and pushed by the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque id assigned by the store
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// External issue link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_issue_url: Option<String>,
    /// Member id; absent means unassigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Priority id
    pub priority: String,
    /// Status id
    pub status: String,
    /// Product id
    pub product: String,
    /// Task type id
    pub task_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Field set for a task that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub git_issue_url: Option<String>,
    pub assignee_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub priority: String,
    pub status: String,
    pub product: String,
    pub task_type: String,
    pub notes: Option<String>,
}

impl NewTask {
    /// Materialize into a stored task with the given id and creation time
    pub fn into_task(self, id: String, now: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            git_issue_url: self.git_issue_url,
            assignee_id: self.assignee_id,
            start_date: self.start_date,
            due_date: self.due_date,
            priority: self.priority,
            status: self.status,
            product: self.product,
            task_type: self.task_type,
            notes: self.notes,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Partial update merged into a stored task.
///
/// `None` leaves a field untouched. For optional fields, `Some(None)`
/// clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_issue_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl TaskPatch {
    /// A patch that overwrites every editable field with the given values
    pub fn replace_all(fields: NewTask) -> Self {
        TaskPatch {
            title: Some(fields.title),
            description: Some(fields.description),
            git_issue_url: Some(fields.git_issue_url),
            assignee_id: Some(fields.assignee_id),
            start_date: Some(fields.start_date),
            due_date: Some(fields.due_date),
            priority: Some(fields.priority),
            status: Some(fields.status),
            product: Some(fields.product),
            task_type: Some(fields.task_type),
            notes: Some(fields.notes),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Merge into `task`. Timestamps are left to the caller.
    pub fn apply(&self, task: &mut Task) {
        if let Some(v) = &self.title {
            task.title = v.clone();
        }
        if let Some(v) = &self.description {
            task.description = v.clone();
        }
        if let Some(v) = &self.git_issue_url {
            task.git_issue_url = v.clone();
        }
        if let Some(v) = &self.assignee_id {
            task.assignee_id = v.clone();
        }
        if let Some(v) = self.start_date {
            task.start_date = v;
        }
        if let Some(v) = self.due_date {
            task.due_date = v;
        }
        if let Some(v) = &self.priority {
            task.priority = v.clone();
        }
        if let Some(v) = &self.status {
            task.status = v.clone();
        }
        if let Some(v) = &self.product {
            task.product = v.clone();
        }
        if let Some(v) = &self.task_type {
            task.task_type = v.clone();
        }
        if let Some(v) = &self.notes {
            task.notes = v.clone();
        }
    }
}
