use std::cmp::Reverse;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::io::backend::{ReferenceSource, StoreError, TaskFeed, TaskGateway};
use crate::io::feed::{FeedEvent, FeedSubscription};
use crate::io::lock::StoreLock;
use crate::model::{Member, NewTask, RefEntry, RefKind, Task, TaskPatch};

/// Name of the store directory
pub const STORE_DIR: &str = ".tasktrack";
pub const TASKS_FILE: &str = "tasks.json";
pub const MEMBERS_FILE: &str = "members.json";

/// Task store kept as JSON documents in a `.tasktrack/` directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

/// Find the store directory by walking up from `start`.
pub fn discover_store(start: &Path) -> Result<PathBuf, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        let dir = current.join(STORE_DIR);
        if dir.is_dir() {
            return Ok(dir);
        }
        if !current.pop() {
            return Err(StoreError::NotAStore);
        }
    }
}

/// Write `content` to `path` through a temp file in the same directory.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn reference_file(kind: RefKind) -> String {
    format!("{}.json", kind.collection())
}

impl JsonStore {
    /// Open an existing store directory.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        if !dir.is_dir() {
            return Err(StoreError::NotAStore);
        }
        let dir = dir.canonicalize()?;
        Ok(JsonStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a JSON document; a missing file reads as the default value.
    pub fn read_doc<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, StoreError> {
        read_json(&self.dir.join(name))
    }

    pub fn write_doc<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        let content = serde_json::to_string_pretty(value).map_err(|e| StoreError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        atomic_write(&path, content.as_bytes()).map_err(|e| StoreError::WriteError {
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "document written");
        Ok(())
    }

    /// All tasks, newest first
    pub fn load_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self.read_doc(TASKS_FILE)?;
        tasks.sort_by_key(|t| Reverse(t.created_at));
        Ok(tasks)
    }

    pub fn load_members(&self) -> Result<Vec<Member>, StoreError> {
        self.read_doc(MEMBERS_FILE)
    }

    fn load_refs(&self, kind: RefKind) -> Result<Vec<RefEntry>, StoreError> {
        let mut entries: Vec<RefEntry> = self.read_doc(&reference_file(kind))?;
        entries.sort_by_key(|e| e.ordinal);
        Ok(entries)
    }

    /// Replace a reference set (used by `init`)
    pub fn write_refs(&self, kind: RefKind, entries: &[RefEntry]) -> Result<(), StoreError> {
        self.write_doc(&reference_file(kind), entries)
    }

    /// Run a read-modify-write cycle on the task document under the store lock.
    fn with_tasks<R>(
        &self,
        f: impl FnOnce(&mut Vec<Task>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let _lock = StoreLock::acquire(&self.dir, StoreLock::DEFAULT_TIMEOUT)?;
        let mut tasks: Vec<Task> = self.read_doc(TASKS_FILE)?;
        let result = f(&mut tasks)?;
        self.write_doc(TASKS_FILE, &tasks)?;
        Ok(result)
    }

    /// Current snapshot as a feed event
    pub fn snapshot(&self) -> FeedEvent {
        match (self.load_tasks(), self.load_members()) {
            (Ok(tasks), Ok(members)) => FeedEvent::Snapshot { tasks, members },
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "feed snapshot failed");
                FeedEvent::Error(e.to_string())
            }
        }
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => {
            return Err(StoreError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    serde_json::from_str(&content).map_err(|e| StoreError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

impl TaskGateway for JsonStore {
    fn create_task(&self, task: &NewTask) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let stored = task.clone().into_task(id.clone(), Utc::now());
        self.with_tasks(|tasks| {
            tasks.push(stored);
            Ok(())
        })?;
        tracing::info!(task_id = %id, "task created");
        Ok(id)
    }

    fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        self.with_tasks(|tasks| {
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            patch.apply(task);
            let now = Utc::now();
            task.updated_at = Some(task.updated_at.map_or(now, |prev| prev.max(now)));
            Ok(())
        })?;
        tracing::info!(task_id = id, "task updated");
        Ok(())
    }

    fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        self.with_tasks(|tasks| {
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() == before {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(())
        })?;
        tracing::info!(task_id = id, "task deleted");
        Ok(())
    }
}

impl ReferenceSource for JsonStore {
    fn fetch_members(&self) -> Result<Vec<Member>, StoreError> {
        self.load_members()
    }

    fn fetch_priorities(&self) -> Result<Vec<RefEntry>, StoreError> {
        self.load_refs(RefKind::Priority)
    }

    fn fetch_statuses(&self) -> Result<Vec<RefEntry>, StoreError> {
        self.load_refs(RefKind::Status)
    }

    fn fetch_products(&self) -> Result<Vec<RefEntry>, StoreError> {
        self.load_refs(RefKind::Product)
    }

    fn fetch_task_types(&self) -> Result<Vec<RefEntry>, StoreError> {
        self.load_refs(RefKind::TaskType)
    }
}

impl TaskFeed for JsonStore {
    fn subscribe_tasks(&self) -> Result<FeedSubscription, StoreError> {
        let store = self.clone();
        let sub = FeedSubscription::watch(&self.dir, move || store.snapshot())?;
        tracing::debug!(dir = %self.dir.display(), "task feed opened");
        Ok(sub)
    }
}

/// Reference sets written by `init`
pub fn default_references(kind: RefKind) -> Vec<RefEntry> {
    let names: &[(&str, &str)] = match kind {
        RefKind::Priority => &[
            ("urgent", "緊急"),
            ("high", "優先"),
            ("normal", "一般"),
            ("low", "低"),
            ("shelved", "擱置"),
        ],
        RefKind::Status => &[
            ("in-progress", "進行中"),
            ("evaluating", "評估中"),
            ("awaiting-merge", "待Merge"),
            ("testing", "測試中"),
            ("backlog", "待安排"),
            ("tracking", "追蹤"),
            ("done", "已完成"),
            ("stopped", "停止"),
        ],
        RefKind::Product => &[("xq", "XQ"), ("xqnext", "XQNext"), ("xt", "XT")],
        RefKind::TaskType => &[
            ("spec", "規格"),
            ("bug", "Bug"),
            ("general-test", "一般測試"),
            ("document", "文件"),
            ("customer-support", "客服"),
        ],
    };
    names
        .iter()
        .zip(1u32..)
        .map(|((id, name), ordinal)| RefEntry::new(id, name, ordinal))
        .collect()
}
