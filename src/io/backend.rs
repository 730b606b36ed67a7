use std::path::PathBuf;

use crate::io::feed::FeedSubscription;
use crate::io::lock::LockError;
use crate::model::{Member, NewTask, RefEntry, RefKind, ReferenceCache, ReferenceSet, TaskPatch};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not a tasktrack store: no .tasktrack/ directory found")]
    NotAStore,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Lock(#[from] LockError),
    #[error("could not watch store: {0}")]
    Watch(#[from] notify::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Create, update and delete tasks by id.
///
/// Calls never touch a local copy; the next feed push reflects the change.
pub trait TaskGateway {
    /// Persist a new task and return the id the store assigned
    fn create_task(&self, task: &NewTask) -> Result<String, StoreError>;
    /// Merge `patch` into the stored task
    fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), StoreError>;
    fn delete_task(&self, id: &str) -> Result<(), StoreError>;
}

/// Read-only access to members and the enumerated reference sets
pub trait ReferenceSource {
    fn fetch_members(&self) -> Result<Vec<Member>, StoreError>;
    fn fetch_priorities(&self) -> Result<Vec<RefEntry>, StoreError>;
    fn fetch_statuses(&self) -> Result<Vec<RefEntry>, StoreError>;
    fn fetch_products(&self) -> Result<Vec<RefEntry>, StoreError>;
    fn fetch_task_types(&self) -> Result<Vec<RefEntry>, StoreError>;

    fn fetch(&self, kind: RefKind) -> Result<Vec<RefEntry>, StoreError> {
        match kind {
            RefKind::Priority => self.fetch_priorities(),
            RefKind::Status => self.fetch_statuses(),
            RefKind::Product => self.fetch_products(),
            RefKind::TaskType => self.fetch_task_types(),
        }
    }
}

/// Push-based subscription to the full task set
pub trait TaskFeed {
    /// Open a subscription. The first snapshot is queued immediately.
    fn subscribe_tasks(&self) -> Result<FeedSubscription, StoreError>;
}

/// A store that provides all three collaborator roles
pub trait Backend: TaskGateway + ReferenceSource + TaskFeed {
    fn gateway(&self) -> &dyn TaskGateway;
    fn references(&self) -> &dyn ReferenceSource;
}

impl<T: TaskGateway + ReferenceSource + TaskFeed> Backend for T {
    fn gateway(&self) -> &dyn TaskGateway {
        self
    }

    fn references(&self) -> &dyn ReferenceSource {
        self
    }
}

/// Fetch all four reference sets. A set that fails to load is logged and
/// left empty; its ids then display as `-`.
pub fn load_reference_cache(source: &dyn ReferenceSource) -> ReferenceCache {
    let mut cache = ReferenceCache::default();
    for kind in RefKind::ALL {
        match source.fetch(kind) {
            Ok(entries) => *cache.set_mut(kind) = ReferenceSet::new(entries),
            Err(e) => {
                tracing::warn!(collection = kind.collection(), error = %e, "reference fetch failed");
            }
        }
    }
    cache
}

/// Fetch the member roster, empty on failure
pub fn load_members(source: &dyn ReferenceSource) -> Vec<Member> {
    source.fetch_members().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "member fetch failed");
        Vec::new()
    })
}
