use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::sync::mpsc;

use chrono::Utc;

use crate::io::backend::{ReferenceSource, StoreError, TaskFeed, TaskGateway};
use crate::io::feed::{FeedEvent, FeedSubscription};
use crate::model::{Member, NewTask, RefEntry, RefKind, Task, TaskPatch};

/// In-process store with call counters and failure switches.
///
/// Every successful mutation pushes a fresh snapshot to open
/// subscriptions, the same way the file store's watcher does.
#[derive(Default)]
pub struct MemoryStore {
    tasks: RefCell<Vec<Task>>,
    members: RefCell<Vec<Member>>,
    refs: RefCell<HashMap<RefKind, Vec<RefEntry>>>,
    subscribers: RefCell<Vec<mpsc::Sender<FeedEvent>>>,
    failing_refs: RefCell<HashSet<RefKind>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    next_id: Cell<u32>,
    create_calls: Cell<usize>,
    update_calls: Cell<usize>,
    delete_calls: Cell<usize>,
    last_patch: RefCell<Option<(String, TaskPatch)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `tasks` in feed order
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let store = Self::default();
        *store.tasks.borrow_mut() = tasks;
        store
    }

    pub fn set_members(&self, members: Vec<Member>) {
        *self.members.borrow_mut() = members;
    }

    pub fn set_refs(&self, kind: RefKind, entries: Vec<RefEntry>) {
        self.refs.borrow_mut().insert(kind, entries);
    }

    /// Make fetches of one reference set fail
    pub fn fail_ref(&self, kind: RefKind) {
        self.failing_refs.borrow_mut().insert(kind);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.get()
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.get()
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.get()
    }

    /// Total gateway calls of any kind
    pub fn mutation_calls(&self) -> usize {
        self.create_calls() + self.update_calls() + self.delete_calls()
    }

    pub fn last_patch(&self) -> Option<(String, TaskPatch)> {
        self.last_patch.borrow().clone()
    }

    pub fn task(&self, id: &str) -> Option<Task> {
        self.tasks.borrow().iter().find(|t| t.id == id).cloned()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.borrow().clone()
    }

    /// Send an error event to every open subscription
    pub fn push_error(&self, message: &str) {
        self.broadcast(|| FeedEvent::Error(message.to_string()));
    }

    fn snapshot(&self) -> FeedEvent {
        FeedEvent::Snapshot {
            tasks: self.tasks(),
            members: self.members.borrow().clone(),
        }
    }

    fn publish(&self) {
        self.broadcast(|| self.snapshot());
    }

    fn broadcast(&self, event: impl Fn() -> FeedEvent) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(event()).is_ok());
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable("write rejected".into()));
        }
        Ok(())
    }

    fn check_readable(&self) -> Result<(), StoreError> {
        if self.fail_reads.get() {
            return Err(StoreError::Unavailable("read rejected".into()));
        }
        Ok(())
    }

    fn fetch_refs(&self, kind: RefKind) -> Result<Vec<RefEntry>, StoreError> {
        self.check_readable()?;
        if self.failing_refs.borrow().contains(&kind) {
            return Err(StoreError::Unavailable(format!("{} unavailable", kind.collection())));
        }
        let mut entries = self.refs.borrow().get(&kind).cloned().unwrap_or_default();
        entries.sort_by_key(|e| e.ordinal);
        Ok(entries)
    }
}

impl TaskGateway for MemoryStore {
    fn create_task(&self, task: &NewTask) -> Result<String, StoreError> {
        self.create_calls.set(self.create_calls.get() + 1);
        self.check_writable()?;
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        let id = format!("task-{n}");
        self.tasks
            .borrow_mut()
            .insert(0, task.clone().into_task(id.clone(), Utc::now()));
        self.publish();
        Ok(id)
    }

    fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        self.update_calls.set(self.update_calls.get() + 1);
        *self.last_patch.borrow_mut() = Some((id.to_string(), patch.clone()));
        self.check_writable()?;
        {
            let mut tasks = self.tasks.borrow_mut();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            patch.apply(task);
            task.updated_at = Some(Utc::now());
        }
        self.publish();
        Ok(())
    }

    fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        self.delete_calls.set(self.delete_calls.get() + 1);
        self.check_writable()?;
        {
            let mut tasks = self.tasks.borrow_mut();
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() == before {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }
        self.publish();
        Ok(())
    }
}

impl ReferenceSource for MemoryStore {
    fn fetch_members(&self) -> Result<Vec<Member>, StoreError> {
        self.check_readable()?;
        Ok(self.members.borrow().clone())
    }

    fn fetch_priorities(&self) -> Result<Vec<RefEntry>, StoreError> {
        self.fetch_refs(RefKind::Priority)
    }

    fn fetch_statuses(&self) -> Result<Vec<RefEntry>, StoreError> {
        self.fetch_refs(RefKind::Status)
    }

    fn fetch_products(&self) -> Result<Vec<RefEntry>, StoreError> {
        self.fetch_refs(RefKind::Product)
    }

    fn fetch_task_types(&self) -> Result<Vec<RefEntry>, StoreError> {
        self.fetch_refs(RefKind::TaskType)
    }
}

impl TaskFeed for MemoryStore {
    fn subscribe_tasks(&self) -> Result<FeedSubscription, StoreError> {
        self.check_readable()?;
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(self.snapshot());
        self.subscribers.borrow_mut().push(tx);
        Ok(FeedSubscription::detached(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            description: None,
            git_issue_url: None,
            assignee_id: None,
            start_date: None,
            due_date: None,
            priority: "p".into(),
            status: "s".into(),
            product: "x".into(),
            task_type: "y".into(),
            notes: None,
        }
    }

    #[test]
    fn test_mutations_push_snapshots() {
        let store = MemoryStore::new();
        let sub = store.subscribe_tasks().unwrap();
        let id = store.create_task(&new_task("A")).unwrap();
        store
            .update_task(&id, &TaskPatch { title: Some("B".into()), ..Default::default() })
            .unwrap();

        let events = sub.poll();
        assert_eq!(events.len(), 3);
        match events.last() {
            Some(FeedEvent::Snapshot { tasks, .. }) => assert_eq!(tasks[0].title, "B"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_new_tasks_come_first() {
        let store = MemoryStore::new();
        store.create_task(&new_task("old")).unwrap();
        store.create_task(&new_task("new")).unwrap();
        let titles: Vec<String> = store.tasks().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[test]
    fn test_failures_are_counted_but_change_nothing() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        assert!(store.create_task(&new_task("A")).is_err());
        assert_eq!(store.create_calls(), 1);
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let store = MemoryStore::new();
        drop(store.subscribe_tasks().unwrap());
        store.create_task(&new_task("A")).unwrap();
        assert!(store.subscribers.borrow().is_empty());
    }
}
