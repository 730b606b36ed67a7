use std::path::Path;
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::model::{Member, Task};

/// Events delivered to a task feed subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The full current task and member sets. Replaces any earlier snapshot.
    Snapshot { tasks: Vec<Task>, members: Vec<Member> },
    /// The feed could not produce a snapshot.
    Error(String),
}

/// An open task feed. Dropping it (or calling `unsubscribe`) stops delivery.
pub struct FeedSubscription {
    _watcher: Option<RecommendedWatcher>,
    rx: mpsc::Receiver<FeedEvent>,
}

impl FeedSubscription {
    /// A subscription fed by some other sender, with no watcher attached
    pub fn detached(rx: mpsc::Receiver<FeedEvent>) -> Self {
        FeedSubscription { _watcher: None, rx }
    }

    /// Watch `store_dir` and send a fresh event from `load` whenever a task
    /// or member document changes. The first event is sent right away.
    pub fn watch<F>(store_dir: &Path, load: F) -> Result<Self, notify::Error>
    where
        F: Fn() -> FeedEvent + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(load());

        let dir_owned = store_dir.to_path_buf();
        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(e) => {
                        let _ = tx.send(FeedEvent::Error(e.to_string()));
                        return;
                    }
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                if event.paths.iter().any(|p| is_feed_document(&dir_owned, p)) {
                    tracing::debug!(paths = ?event.paths, "store documents changed");
                    let _ = tx.send(load());
                }
            },
            Config::default(),
        )?;

        watcher.watch(store_dir, RecursiveMode::NonRecursive)?;
        Ok(FeedSubscription {
            _watcher: Some(watcher),
            rx,
        })
    }

    /// Non-blocking poll for pending events, oldest first.
    pub fn poll(&self) -> Vec<FeedEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }

    pub fn unsubscribe(self) {
        tracing::debug!("task feed closed");
    }
}

fn is_feed_document(store_dir: &Path, path: &Path) -> bool {
    if !path.starts_with(store_dir) {
        return false;
    }
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some("tasks.json") | Some("members.json")
    )
}
