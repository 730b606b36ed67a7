use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ops::quick_edit::QuickEdit;
use crate::ops::view::ViewState;

pub const STATE_FILE: &str = ".state.json";
const MAX_SEARCH_HISTORY: usize = 50;

/// Persisted TUI state (written to .state.json)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UiState {
    #[serde(default)]
    pub view: ViewState,
    /// Last search pattern
    #[serde(default)]
    pub last_search: Option<String>,
    /// Search history (most recent first)
    #[serde(default)]
    pub search_history: Vec<String>,
}

impl UiState {
    /// Put `pattern` at the front of the history, dropping duplicates
    pub fn remember_search(&mut self, pattern: &str) {
        self.search_history.retain(|p| p != pattern);
        self.search_history.insert(0, pattern.to_string());
        self.search_history.truncate(MAX_SEARCH_HISTORY);
        self.last_search = Some(pattern.to_string());
    }
}

/// Read .state.json from the store directory. Any in-progress quick edit
/// is dropped: editing never survives a restart.
pub fn read_ui_state(store_dir: &Path) -> Option<UiState> {
    let content = fs::read_to_string(store_dir.join(STATE_FILE)).ok()?;
    let mut state: UiState = match serde_json::from_str(&content) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable UI state");
            return None;
        }
    };
    state.view.editing = QuickEdit::Idle;
    Some(state)
}

/// Write .state.json to the store directory
pub fn write_ui_state(store_dir: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    fs::write(store_dir.join(STATE_FILE), content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::quick_edit::QuickField;
    use crate::ops::view::AssigneeTab;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let state = UiState {
            view: ViewState {
                active_tab: AssigneeTab::Member("m2".into()),
                hide_completed_and_stopped: true,
                editing: QuickEdit::Idle,
            },
            last_search: Some("login".into()),
            search_history: vec!["login".into(), "bug".into()],
        };
        write_ui_state(dir.path(), &state).unwrap();
        assert_eq!(read_ui_state(dir.path()), Some(state));
    }

    #[test]
    fn test_editing_is_not_restored() {
        let dir = TempDir::new().unwrap();
        let mut state = UiState::default();
        state.view.editing = QuickEdit::Editing {
            task_id: "t1".into(),
            field: QuickField::DueDate,
        };
        write_ui_state(dir.path(), &state).unwrap();
        assert_eq!(read_ui_state(dir.path()).unwrap().view.editing, QuickEdit::Idle);
    }

    #[test]
    fn test_read_missing_or_malformed_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_ui_state(dir.path()).is_none());
        fs::write(dir.path().join(STATE_FILE), "not json {{{").unwrap();
        assert!(read_ui_state(dir.path()).is_none());
    }

    #[test]
    fn test_serde_defaults_on_empty_object() {
        let state: UiState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.view.active_tab, AssigneeTab::All);
        assert!(!state.view.hide_completed_and_stopped);
        assert!(state.last_search.is_none());
    }

    #[test]
    fn test_search_history_dedupes_most_recent_first() {
        let mut state = UiState::default();
        state.remember_search("a");
        state.remember_search("b");
        state.remember_search("a");
        assert_eq!(state.search_history, vec!["a", "b"]);
        assert_eq!(state.last_search.as_deref(), Some("a"));
    }
}
