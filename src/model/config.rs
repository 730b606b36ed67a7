use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from tasktrack.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppInfo,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub ordering: OrderingConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        AppInfo {
            title: default_title(),
        }
    }
}

fn default_title() -> String {
    "工作追蹤".into()
}

/// Member ids in the order their groups appear in the "all" tab
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub order: Vec<String>,
}

/// Canonical name orderings used for sorting and the finished-status filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingConfig {
    #[serde(default = "default_status_order")]
    pub statuses: Vec<String>,
    #[serde(default = "default_priority_order")]
    pub priorities: Vec<String>,
    /// Status names dropped by the hide-finished toggle
    #[serde(default = "default_finished_statuses")]
    pub finished_statuses: Vec<String>,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        OrderingConfig {
            statuses: default_status_order(),
            priorities: default_priority_order(),
            finished_statuses: default_finished_statuses(),
        }
    }
}

pub fn default_status_order() -> Vec<String> {
    ["進行中", "評估中", "待Merge", "測試中", "待安排", "追蹤", "已完成"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_priority_order() -> Vec<String> {
    ["緊急", "優先", "一般", "低", "擱置"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_finished_statuses() -> Vec<String> {
    vec!["已完成".into(), "停止".into()]
}

/// Names of the reference entries a new task starts with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_priority_name")]
    pub priority: String,
    #[serde(default = "default_status_name")]
    pub status: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            priority: default_priority_name(),
            status: default_status_name(),
        }
    }
}

fn default_priority_name() -> String {
    "一般".into()
}

fn default_status_name() -> String {
    "待安排".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Start with finished tasks hidden (when no saved UI state exists)
    #[serde(default)]
    pub hide_finished: bool,
    /// Hex colour overrides keyed by theme slot (e.g. `background = "#101010"`)
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.app.title, "工作追蹤");
        assert_eq!(config.ordering.statuses.first().map(String::as_str), Some("進行中"));
        assert_eq!(config.ordering.priorities.len(), 5);
        assert_eq!(config.defaults.priority, "一般");
        assert_eq!(config.defaults.status, "待安排");
        assert!(config.roster.order.is_empty());
        assert!(!config.ui.hide_finished);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[roster]
order = ["m2", "m1"]

[ordering]
finished_statuses = ["Done"]
"#,
        )
        .unwrap();
        assert_eq!(config.roster.order, vec!["m2", "m1"]);
        assert_eq!(config.ordering.finished_statuses, vec!["Done"]);
        assert_eq!(config.ordering.statuses, default_status_order());
    }
}
