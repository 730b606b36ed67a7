use serde::{Deserialize, Serialize};

/// Access level of a signed-in account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Viewer,
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Name shown in the title bar
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// Whether the (possibly absent) actor may create, edit or delete tasks
pub fn can_mutate(actor: Option<&Actor>) -> bool {
    actor.is_some_and(Actor::is_admin)
}

/// A mutating gesture that needs an admin actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Create,
    Edit,
    Delete,
}

impl Gesture {
    /// Message shown when a non-admin attempts the gesture
    pub fn denied_message(self) -> &'static str {
        match self {
            Gesture::Create => "只有管理員可以建立任務。",
            Gesture::Edit => "只有管理員可以編輯任務。",
            Gesture::Delete => "只有管理員可以刪除任務。",
        }
    }
}
