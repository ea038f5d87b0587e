//! Activity log model.
//!
//! Feeds the /stats and /user_stats aggregations.

use serde::{Deserialize, Serialize};

/// Kind of a logged activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// A bot command, content is the command name.
    Command,
    /// A free-text question, content is the (truncated) text.
    Text,
    /// An internal action such as `set_car` or `limit_exhausted`,
    /// content is the action name.
    Action,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Command => "command",
            ActivityKind::Text => "text",
            ActivityKind::Action => "action",
        }
    }
}

/// One logged activity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub user_id: i64,
    pub kind: ActivityKind,
    pub content: String,
    pub created_at: i64,
}

impl ActivityEntry {
    pub fn new(user_id: i64, kind: ActivityKind, content: impl Into<String>) -> Self {
        Self {
            user_id,
            kind,
            content: content.into(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}
