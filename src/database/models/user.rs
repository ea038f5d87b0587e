//! Roster user model.
//!
//! One entry per person allowed to talk to the bot. Entries added by
//! username before the person ever contacted the bot carry the pending
//! sentinel id until claimed on first contact.

use serde::{Deserialize, Serialize};

/// Sentinel `user_id` for roster entries added by username only.
///
/// Claimed (replaced with the real Telegram id) on the user's first
/// contact with the bot.
pub const PENDING_USER_ID: i64 = -1;

/// Roster role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// A roster entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RosterUser {
    /// Telegram user id, or [`PENDING_USER_ID`] for pending entries.
    pub user_id: i64,
    /// Username without `@`, lowercase.
    pub username: Option<String>,
    pub role: Role,
    pub allowed: bool,
    /// Free-text car description, set via /set_car.
    pub car: Option<String>,
    /// Unix timestamp of roster entry creation.
    pub created_at: i64,
}

impl RosterUser {
    /// Create a regular allowed user.
    pub fn new(user_id: i64, username: Option<String>) -> Self {
        Self {
            user_id,
            username: username.map(|u| u.to_lowercase()),
            role: Role::User,
            allowed: true,
            car: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Create a pending entry for a user known only by username.
    pub fn pending(username: String) -> Self {
        Self::new(PENDING_USER_ID, Some(username))
    }

    pub fn is_pending(&self) -> bool {
        self.user_id == PENDING_USER_ID
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_entry() {
        let user = RosterUser::pending("SomeOne".to_string());
        assert!(user.is_pending());
        assert_eq!(user.username.as_deref(), Some("someone"));
        assert!(user.allowed);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_roles() {
        let mut user = RosterUser::new(42, None);
        assert!(!user.is_admin());
        assert_eq!(user.role.as_str(), "user");
        user.role = Role::Admin;
        assert!(user.is_admin());
        assert_eq!(user.role.as_str(), "admin");
    }
}
