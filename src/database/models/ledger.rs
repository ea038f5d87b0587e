//! RAG request ledger model.
//!
//! One entry per submitted question, kept for audit and statistics.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a ledger entry.
///
/// `pending` transitions to exactly one terminal status and never
/// reverts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Success,
    Failed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Success => "success",
            RequestStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    /// Whether an entry in this status may be marked with `next`.
    ///
    /// Pending accepts any terminal status; a terminal status accepts
    /// only itself (idempotent re-marking). The repository's update
    /// filter mirrors this rule.
    pub fn accepts_mark(&self, next: RequestStatus) -> bool {
        matches!(self, RequestStatus::Pending) || *self == next
    }
}

/// A ledger entry for one submitted question.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Opaque request identifier from the RAG backend, or a sentinel
    /// for test-mode answers.
    pub request_id: String,
    pub user_id: i64,
    /// Question text, truncated for storage.
    pub text: String,
    pub status: RequestStatus,
    pub created_at: i64,
}

impl LedgerEntry {
    pub fn pending(user_id: i64, request_id: &str, text: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            user_id,
            text: text.to_string(),
            status: RequestStatus::Pending,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_mark() {
        use RequestStatus::*;
        assert!(Pending.accepts_mark(Success));
        assert!(Pending.accepts_mark(Failed));
        assert!(Success.accepts_mark(Success));
        assert!(Failed.accepts_mark(Failed));
        // Conflicting terminal transitions are rejected.
        assert!(!Success.accepts_mark(Failed));
        assert!(!Failed.accepts_mark(Success));
    }

    #[test]
    fn test_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Success.is_terminal());
        assert!(RequestStatus::Failed.is_terminal());
    }
}
