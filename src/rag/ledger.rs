//! Ledger seam for the gateway.
//!
//! The gateway only needs two operations from the request ledger; the
//! trait keeps it testable without a database.

use anyhow::Result;
use async_trait::async_trait;

use crate::database::RequestStatus;

/// Audit ledger of submitted questions.
#[async_trait]
pub trait QuestionLedger: Send + Sync {
    /// Record a freshly submitted question as `pending`.
    async fn insert_pending(&self, user_id: i64, request_id: &str, text: &str) -> Result<()>;

    /// Mark a request with a terminal status. Idempotent for repeated
    /// identical statuses; must never flip one terminal status to
    /// another.
    async fn mark_status(&self, request_id: &str, status: RequestStatus) -> Result<()>;
}
