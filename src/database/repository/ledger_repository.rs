//! RAG request ledger repository.
//!
//! Append-plus-one-transition storage: rows are inserted `pending` and
//! later marked with exactly one terminal status.

use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::Collection;
use tracing::{debug, warn};

use crate::database::models::{LedgerEntry, RequestStatus};
use crate::database::Database;
use crate::rag::QuestionLedger;

/// Repository for ledger entries.
pub struct LedgerRepo {
    collection: Collection<LedgerEntry>,
}

impl LedgerRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("rag_requests"),
        }
    }

    /// Insert a `pending` row for a freshly submitted question.
    pub async fn insert_pending(&self, user_id: i64, request_id: &str, text: &str) -> Result<()> {
        let entry = LedgerEntry::pending(user_id, request_id, text);
        self.collection.insert_one(&entry).await?;
        debug!("Ledger: pending request {} for user {}", request_id, user_id);
        Ok(())
    }

    /// Mark a request with a terminal status.
    ///
    /// Idempotent for repeated identical statuses. The filter mirrors
    /// [`RequestStatus::accepts_mark`], so a conflicting terminal
    /// transition never overwrites; it is logged as a bug instead.
    pub async fn mark_status(&self, request_id: &str, status: RequestStatus) -> Result<()> {
        if !status.is_terminal() {
            warn!("Ledger: refusing to mark request {} back to pending", request_id);
            return Ok(());
        }

        let filter = doc! {
            "request_id": request_id,
            "status": { "$in": [RequestStatus::Pending.as_str(), status.as_str()] },
        };
        let update = doc! { "$set": { "status": status.as_str() } };
        let result = self.collection.update_one(filter, update).await?;

        if result.matched_count == 0 {
            match self
                .collection
                .find_one(doc! { "request_id": request_id })
                .await?
            {
                Some(row) if !row.status.accepts_mark(status) => warn!(
                    "Ledger: conflicting terminal mark {} for request {} already {}; this is a bug",
                    status.as_str(),
                    request_id,
                    row.status.as_str()
                ),
                Some(_) => {}
                None => warn!(
                    "Ledger: no row for request {} to mark {}",
                    request_id,
                    status.as_str()
                ),
            }
        } else {
            debug!("Ledger: request {} -> {}", request_id, status.as_str());
        }

        Ok(())
    }
}

#[async_trait]
impl QuestionLedger for LedgerRepo {
    async fn insert_pending(&self, user_id: i64, request_id: &str, text: &str) -> Result<()> {
        LedgerRepo::insert_pending(self, user_id, request_id, text).await
    }

    async fn mark_status(&self, request_id: &str, status: RequestStatus) -> Result<()> {
        LedgerRepo::mark_status(self, request_id, status).await
    }
}
