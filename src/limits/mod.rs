//! Per-user question rate limiting.
//!
//! Gates the question flow on two quotas: an absolute (lifetime) limit
//! and a rolling 7-day limit. The decision itself is the pure
//! [`QuotaRecord::check_and_consume`]; this module loads the record,
//! applies the decision and persists the outcome.
//!
//! A denial is a first-class verdict, not an error: only storage
//! failures surface as `Err`.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::debug;

use crate::database::{QuotaRecord, QuotaRepo};

/// Why a question was denied.
///
/// The display strings are the stable reason identifiers used in the
/// activity log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LimitExceeded {
    #[error("absolute_limit_exceeded")]
    Absolute,
    #[error("weekly_limit_exceeded")]
    Weekly,
}

/// Verdict of one check-and-consume call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitVerdict {
    Allowed,
    Denied(LimitExceeded),
}

impl LimitVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, LimitVerdict::Allowed)
    }
}

/// The rate limiter over the quota repository.
#[derive(Clone)]
pub struct RateLimiter {
    quotas: Arc<QuotaRepo>,
}

impl RateLimiter {
    pub fn new(quotas: Arc<QuotaRepo>) -> Self {
        Self { quotas }
    }

    /// Decide whether one question by `user_id` may proceed and, if so,
    /// record the consumption.
    ///
    /// The quota record is created lazily (unlimited) on first use. On
    /// an allowed call the incremented counters are persisted together;
    /// on a denial the record is persisted only when the weekly window
    /// rolled during the check.
    pub async fn check_and_consume(&self, user_id: i64) -> Result<LimitVerdict> {
        let mut record = self.quotas.get_or_create(user_id).await?;
        let now = chrono::Utc::now().timestamp();

        let check = record.check_and_consume(now);
        if check.dirty {
            self.quotas.save(&record).await?;
        }

        if let LimitVerdict::Denied(reason) = check.verdict {
            debug!("User {} denied by limiter: {}", user_id, reason);
        }

        Ok(check.verdict)
    }

    /// Current quota record for display, if any.
    pub async fn quota(&self, user_id: i64) -> Result<Option<QuotaRecord>> {
        self.quotas.get(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        assert_eq!(LimitExceeded::Absolute.to_string(), "absolute_limit_exceeded");
        assert_eq!(LimitExceeded::Weekly.to_string(), "weekly_limit_exceeded");
    }

    #[test]
    fn test_verdict() {
        assert!(LimitVerdict::Allowed.is_allowed());
        assert!(!LimitVerdict::Denied(LimitExceeded::Weekly).is_allowed());
    }
}
