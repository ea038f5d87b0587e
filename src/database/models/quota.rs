//! Per-user question quota record.
//!
//! Tracks an absolute (lifetime) limit and a rolling 7-day limit. The
//! whole check-and-consume decision is applied in memory by
//! [`QuotaRecord::check_and_consume`]; the limiter persists the record
//! once per call according to the returned [`QuotaCheck`].

use serde::{Deserialize, Serialize};

use crate::limits::{LimitExceeded, LimitVerdict};

/// Length of the weekly window in seconds.
pub const WEEK_SECS: i64 = 7 * 24 * 60 * 60;

/// Per-user quota counters and limits.
///
/// Created lazily on the first limiter check with both limits unset
/// (unlimited) and counters at zero.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub user_id: i64,
    /// Lifetime question limit. `None` = unlimited.
    pub absolute_limit: Option<i64>,
    pub absolute_used: i64,
    /// Questions per 7-day window. `None` = unlimited.
    pub weekly_limit: Option<i64>,
    pub weekly_used: i64,
    /// Start of the current weekly window, unix seconds. Set on first
    /// consumption and advanced when a full window has elapsed.
    pub week_start: Option<i64>,
}

/// Outcome of a single check-and-consume decision.
#[derive(Debug)]
pub struct QuotaCheck {
    pub verdict: LimitVerdict,
    /// Whether the record changed and must be persisted. True on every
    /// allowed call, and on a denial that rolled the weekly window.
    pub dirty: bool,
}

impl QuotaRecord {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            absolute_limit: None,
            absolute_used: 0,
            weekly_limit: None,
            weekly_used: 0,
            week_start: None,
        }
    }

    /// Apply one question event at `now` (unix seconds).
    ///
    /// Limits are inclusive: a counter that has reached its limit blocks
    /// further use. The weekly window roll is part of the same decision;
    /// it happens before the weekly comparison and sticks even when the
    /// call is ultimately denied.
    pub fn check_and_consume(&mut self, now: i64) -> QuotaCheck {
        if let Some(limit) = self.absolute_limit {
            if self.absolute_used >= limit {
                return QuotaCheck {
                    verdict: LimitVerdict::Denied(LimitExceeded::Absolute),
                    dirty: false,
                };
            }
        }

        let mut dirty = false;
        if let Some(limit) = self.weekly_limit {
            if let Some(start) = self.week_start {
                if now - start >= WEEK_SECS {
                    self.weekly_used = 0;
                    self.week_start = Some(now);
                    dirty = true;
                }
            }
            if self.weekly_used >= limit {
                return QuotaCheck {
                    verdict: LimitVerdict::Denied(LimitExceeded::Weekly),
                    dirty,
                };
            }
        }

        self.absolute_used += 1;
        self.weekly_used += 1;
        if self.week_start.is_none() {
            self.week_start = Some(now);
        }

        QuotaCheck {
            verdict: LimitVerdict::Allowed,
            dirty: true,
        }
    }

    /// Whether either limit is currently reached.
    pub fn exhausted(&self) -> bool {
        let absolute = self
            .absolute_limit
            .is_some_and(|limit| self.absolute_used >= limit);
        let weekly = self
            .weekly_limit
            .is_some_and(|limit| self.weekly_used >= limit);
        absolute || weekly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_unlimited_by_default() {
        let mut record = QuotaRecord::new(1);
        for _ in 0..1000 {
            let check = record.check_and_consume(NOW);
            assert!(matches!(check.verdict, LimitVerdict::Allowed));
            assert!(check.dirty);
        }
        assert_eq!(record.absolute_used, 1000);
        assert_eq!(record.weekly_used, 1000);
        assert_eq!(record.week_start, Some(NOW));
    }

    #[test]
    fn test_absolute_limit_is_inclusive() {
        let mut record = QuotaRecord::new(1);
        record.absolute_limit = Some(3);

        for _ in 0..3 {
            assert!(matches!(
                record.check_and_consume(NOW).verdict,
                LimitVerdict::Allowed
            ));
        }

        // The (N+1)-th call is denied and nothing is mutated.
        let check = record.check_and_consume(NOW);
        assert!(matches!(
            check.verdict,
            LimitVerdict::Denied(LimitExceeded::Absolute)
        ));
        assert!(!check.dirty);
        assert_eq!(record.absolute_used, 3);
    }

    #[test]
    fn test_weekly_limit_within_window() {
        let mut record = QuotaRecord::new(1);
        record.weekly_limit = Some(2);

        assert!(matches!(
            record.check_and_consume(NOW).verdict,
            LimitVerdict::Allowed
        ));
        assert!(matches!(
            record.check_and_consume(NOW + 60).verdict,
            LimitVerdict::Allowed
        ));

        let check = record.check_and_consume(NOW + 120);
        assert!(matches!(
            check.verdict,
            LimitVerdict::Denied(LimitExceeded::Weekly)
        ));
        assert!(!check.dirty);
        assert_eq!(record.weekly_used, 2);
        // Window start stays at the first consumption.
        assert_eq!(record.week_start, Some(NOW));
    }

    #[test]
    fn test_weekly_window_reset_allows_again() {
        let mut record = QuotaRecord::new(1);
        record.weekly_limit = Some(5);
        record.weekly_used = 5;
        record.week_start = Some(NOW - WEEK_SECS - 1);

        let check = record.check_and_consume(NOW);
        assert!(matches!(check.verdict, LimitVerdict::Allowed));
        assert!(check.dirty);
        // Post-reset the call itself consumed one.
        assert_eq!(record.weekly_used, 1);
        assert_eq!(record.week_start, Some(NOW));
    }

    #[test]
    fn test_window_roll_persists_on_denial() {
        // weekly_limit = 0: the roll happens, then the call is denied.
        let mut record = QuotaRecord::new(1);
        record.weekly_limit = Some(0);
        record.weekly_used = 4;
        record.week_start = Some(NOW - WEEK_SECS - 60);

        let check = record.check_and_consume(NOW);
        assert!(matches!(
            check.verdict,
            LimitVerdict::Denied(LimitExceeded::Weekly)
        ));
        assert!(check.dirty);
        assert_eq!(record.weekly_used, 0);
        assert_eq!(record.week_start, Some(NOW));
    }

    #[test]
    fn test_absolute_denial_checked_before_weekly_roll() {
        let mut record = QuotaRecord::new(1);
        record.absolute_limit = Some(1);
        record.absolute_used = 1;
        record.weekly_limit = Some(10);
        record.week_start = Some(NOW - WEEK_SECS - 1);
        record.weekly_used = 10;

        let check = record.check_and_consume(NOW);
        assert!(matches!(
            check.verdict,
            LimitVerdict::Denied(LimitExceeded::Absolute)
        ));
        // Absolute denial happens before the weekly branch; no roll.
        assert!(!check.dirty);
        assert_eq!(record.weekly_used, 10);
    }

    #[test]
    fn test_elapsed_just_under_a_week_keeps_window() {
        let mut record = QuotaRecord::new(1);
        record.weekly_limit = Some(1);
        record.weekly_used = 1;
        record.week_start = Some(NOW - WEEK_SECS + 1);

        let check = record.check_and_consume(NOW);
        assert!(matches!(
            check.verdict,
            LimitVerdict::Denied(LimitExceeded::Weekly)
        ));
        assert_eq!(record.week_start, Some(NOW - WEEK_SECS + 1));
    }

    #[test]
    fn test_exhausted() {
        let mut record = QuotaRecord::new(1);
        assert!(!record.exhausted());
        record.weekly_limit = Some(2);
        record.weekly_used = 2;
        assert!(record.exhausted());
        record.weekly_used = 1;
        assert!(!record.exhausted());
        record.absolute_limit = Some(1);
        record.absolute_used = 1;
        assert!(record.exhausted());
    }
}
