//! Per-user in-flight question guard.
//!
//! One question per user at a time: a second message while a poll loop
//! is still running gets a "please wait" reply instead of interleaving
//! limiter and ledger writes for the same user.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-memory set of users with a question currently in flight.
#[derive(Clone)]
pub struct InFlightQuestions {
    data: Arc<DashMap<i64, ()>>,
}

impl InFlightQuestions {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
        }
    }

    /// Claim the slot for a user.
    ///
    /// Returns `None` when a question is already in flight. The claim
    /// releases the slot on drop, including early returns.
    pub fn try_claim(&self, user_id: i64) -> Option<InFlightClaim> {
        match self.data.entry(user_id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(InFlightClaim {
                    data: Arc::clone(&self.data),
                    user_id,
                })
            }
        }
    }
}

impl Default for InFlightQuestions {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII claim on a user's question slot.
pub struct InFlightClaim {
    data: Arc<DashMap<i64, ()>>,
    user_id: i64,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.data.remove(&self.user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_and_release() {
        let guard = InFlightQuestions::new();

        let claim = guard.try_claim(1);
        assert!(claim.is_some());
        // Second claim for the same user is refused while held.
        assert!(guard.try_claim(1).is_none());
        // Other users are unaffected.
        assert!(guard.try_claim(2).is_some());

        drop(claim);
        assert!(guard.try_claim(1).is_some());
    }
}
