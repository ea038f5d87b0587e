//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Time-to-live for cache entries.
    pub ttl: Option<Duration>,

    /// Time-to-idle for cache entries.
    pub tti: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(300)),
            tti: None,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with the given max capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            max_capacity,
            ..Default::default()
        }
    }

    /// Set time-to-live for cache entries.
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = Some(duration);
        self
    }

    /// Roster entries are checked on every incoming message, so they
    /// stay hot; writes invalidate explicitly.
    pub fn roster() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(600)),
            tti: None,
        }
    }

    /// Templates rarely change and there are only a handful of keys.
    pub fn templates() -> Self {
        Self {
            max_capacity: 100,
            ttl: Some(Duration::from_secs(3600)),
            tti: None,
        }
    }
}
