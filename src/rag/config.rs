//! RAG gateway configuration.

use std::env;
use std::time::Duration;

/// Configuration for the RAG gateway.
///
/// `poll_interval * max_attempts` bounds the worst-case wait for one
/// question (default 3 s x 100 = 300 s) and is the effective request
/// timeout; tune the two variables as a single knob.
#[derive(Debug, Clone)]
pub struct RagConfig {
    pub api_url: String,
    pub api_key: String,
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Maximum number of status polls per request.
    pub max_attempts: u32,
    /// When set, skip the network entirely and answer with a canned
    /// string.
    pub test_mode: bool,
}

impl RagConfig {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if `RAG_API_URL` or `RAG_API_KEY` is missing while test
    /// mode is off.
    pub fn from_env() -> Self {
        let test_mode = env::var("RAG_TEST")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        let api_url = match env::var("RAG_API_URL") {
            Ok(url) => url,
            Err(_) if test_mode => String::new(),
            Err(_) => panic!("RAG_API_URL must be set"),
        };
        let api_key = match env::var("RAG_API_KEY") {
            Ok(key) => key,
            Err(_) if test_mode => String::new(),
            Err(_) => panic!("RAG_API_KEY must be set"),
        };

        let poll_interval_sec = env::var("RAG_POLL_INTERVAL_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(3);
        let max_attempts = env::var("RAG_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(100);

        Self {
            api_url,
            api_key,
            poll_interval: Duration::from_secs(poll_interval_sec),
            max_attempts,
            test_mode,
        }
    }
}

/// Truthy env values: `true`, `1`, `yes`, `on` (case-insensitive).
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("true"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
        assert!(is_truthy(" on "));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("enabled"));
    }
}
