//! Accessor configuration loaded from environment variables.

use std::time::Duration;

/// Retry and timeout policy for the read path.
///
/// Injected rather than hard-coded so tests can run with millisecond
/// backoffs. Only `get` retries; `create` and `delete` issue a single
/// attempt each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (so 3 means 4 attempts total).
    pub max_retries: u32,

    /// Per-attempt timeout; each retry gets a fresh budget.
    pub request_timeout: Duration,

    /// Delay before the first retry; doubles on each subsequent retry.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Returns the backoff delay preceding the given retry (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff_base * (1u32 << retry.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            request_timeout: Duration::from_secs(10),
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Accessor configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `PENDING_STORE_URL` — base URL of the webhook proxy (default: `"http://localhost:3000"`)
/// - `PENDING_STORE_MAX_RETRIES` — read-path retries (default: `3`)
/// - `PENDING_STORE_TIMEOUT_SECS` — per-attempt timeout (default: `10`)
/// - `PENDING_STORE_BACKOFF_MS` — first retry delay (default: `1000`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub base_url: String,
    pub retry: RetryPolicy,
}

impl StoreConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = RetryPolicy::default();
        Self {
            base_url: std::env::var("PENDING_STORE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            retry: RetryPolicy {
                max_retries: std::env::var("PENDING_STORE_MAX_RETRIES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_retries),
                request_timeout: std::env::var("PENDING_STORE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.request_timeout),
                backoff_base: std::env::var("PENDING_STORE_BACKOFF_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.backoff_base),
            },
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.request_timeout, Duration::from_secs(10));
        assert_eq!(policy.backoff_base, Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_doubles_per_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_with_fast_base() {
        let policy = RetryPolicy {
            max_retries: 3,
            request_timeout: Duration::from_millis(250),
            backoff_base: Duration::from_millis(10),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(10));
        assert_eq!(policy.delay_for(2), Duration::from_millis(40));
    }

    #[test]
    fn test_config_default() {
        let config = StoreConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.retry, RetryPolicy::default());
    }
}
