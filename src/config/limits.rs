use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Request budget configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Per-caller rate limiting on the lookup endpoint.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl LimitsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limit.validate()
    }
}

/// Fixed-window rate limiting keyed by the caller's claimed address.
///
/// Counters live in process memory and are never evicted; the number of
/// distinct callers is expected to be bounded by the deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Requests admitted per caller within one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Headers consulted, in order, for the caller's address.
    /// For comma-separated values the leftmost entry is used.
    #[serde(default = "default_caller_key_headers")]
    pub caller_key_headers: Vec<String>,

    /// Key shared by every caller whose address cannot be determined.
    #[serde(default = "default_fallback_key")]
    pub fallback_key: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            caller_key_headers: default_caller_key_headers(),
            fallback_key: default_fallback_key(),
        }
    }
}

impl RateLimitConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::Validation(
                "limits.rate_limit.max_requests must be at least 1".into(),
            ));
        }
        if self.window_secs == 0 {
            return Err(ConfigError::Validation(
                "limits.rate_limit.window_secs must be at least 1".into(),
            ));
        }
        if self.fallback_key.is_empty() {
            return Err(ConfigError::Validation(
                "limits.rate_limit.fallback_key cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Window length in milliseconds.
    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    60
}

fn default_caller_key_headers() -> Vec<String> {
    vec!["X-Real-IP".to_string(), "X-Forwarded-For".to_string()]
}

fn default_fallback_key() -> String {
    "unknown".to_string()
}
