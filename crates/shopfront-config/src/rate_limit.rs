//! Rate limiting configuration for the `/api` routes.
//!
//! Uses a token bucket from the Governor crate. A full bucket holds
//! `max_requests` tokens and one token is replenished every
//! `window / max_requests`, which allows `max_requests` per window once the
//! bucket has drained.
//!
//! # Configuration
//!
//! - `RATE_LIMIT_ENABLED`: Toggle the limiter (default: true)
//! - `RATE_LIMIT_WINDOW_SECS`: Window length in seconds (default: 900, 15 minutes)
//! - `RATE_LIMIT_MAX_REQUESTS`: Requests allowed per window and client IP (default: 100)
//!
//! # Example
//!
//! ```ignore
//! use shopfront_config::RateLimitConfig;
//!
//! let config = RateLimitConfig::from_env();
//! if let Some(governor) = config.governor_config() {
//!     router = router.layer(GovernorLayer::new(Arc::new(governor)));
//! }
//! ```

use std::time::Duration;

use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::SmartIpKeyExtractor;

/// Body returned with 429 responses.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later";

/// Rate limit configuration for the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Whether the limiter layer is installed at all.
    pub enabled: bool,

    /// Length of the accounting window in seconds.
    pub window_secs: u64,

    /// Requests allowed per client IP within one window.
    ///
    /// Also used as the burst size.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 900,
            max_requests: 100,
        }
    }
}

impl RateLimitConfig {
    /// Creates a new `RateLimitConfig` from environment variables.
    ///
    /// Falls back to default values if environment variables are not set
    /// or cannot be parsed.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.enabled),
            window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &u64| *v > 0)
                .unwrap_or(defaults.window_secs),
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &u32| *v > 0)
                .unwrap_or(defaults.max_requests),
        }
    }

    /// A disabled config, used by tests that drive the router without a peer address.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Interval after which a single request token is replenished.
    #[must_use]
    pub fn replenish_interval(&self) -> Duration {
        let window_ms = self.window_secs.saturating_mul(1000);
        let per_token = window_ms / u64::from(self.max_requests.max(1));
        Duration::from_millis(per_token.max(1))
    }

    /// Builds the Governor config keyed by client IP.
    ///
    /// Returns `None` when rate limiting is disabled or the builder rejects
    /// the values.
    #[must_use]
    pub fn governor_config(
        &self,
    ) -> Option<GovernorConfig<SmartIpKeyExtractor, ::governor::middleware::NoOpMiddleware>> {
        if !self.enabled {
            return None;
        }

        GovernorConfigBuilder::default()
            .period(self.replenish_interval())
            .burst_size(self.max_requests.max(1))
            .key_extractor(SmartIpKeyExtractor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.window_secs, 900);
        assert_eq!(config.max_requests, 100);
    }

    #[test]
    fn test_replenish_interval_spreads_window() {
        let config = RateLimitConfig::default();
        assert_eq!(config.replenish_interval(), Duration::from_secs(9));
    }

    #[test]
    fn test_replenish_interval_never_zero() {
        let config = RateLimitConfig {
            enabled: true,
            window_secs: 1,
            max_requests: 5000,
        };
        assert_eq!(config.replenish_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_disabled_has_no_governor() {
        assert!(RateLimitConfig::disabled().governor_config().is_none());
    }

    #[test]
    fn test_enabled_builds_governor() {
        assert!(RateLimitConfig::default().governor_config().is_some());
    }
}
