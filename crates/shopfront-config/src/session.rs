//! Signed session cookie configuration.
//!
//! The same secret signs cookies issued by the HTTP session login and
//! verifies them when a websocket connects, so both sides must read it
//! from here.

use std::env;

/// Session cookie configuration.
///
/// # Environment Variables
///
/// - `SESSION_SECRET`: HMAC secret used to sign session ids (default: `your-secret-key`)
/// - `SESSION_COOKIE_NAME`: Cookie name (default: `connect.sid`)
/// - `SESSION_MAX_AGE`: Session lifetime in seconds (default: 3600)
/// - `SESSION_COOKIE_SECURE`: Set the `Secure` attribute (default: false)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub secret: String,
    pub cookie_name: String,
    pub max_age_secs: i64,
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: "your-secret-key".to_string(),
            cookie_name: "connect.sid".to_string(),
            max_age_secs: 3600,
            secure: false,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            secret: env::var("SESSION_SECRET").unwrap_or(defaults.secret),
            cookie_name: env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            max_age_secs: env::var("SESSION_MAX_AGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &i64| *v > 0)
                .unwrap_or(defaults.max_age_secs),
            secure: env::var("SESSION_COOKIE_SECURE")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.secure),
        }
    }
}
