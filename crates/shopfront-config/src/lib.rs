//! # Shopfront Config
//!
//! Configuration types for the Shopfront API, loaded from environment variables:
//!
//! - [`jwt`]: JWT access/refresh token configuration
//! - [`session`]: Signed session cookie configuration
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`rate_limit`]: API rate limiting configuration
//!
//! # Example
//!
//! ```ignore
//! use shopfront_config::{CorsConfig, JwtConfig, RateLimitConfig, SessionConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let session_config = SessionConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod session;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use session::SessionConfig;
