//! Configuration for the Shopfront API.
//!
//! Each config type is loaded from environment variables by its
//! `from_env()` constructor; see the owning crate for variable names and
//! defaults.
//!
//! - [`database`]: PostgreSQL pool initialization and migrations
//! - [`JwtConfig`], [`SessionConfig`], [`CorsConfig`], [`RateLimitConfig`]: from `shopfront-config`
//! - [`CacheConfig`]: from `shopfront-cache`

pub mod database;

pub use shopfront_cache::CacheConfig;
pub use shopfront_config::{CorsConfig, JwtConfig, RateLimitConfig, SessionConfig};
