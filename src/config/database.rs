//! Database configuration, re-exported from `shopfront-db`.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)

pub use shopfront_db::{DbInitError, PgPool, init_db_pool, run_migrations};
