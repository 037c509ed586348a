//! # Shopfront Core
//!
//! Core types, errors, and utilities shared by every Shopfront crate.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Page/limit query parameters for search endpoints
//! - [`password`]: bcrypt password hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use shopfront_core::errors::AppError;
//! use shopfront_core::pagination::PageParams;
//! use shopfront_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Product not found"));
//!
//! let hash = hash_password("secure_password")?;
//!
//! let params = PageParams::default();
//! let skip = params.skip();
//! ```

pub mod errors;
pub mod pagination;
pub mod password;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use pagination::PageParams;
pub use password::{hash_password, verify_password};
