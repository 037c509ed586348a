//! Request extractors for authentication and authorization.
//!
//! - [`auth`]: `AuthUser`, resolved from a bearer token or the `token` cookie
//! - [`role`]: `RequireAdmin`, which additionally checks the user's role
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::AuthUser;
//! use crate::middleware::role::RequireAdmin;
//!
//! async fn create(auth_user: AuthUser) -> impl IntoResponse { /* any user */ }
//!
//! async fn delete(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse { /* admins */ }
//! ```

pub mod auth;
pub mod role;
