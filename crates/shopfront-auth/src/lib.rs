//! # Shopfront Auth
//!
//! Token and session-cookie primitives for the Shopfront API.
//!
//! - [`claims`]: JWT claim structures for access and refresh tokens
//! - [`jwt`]: Token creation and verification
//! - [`session_signature`]: HMAC signing of session ids carried in cookies
//!
//! # Credentials
//!
//! - **Access Token** ([`Claims`]): short-lived bearer token for the JSON API
//! - **Refresh Token** ([`RefreshTokenClaims`]): longer-lived token exchanged for new access tokens
//! - **Session cookie**: `s:<id>.<signature>`, issued by the session login and
//!   read back by the chat websocket
//!
//! # Example
//!
//! ```ignore
//! use shopfront_auth::{create_access_token, sign_session_id, unsign_session_id, verify_token};
//! use shopfront_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "alice", "user", &config)?;
//! let claims = verify_token(&token, &config)?;
//!
//! let cookie_value = sign_session_id("abc123", "secret");
//! assert_eq!(unsign_session_id(&cookie_value, "secret")?, "abc123");
//! ```

pub mod claims;
pub mod jwt;
pub mod session_signature;

// Re-export commonly used types at crate root
pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
pub use session_signature::{SignatureError, sign_session_id, unsign_session_id};
