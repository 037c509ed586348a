//! Signed session identifiers.
//!
//! A session cookie value has the form `s:<id>.<signature>` where the
//! signature is the HMAC-SHA256 of `<id>` under the session secret, base64
//! encoded with the standard alphabet and no `=` padding. This is the format
//! produced by the widely used `cookie-signature` scheme, so cookies issued
//! by other session middlewares sharing the secret verify here too.

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Marker that distinguishes signed cookie values from plain ones.
pub const SIGNED_PREFIX: &str = "s:";

/// Reasons a cookie value could not be turned back into a session id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The value does not start with `s:`; it was never signed.
    #[error("cookie value is not signed")]
    NotSigned,

    /// The value claims to be signed but the signature does not verify.
    #[error("cookie signature mismatch")]
    Mismatch,
}

fn mac_for(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size")
}

/// Computes the unpadded base64 signature for a session id.
pub fn signature(session_id: &str, secret: &str) -> String {
    let mut mac = mac_for(secret);
    mac.update(session_id.as_bytes());
    STANDARD_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Produces the full cookie value `s:<id>.<signature>`.
pub fn sign_session_id(session_id: &str, secret: &str) -> String {
    format!(
        "{}{}.{}",
        SIGNED_PREFIX,
        session_id,
        signature(session_id, secret)
    )
}

/// Verifies a cookie value and returns the bare session id.
///
/// The cookie value must already be percent-decoded. The signature is split
/// off at the last `.` and compared in constant time.
pub fn unsign_session_id(value: &str, secret: &str) -> Result<String, SignatureError> {
    let signed = value
        .strip_prefix(SIGNED_PREFIX)
        .ok_or(SignatureError::NotSigned)?;

    let (session_id, provided) = signed.rsplit_once('.').ok_or(SignatureError::Mismatch)?;

    let provided = STANDARD_NO_PAD
        .decode(provided)
        .map_err(|_| SignatureError::Mismatch)?;

    let mut mac = mac_for(secret);
    mac.update(session_id.as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| SignatureError::Mismatch)?;

    Ok(session_id.to_string())
}
