//! Access-token expiry decoding.
//!
//! Access tokens are JWTs; the expiry the session manager stores is the
//! token's own `exp` claim converted to epoch-milliseconds. Signature
//! verification is the server's job, so only the payload segment is read.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Decode the `exp` claim of a JWT into epoch-milliseconds.
///
/// Returns `None` for anything that is not a readable three-segment JWT with
/// a numeric `exp` claim.
pub(crate) fn decode_expiry_ms(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp_secs = claims.get("exp")?.as_i64()?;
    exp_secs.checked_mul(1000)
}
