//! Webhook payload signature verification.
//!
//! Gitea signs each delivery with an HMAC-SHA256 over the raw request body,
//! sent hex-encoded in the `X-Gitea-Signature` header. Verification
//! recomputes the MAC and compares in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;

type HmacSha256 = Hmac<Sha256>;

/// Verifies the signature of a webhook delivery.
///
/// Accepts both the bare hex digest Gitea sends and the `sha256=`-prefixed
/// form other platforms use. Returns `false` for malformed signatures of
/// any kind; verification itself is constant-time.
///
/// Whether an *absent* secret means "accept everything" is the caller's
/// decision, made explicitly at the call site.
pub fn verify_signature(secret: &str, body: &[u8], provided: &str) -> bool {
    let provided = provided.trim();
    let provided = provided.strip_prefix("sha256=").unwrap_or(provided);

    let Ok(signature) = hex::decode(provided) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);

    mac.verify_slice(&signature).is_ok()
}
