//! Paystack webhook signatures.
//!
//! `x-paystack-signature` is the lowercase hex HMAC-SHA512 of the raw request
//! body keyed with the account secret key.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use tracing::warn;

type HmacSha512 = Hmac<Sha512>;

/// Verifies `signature` over `raw_body`.
///
/// Returns `false` for a missing secret, malformed hex, or a mismatch. The
/// comparison is constant time.
pub fn verify(secret: Option<&str>, signature: &str, raw_body: &[u8]) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        warn!("Webhook signature check without a configured secret key");
        return false;
    };

    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&expected).is_ok()
}

/// Produces the header value the provider would send for `raw_body`.
pub fn sign(secret: &str, raw_body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(raw_body);
    hex::encode(mac.finalize().into_bytes())
}
