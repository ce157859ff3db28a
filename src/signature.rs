//! HMAC-SHA256 signature helpers for gateway callbacks and webhooks.
//!
//! The gateway signs client-side checkout callbacks over `order_id|payment_id`
//! and webhook deliveries over the raw request body bytes. Verification always
//! recomputes the digest and compares in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded HMAC-SHA256 of `message` under `secret`.
pub fn compute_signature(message: &[u8], secret: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Message signed by the gateway for client-side payment verification.
pub fn payment_message(order_id: &str, payment_id: &str) -> String {
    format!("{}|{}", order_id, payment_id)
}

/// Recompute the digest for `message` and compare against `candidate`.
pub fn verify(message: &[u8], secret: &[u8], candidate: &str) -> bool {
    let expected = compute_signature(message, secret);
    constant_time_eq(&expected, candidate)
}

/// Length-and-time-invariant equality for secrets and digests.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
