//! HMAC-SHA256 signature primitives for webhook authentication.
//!
//! Kapost signs each request with an HMAC-SHA256 over the concatenation
//! of the platform identifier, the action name, and the raw request
//! body, keyed with the shared signature secret. The resulting digest
//! is hex-encoded and prefixed with `sha256=`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Prefix carried by every well-formed signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Computes the expected signature header value for a request.
///
/// Returns the full `sha256=<hex>` string, ready for constant-time
/// comparison against the presented `X-Kapost-Signature` value.
///
/// # Errors
///
/// Returns `WebhookError::InvalidSignature` if the MAC cannot be keyed
/// with the configured secret.
pub fn expected_signature(
    secret: &str,
    platform: &str,
    action: &str,
    body: &[u8],
) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;

    mac.update(platform.as_bytes());
    mac.update(action.as_bytes());
    mac.update(body);

    let digest = mac.finalize().into_bytes();
    Ok(format!("{SIGNATURE_PREFIX}{}", hex::encode(digest)))
}

/// Timing-safe string comparison to prevent timing attacks.
///
/// Accumulates the XOR of every byte pair so the comparison time does
/// not depend on the position of the first mismatch. Length is checked
/// up front; both sides of real comparisons are fixed-length digests or
/// configured keys, so the length itself is not secret.
pub fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.as_bytes().iter().zip(b.as_bytes()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_signature_carries_prefix_and_hex_digest() {
        let signature = expected_signature("secret", "kapost", "publish", b"{}").unwrap();

        assert!(signature.starts_with(SIGNATURE_PREFIX));
        let hex_part = &signature[SIGNATURE_PREFIX.len()..];
        assert_eq!(hex_part.len(), 64); // SHA256 hex is 64 chars
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn expected_signature_is_deterministic() {
        let first = expected_signature("secret", "kapost", "auth", b"body").unwrap();
        let second = expected_signature("secret", "kapost", "auth", b"body").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn expected_signature_covers_all_three_inputs() {
        let base = expected_signature("secret", "kapost", "auth", b"body").unwrap();

        assert_ne!(base, expected_signature("other", "kapost", "auth", b"body").unwrap());
        assert_ne!(base, expected_signature("secret", "other", "auth", b"body").unwrap());
        assert_ne!(base, expected_signature("secret", "kapost", "publish", b"body").unwrap());
        assert_ne!(base, expected_signature("secret", "kapost", "auth", b"other").unwrap());
    }

    #[test]
    fn concatenation_order_is_platform_action_body() {
        // Incremental updates must be equivalent to hashing the joined
        // string, which is what callers sign against.
        let joined = expected_signature("secret", "", "", b"kapostauthbody").unwrap();
        let split = expected_signature("secret", "kapost", "auth", b"body").unwrap();
        assert_eq!(joined, split);
    }

    #[test]
    fn timing_safe_eq_same() {
        assert!(timing_safe_eq("sha256=abc", "sha256=abc"));
    }

    #[test]
    fn timing_safe_eq_rejects_any_differing_position() {
        // Mismatches at the first, middle, and last byte all fail the
        // same way regardless of position.
        assert!(!timing_safe_eq("abcdef", "xbcdef"));
        assert!(!timing_safe_eq("abcdef", "abcxef"));
        assert!(!timing_safe_eq("abcdef", "abcdex"));
    }

    #[test]
    fn timing_safe_eq_rejects_length_mismatch() {
        assert!(!timing_safe_eq("short", "short_but_longer"));
        assert!(!timing_safe_eq("", "x"));
    }

    #[test]
    fn timing_safe_eq_empty_strings_match() {
        assert!(timing_safe_eq("", ""));
    }
}
