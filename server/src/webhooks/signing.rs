//! HMAC-SHA256 Payload Signatures
//!
//! Verifies the `X-Hub-Signature-256` header sent with event deliveries.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Prefix of the header value before the hex digest.
const SIGNATURE_PREFIX: &str = "sha256=";

/// Sign a payload with HMAC-SHA256 and return the hex-encoded signature.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a `sha256=<hex>` header value against a payload.
pub fn verify_signature(secret: &str, payload: &[u8], header_value: &str) -> bool {
    let Some(signature) = header_value.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let expected = sign_payload(secret, payload);
    let signature = signature.to_ascii_lowercase();
    // Constant-time comparison
    expected.len() == signature.len()
        && expected
            .as_bytes()
            .iter()
            .zip(signature.as_bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Build the `X-Hub-Signature-256` value for a payload.
pub fn signature_header(secret: &str, payload: &[u8]) -> String {
    format!("{SIGNATURE_PREFIX}{}", sign_payload(secret, payload))
}
