//! HMAC-SHA256 verification of inbound GitHub notifications.
//!
//! GitHub signs each delivery with the webhook secret and sends the result in
//! the `X-Hub-Signature-256` header as `sha256=<hex>`. Deliveries are checked
//! before anything else looks at the body.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Parses a `sha256=<hex>` header value into the raw signature bytes.
///
/// Returns `None` for a missing prefix, another algorithm, or bad hex.
///
/// # Examples
///
/// ```
/// use tbr_audit::webhooks::parse_signature_header;
///
/// assert_eq!(parse_signature_header("sha256=0aff"), Some(vec![0x0a, 0xff]));
/// assert!(parse_signature_header("0aff").is_none());
/// assert!(parse_signature_header("sha1=0aff").is_none());
/// assert!(parse_signature_header("sha256=zz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.trim().strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// Checks `signature_header` against the HMAC of `payload` under `secret`.
///
/// The comparison is constant time. Malformed headers are simply invalid.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Builds the header GitHub would send for `payload`.
#[cfg(test)]
pub(crate) fn sign_payload(payload: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
