// HMAC request signing
//
// The Visionect server verifies signed requests byte-for-byte: the same
// serialized body that was hashed must go on the wire, and the Date and
// Content-Type headers must be exactly the values that entered the
// canonical string. Pure functions only; the executor owns the I/O.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Content type used for all signed requests, body or not.
pub const CONTENT_TYPE: &str = "application/json";

/// Header values a signed request MUST carry verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// `Authorization: {key}:{base64(hmac-sha256(canonical))}`
    pub authorization: String,
    /// `Date` in RFC 1123 form, identical to the value that was signed.
    pub date: String,
    /// `Content-Type`, always `application/json`.
    pub content_type: &'static str,
}

/// Format a timestamp per RFC 1123, e.g. `Tue, 15 Nov 1994 08:12:31 GMT`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Sign one request.
///
/// `path` is the exact wire path (no scheme, host, or query). `body` is the
/// exact serialized JSON payload, or `None` for bodyless methods -- those
/// hash to an empty string so the canonical form always has five lines:
///
/// ```text
/// METHOD\nBODY_SHA256_HEX\nCONTENT_TYPE\nHTTP_DATE\nPATH
/// ```
pub fn sign(
    key: &str,
    secret: &SecretString,
    method: &str,
    path: &str,
    body: Option<&[u8]>,
    date: &str,
) -> SignedHeaders {
    let body_hash = match body {
        Some(bytes) => hex::encode(Sha256::digest(bytes)),
        None => String::new(),
    };

    let method = method.to_uppercase();
    let canonical = format!("{method}\n{body_hash}\n{CONTENT_TYPE}\n{date}\n{path}");

    // HMAC-SHA256 accepts keys of any length, so this cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC key of any length is valid");
    mac.update(canonical.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    SignedHeaders {
        authorization: format!("{key}:{signature}"),
        date: date.to_owned(),
        content_type: CONTENT_TYPE,
    }
}
