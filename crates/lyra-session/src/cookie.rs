//! Signed session cookies
//!
//! The session id travels in a `connect.sid` cookie signed the way
//! express does it: `s:<sid>.<sig>` where `<sig>` is the unpadded base64
//! HMAC-SHA256 of the sid under the shared secret.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Cookie name carrying the session id
pub const SESSION_COOKIE: &str = "connect.sid";

const SIGNED_PREFIX: &str = "s:";

/// Sign a session id into a cookie value
pub fn sign(sid: &str, secret: &str) -> String {
    format!("{SIGNED_PREFIX}{sid}.{}", signature(sid, secret))
}

/// Verify a cookie value and return the session id it carries.
///
/// The signature comparison is constant time.
pub fn unsign(value: &str, secret: &str) -> Option<String> {
    let signed = value.strip_prefix(SIGNED_PREFIX)?;
    let (sid, sig) = signed.rsplit_once('.')?;

    let tag = STANDARD_NO_PAD
        .decode(sig.trim_end_matches('='))
        .ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(sid.as_bytes());
    mac.verify_slice(&tag).ok()?;

    Some(sid.to_owned())
}

/// Extract and verify the session id from a raw `Cookie:` header
pub fn session_id_from_header(header: &str, secret: &str) -> Option<String> {
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(SESSION_COOKIE) {
            let value = value.strip_prefix('=')?;
            return unsign(&percent_decode(value), secret);
        }
    }
    None
}

fn signature(sid: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(sid.as_bytes());
    STANDARD_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Cookie values arrive percent-encoded (`s%3A...`); decode just enough
/// to recover the signed value.
fn percent_decode(value: &str) -> String {
    let mut decoded: Vec<u8> = Vec::with_capacity(value.len());
    let mut bytes = value.bytes();
    while let Some(b) = bytes.next() {
        if b == b'%' {
            match (bytes.next(), bytes.next()) {
                (Some(hi), Some(lo)) => {
                    let hex = [hi, lo];
                    match std::str::from_utf8(&hex)
                        .ok()
                        .and_then(|s| u8::from_str_radix(s, 16).ok())
                    {
                        Some(v) => decoded.push(v),
                        None => decoded.extend_from_slice(&[b, hi, lo]),
                    }
                }
                _ => decoded.push(b),
            }
        } else {
            decoded.push(b);
        }
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "swordfish";

    #[test]
    fn test_sign_unsign_roundtrip() {
        let value = sign("abc123", SECRET);
        assert!(value.starts_with("s:abc123."));
        assert_eq!(unsign(&value, SECRET), Some("abc123".to_owned()));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let value = sign("abc123", SECRET);
        let forged = value.replace("abc123", "abc124");
        assert_eq!(unsign(&forged, SECRET), None);
        assert_eq!(unsign(&value, "wrong-secret"), None);
    }

    #[test]
    fn test_unsigned_value_rejected() {
        assert_eq!(unsign("abc123", SECRET), None);
        assert_eq!(unsign("s:abc123", SECRET), None);
    }

    #[test]
    fn test_header_extraction() {
        let value = sign("sess-9", SECRET);
        let encoded = value.replace(':', "%3A");
        let header = format!("theme=dark; connect.sid={encoded}; lang=en");
        assert_eq!(
            session_id_from_header(&header, SECRET),
            Some("sess-9".to_owned())
        );
    }

    #[test]
    fn test_header_without_session_cookie() {
        assert_eq!(session_id_from_header("theme=dark", SECRET), None);
    }
}
