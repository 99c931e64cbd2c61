//! Event signature verification
//!
//! Events carry `X-Hub-Signature: sha1=<hex>`, an HMAC-SHA1 of the raw body
//! keyed with the shared webhook secret. SHA-1 is kept only because the
//! sender still signs that header with it.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
const ALGORITHM: &str = "sha1";

/// The signature header could not be checked at all
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header X-Hub-Signature is missing")]
    Missing,

    #[error("signature header is malformed: {0}")]
    Malformed(String),

    #[error("signature algorithm {0} is not supported")]
    UnsupportedAlgorithm(String),

    #[error("webhook secret cannot be used as an HMAC key")]
    InvalidKey,
}

/// Checks `header` against the HMAC of `payload` under `secret`
///
/// Returns `Ok(false)` on a digest mismatch, including a digest written in
/// upper-case hex. Errors are reserved for headers that cannot be evaluated:
/// absent, not `<algorithm>=<hex>`, or naming an algorithm other than `sha1`.
pub fn verify(secret: &[u8], payload: &[u8], header: Option<&str>) -> Result<bool, SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;

    let (algorithm, digest) = header
        .split_once('=')
        .ok_or_else(|| SignatureError::Malformed("expected <algorithm>=<digest>".to_string()))?;

    if algorithm != ALGORITHM {
        return Err(SignatureError::UnsupportedAlgorithm(algorithm.to_string()));
    }

    let expected = hex::decode(digest)
        .map_err(|e| SignatureError::Malformed(format!("digest is not hex: {e}")))?;

    // Senders emit lower-case hex only
    if digest.bytes().any(|b| b.is_ascii_uppercase()) {
        return Ok(false);
    }

    let mut mac = HmacSha1::new_from_slice(secret).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(payload);

    Ok(mac.verify_slice(&expected).is_ok())
}

/// Produces the header value a sender would attach to `payload`
pub fn sign(secret: &[u8], payload: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha1::new_from_slice(secret).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(payload);
    let digest = hex::encode(mac.finalize().into_bytes());
    Ok(format!("{ALGORITHM}={digest}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"It's a Secret to Everybody";
    const PAYLOAD: &[u8] = b"Hello, World!";

    #[test]
    fn test_known_digest() {
        // HMAC-SHA1 of PAYLOAD under SECRET
        let header = sign(SECRET, PAYLOAD).unwrap();
        assert_eq!(header, "sha1=01dc10d0c83e72ed246219cdd91669667fe2ca59");
        assert_eq!(verify(SECRET, PAYLOAD, Some(&header)), Ok(true));
    }

    #[test]
    fn test_uppercase_digest_is_mismatch() {
        let header = sign(b"k", b"body").unwrap();
        let digest = header.strip_prefix("sha1=").unwrap();
        let upper = format!("sha1={}", digest.to_uppercase());
        assert_ne!(upper, header);

        assert_eq!(verify(b"k", b"body", Some(&header)), Ok(true));
        assert_eq!(verify(b"k", b"body", Some(&upper)), Ok(false));
    }

    #[test]
    fn test_any_single_byte_mutation_fails() {
        let header = sign(SECRET, PAYLOAD).unwrap();

        for i in 0..PAYLOAD.len() {
            let mut tampered = PAYLOAD.to_vec();
            tampered[i] ^= 0x01;
            assert_eq!(verify(SECRET, &tampered, Some(&header)), Ok(false), "byte {i}");
        }
    }

    #[test]
    fn test_wrong_secret_fails() {
        let header = sign(b"other", PAYLOAD).unwrap();
        assert_eq!(verify(SECRET, PAYLOAD, Some(&header)), Ok(false));
    }

    #[test]
    fn test_unusable_headers() {
        assert_eq!(verify(SECRET, PAYLOAD, None), Err(SignatureError::Missing));
        assert!(matches!(
            verify(SECRET, PAYLOAD, Some("01dc10d0")),
            Err(SignatureError::Malformed(_))
        ));
        assert!(matches!(
            verify(SECRET, PAYLOAD, Some("sha1=not-hex")),
            Err(SignatureError::Malformed(_))
        ));
        assert_eq!(
            verify(SECRET, PAYLOAD, Some("sha256=abcd")),
            Err(SignatureError::UnsupportedAlgorithm("sha256".to_string()))
        );
    }

    #[test]
    fn test_short_digest_is_mismatch() {
        assert_eq!(verify(SECRET, PAYLOAD, Some("sha1=01dc")), Ok(false));
    }
}
