//! Signed session token generation and validation.
//!
//! Token layout before encoding:
//!
//! ```text
//! +-----------------------------+---------------------------------+
//! | 32 crypto random id bytes   | HMAC-SHA256(key, id bytes)      |
//! +-----------------------------+---------------------------------+
//! ```
//!
//! The 64 bytes are encoded as unpadded URL-safe base64. Validation needs
//! only the key, so forged tokens are rejected before any store is touched.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{SessionId, SigningKey};
use crate::error::TokenError;

type HmacSha256 = Hmac<Sha256>;

/// Length of the random identifier segment.
pub const ID_LENGTH: usize = 32;

/// Length of the identifier plus its signature.
pub const SIGNED_LENGTH: usize = ID_LENGTH + 32;

fn keyed_mac(key: &SigningKey) -> Result<HmacSha256, TokenError> {
    if key.is_empty() {
        return Err(TokenError::EmptyKey);
    }
    HmacSha256::new_from_slice(key.as_bytes()).map_err(|_| TokenError::EmptyKey)
}

/// Create a new signed session token.
///
/// Fails with [`TokenError::EmptyKey`] for a zero-length key and with
/// [`TokenError::RandomnessUnavailable`] if the OS random source errors.
pub fn generate(key: &SigningKey) -> Result<SessionId, TokenError> {
    generate_with(key, getrandom::getrandom)
}

fn generate_with<F>(key: &SigningKey, fill: F) -> Result<SessionId, TokenError>
where
    F: FnOnce(&mut [u8]) -> Result<(), getrandom::Error>,
{
    let mut mac = keyed_mac(key)?;

    let mut raw = [0u8; SIGNED_LENGTH];
    fill(&mut raw[..ID_LENGTH])
        .map_err(|e| TokenError::RandomnessUnavailable(e.to_string()))?;

    mac.update(&raw[..ID_LENGTH]);
    raw[ID_LENGTH..].copy_from_slice(&mac.finalize().into_bytes());

    Ok(SessionId::from_token(URL_SAFE_NO_PAD.encode(raw)))
}

/// Validate a token against `key` and return it as a [`SessionId`].
///
/// The signature comparison is constant-time.
pub fn validate(token: &str, key: &SigningKey) -> Result<SessionId, TokenError> {
    let mut mac = keyed_mac(key)?;

    let raw = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| TokenError::MalformedToken(e.to_string()))?;
    if raw.len() != SIGNED_LENGTH {
        return Err(TokenError::MalformedToken(format!(
            "expected {} bytes, got {}",
            SIGNED_LENGTH,
            raw.len()
        )));
    }

    let (id, signature) = raw.split_at(ID_LENGTH);
    mac.update(id);
    mac.verify_slice(signature)
        .map_err(|_| TokenError::InvalidSignature)?;

    Ok(SessionId::from_token(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn key(s: &str) -> SigningKey {
        SigningKey::new(s)
    }

    fn flip_bit(token: &str, index: usize) -> String {
        let mut raw = URL_SAFE_NO_PAD.decode(token).unwrap();
        raw[index] ^= 0x01;
        URL_SAFE_NO_PAD.encode(raw)
    }

    #[test]
    fn test_generate_then_validate() {
        for k in ["topsecret", "k", "a much longer signing key with spaces"] {
            let id = generate(&key(k)).unwrap();
            let validated = validate(id.as_str(), &key(k)).unwrap();
            assert_eq!(validated, id);
        }
    }

    #[test]
    fn test_token_shape() {
        let id = generate(&key("topsecret")).unwrap();
        // 64 bytes -> 86 unpadded base64 characters
        assert_eq!(id.as_str().len(), 86);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_generate_empty_key() {
        assert_eq!(generate(&key("")), Err(TokenError::EmptyKey));
    }

    #[test]
    fn test_validate_empty_key() {
        let id = generate(&key("topsecret")).unwrap();
        assert_eq!(validate(id.as_str(), &key("")), Err(TokenError::EmptyKey));
    }

    #[test]
    fn test_randomness_failure_is_reported() {
        let result = generate_with(&key("topsecret"), |_| Err(getrandom::Error::UNSUPPORTED));
        assert!(matches!(result, Err(TokenError::RandomnessUnavailable(_))));
    }

    #[test]
    fn test_signature_binds_to_key() {
        let id = generate(&key("first-key")).unwrap();
        assert_eq!(
            validate(id.as_str(), &key("second-key")),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_identifier_rejected() {
        let id = generate(&key("topsecret")).unwrap();
        for index in [0, 7, ID_LENGTH - 1] {
            let tampered = flip_bit(id.as_str(), index);
            assert_eq!(
                validate(&tampered, &key("topsecret")),
                Err(TokenError::InvalidSignature)
            );
        }
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let id = generate(&key("topsecret")).unwrap();
        for index in [ID_LENGTH, ID_LENGTH + 16, SIGNED_LENGTH - 1] {
            let tampered = flip_bit(id.as_str(), index);
            assert_eq!(
                validate(&tampered, &key("topsecret")),
                Err(TokenError::InvalidSignature)
            );
        }
    }

    #[test]
    fn test_malformed_tokens() {
        let k = key("topsecret");

        // Not base64
        assert!(matches!(
            validate("not base64 at all!", &k),
            Err(TokenError::MalformedToken(_))
        ));

        // Valid base64, wrong length
        let short = URL_SAFE_NO_PAD.encode([7u8; 16]);
        assert!(matches!(
            validate(&short, &k),
            Err(TokenError::MalformedToken(_))
        ));

        // Empty
        assert!(matches!(validate("", &k), Err(TokenError::MalformedToken(_))));

        // Trailing garbage
        let id = generate(&k).unwrap();
        let corrupted = format!("{}a", id);
        assert!(matches!(
            validate(&corrupted, &k),
            Err(TokenError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_uniqueness() {
        let k = key("topsecret");
        let mut ids = HashSet::new();
        for _ in 0..1_000 {
            let id = generate(&k).unwrap();
            assert!(ids.insert(id.clone()), "Duplicate token generated: {}", id);
        }
    }
}
