//! Session identifier and signing key types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix that keeps session keys apart from other data in a shared store.
pub const KEY_PREFIX: &str = "sid:";

/// A validated, digitally signed session token.
///
/// The token is the URL-safe base64 encoding of 64 bytes: 32 random
/// identifier bytes followed by their HMAC-SHA256 signature. A `SessionId`
/// is only produced by [`generate`](super::generate) or
/// [`validate`](super::validate), apart from the empty
/// [`invalid`](SessionId::invalid) sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub(crate) fn from_token(token: String) -> Self {
        Self(token)
    }

    /// The "no session" sentinel.
    pub fn invalid() -> Self {
        Self(String::new())
    }

    /// Whether this is anything other than the sentinel.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    /// The encoded token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespaced key under which the session state is stored.
    pub fn store_key(&self) -> String {
        format!("{}{}", KEY_PREFIX, self.0)
    }

    /// Leading characters of the token, safe to put in logs.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Server-held secret used to sign and verify session tokens.
///
/// The key is never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("SigningKey(<empty>)")
        } else {
            f.write_str("SigningKey(<redacted>)")
        }
    }
}

impl From<&str> for SigningKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SigningKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}
