//! Error types for session-gate.
//!
//! Errors are layered the same way the session core is: [`TokenError`] for
//! the token codec, [`StoreError`] for session stores, and [`SessionError`]
//! for the request-level lifecycle that composes the two.

use axum::http::StatusCode;
use thiserror::Error;

/// Failures of session token generation and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The signing key has zero length.
    #[error("signing key may not be empty")]
    EmptyKey,

    /// The operating system random source failed.
    #[error("secure random source unavailable: {0}")]
    RandomnessUnavailable(String),

    /// The token is not valid base64 or has the wrong decoded length.
    #[error("malformed session token: {0}")]
    MalformedToken(String),

    /// The embedded signature does not match the identifier.
    #[error("session token signature is invalid")]
    InvalidSignature,
}

/// Failures reported by a [`SessionStore`](crate::session::SessionStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No state is stored for the session, or it has expired.
    #[error("session state not found")]
    NotFound,

    /// The session state could not be encoded.
    #[error("failed to serialize session state: {0}")]
    Serialization(String),

    /// The stored payload could not be decoded into the requested type.
    #[error("failed to deserialize session state: {0}")]
    Deserialization(String),

    /// The backing store failed or timed out.
    #[error("session store failure: {0}")]
    Persistence(String),
}

/// Failures of the request-level session lifecycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Neither the `Authorization` header nor the `auth` parameter was present.
    #[error("no session token found in Authorization header or auth parameter")]
    NoToken,

    /// The credential does not use the `Bearer` scheme.
    #[error("authorization scheme not supported")]
    MissingScheme,

    /// The presented token failed validation.
    #[error("invalid session token: {0}")]
    InvalidToken(#[source] TokenError),

    /// A new session token could not be generated.
    #[error("failed to create session: {0}")]
    CreationFailed(#[source] TokenError),

    /// The state of a new session could not be saved.
    #[error("failed to persist new session: {0}")]
    PersistenceFailed(#[source] StoreError),

    /// The store lookup or delete for a validated token failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Whether the caller should be treated as not signed in.
    ///
    /// A validly signed token with no stored state counts as signed out.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::NoToken
                | Self::MissingScheme
                | Self::InvalidToken(_)
                | Self::Store(StoreError::NotFound)
        )
    }

    /// Whether the failure came from the backing store being unavailable.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::PersistenceFailed(StoreError::Persistence(_))
                | Self::Store(StoreError::Persistence(_))
        )
    }

    /// HTTP status a handler should answer with.
    pub fn status_code(&self) -> StatusCode {
        if self.is_unauthenticated() {
            StatusCode::UNAUTHORIZED
        } else if self.is_unavailable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Main error type for session-gate operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Session lifecycle error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Session store error outside a lifecycle call.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// User store or credential error.
    #[error(transparent)]
    User(#[from] crate::users::UserError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not connect to the session backend.
    #[error("redis error: {0}")]
    Redis(String),
}

impl From<redis::RedisError> for GatewayError {
    fn from(e: redis::RedisError) -> Self {
        Self::Redis(e.to_string())
    }
}

/// Convenience Result type for session-gate operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
