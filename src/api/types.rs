//! API request and response types.

use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::users::User;

/// State stored for every signed-in session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// When the session began.
    pub begin_time: DateTime<Utc>,
    /// The signed-in user.
    pub user: User,
}

impl SessionState {
    /// State for a session beginning now.
    pub fn new(user: User) -> Self {
        Self {
            begin_time: Utc::now(),
            user,
        }
    }
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "UNAUTHENTICATED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new("UNAUTHENTICATED", message)
    }

    pub fn invalid_credentials() -> Self {
        Self::new("INVALID_CREDENTIALS", "Invalid email or password")
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new("SESSION_STORE_UNAVAILABLE", message)
    }

    pub fn user_not_found(id: i64) -> Self {
        Self::new("USER_NOT_FOUND", format!("User '{}' not found", id))
    }

    pub fn invalid_user(message: impl Into<String>) -> Self {
        Self::new("INVALID_USER", message)
    }

    pub fn email_taken() -> Self {
        Self::new("EMAIL_TAKEN", "An account with this email already exists")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl From<&SessionError> for ErrorResponse {
    fn from(err: &SessionError) -> Self {
        if err.is_unauthenticated() {
            Self::unauthenticated("Not signed in").with_details(err.to_string())
        } else if err.is_unavailable() {
            Self::store_unavailable("Session store unavailable")
        } else {
            Self::internal_error(err.to_string())
        }
    }
}
