//! REST API handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{request::Parts, HeaderMap, StatusCode},
    Extension, Json,
};

use super::types::{ApiError, ErrorResponse, SessionState};
use crate::error::SessionError;
use crate::session::{self, SessionStore, SigningKey};
use crate::users::{Credentials, NewUser, User, UserError, UserStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub signing_key: SigningKey,
    pub sessions: Arc<dyn SessionStore>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(
        signing_key: SigningKey,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            signing_key,
            sessions,
            users,
        }
    }
}

/// Convert a lifecycle failure into a response, logging server-side ones.
pub(crate) fn session_rejection(err: SessionError) -> ApiError {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::warn!("Session operation failed: {}", err);
    } else {
        tracing::debug!("Session rejected: {}", err);
    }
    (status, Json(ErrorResponse::from(&err)))
}

fn internal(message: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal_error(message)),
    )
}

fn invalid_credentials() -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::invalid_credentials()),
    )
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "session-gate",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Sign in with email and password, starting a new session.
///
/// Unknown emails and wrong passwords get the same response.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<(StatusCode, HeaderMap, Json<User>), ApiError> {
    let user = match state.users.get_by_email(&creds.email).await {
        Ok(user) => user,
        Err(UserError::NotFound) => {
            tracing::debug!("Sign-in for unknown email rejected");
            return Err(invalid_credentials());
        }
        Err(e) => {
            tracing::warn!("User lookup failed: {}", e);
            return Err(internal(e.to_string()));
        }
    };

    // Argon2 verification is CPU bound
    let password = creds.password;
    let verified = tokio::task::spawn_blocking(move || user.authenticate(&password).map(|()| user))
        .await
        .map_err(|e| internal(e.to_string()))?;

    let user = match verified {
        Ok(user) => user,
        Err(UserError::InvalidCredentials) => {
            tracing::debug!("Sign-in with wrong password rejected");
            return Err(invalid_credentials());
        }
        Err(e) => {
            tracing::warn!("Password check failed: {}", e);
            return Err(internal(e.to_string()));
        }
    };

    let mut headers = HeaderMap::new();
    let session_state = SessionState::new(user.clone());
    session::begin(
        &state.signing_key,
        state.sessions.as_ref(),
        &session_state,
        &mut headers,
    )
    .await
    .map_err(session_rejection)?;

    tracing::info!(user = user.id, "User signed in");
    Ok((StatusCode::CREATED, headers, Json(user)))
}

/// Create an account and sign it in.
///
/// Responds like [`sign_in`]: 201 with the profile and the new session's
/// token in the `Authorization` header.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, HeaderMap, Json<User>), ApiError> {
    // Hashing is CPU bound; to_user validates first
    let prepared = tokio::task::spawn_blocking(move || new_user.to_user(0))
        .await
        .map_err(|e| internal(e.to_string()))?;

    let user = match prepared {
        Ok(user) => user,
        Err(UserError::Invalid(message)) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::invalid_user(message)),
            ));
        }
        Err(e) => {
            tracing::warn!("Preparing new user failed: {}", e);
            return Err(internal(e.to_string()));
        }
    };

    let user = match state.users.create(user).await {
        Ok(user) => user,
        Err(UserError::EmailTaken) => {
            return Err((StatusCode::CONFLICT, Json(ErrorResponse::email_taken())));
        }
        Err(e) => {
            tracing::warn!("Creating user failed: {}", e);
            return Err(internal(e.to_string()));
        }
    };

    let mut headers = HeaderMap::new();
    let session_state = SessionState::new(user.clone());
    session::begin(
        &state.signing_key,
        state.sessions.as_ref(),
        &session_state,
        &mut headers,
    )
    .await
    .map_err(session_rejection)?;

    tracing::info!(user = user.id, "User signed up");
    Ok((StatusCode::CREATED, headers, Json(user)))
}

/// Sign out, ending the caller's session.
pub async fn sign_out(
    State(state): State<AppState>,
    request: Parts,
) -> Result<&'static str, ApiError> {
    session::end(&request, &state.signing_key, state.sessions.as_ref())
        .await
        .map_err(session_rejection)?;
    Ok("signed out")
}

/// The signed-in user's current profile.
pub async fn current_user(
    State(state): State<AppState>,
    Extension(session_state): Extension<SessionState>,
) -> Result<Json<User>, ApiError> {
    let id = session_state.user.id;
    match state.users.get_by_id(id).await {
        Ok(user) => Ok(Json(user)),
        Err(UserError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::user_not_found(id)),
        )),
        Err(e) => Err(internal(e.to_string())),
    }
}
