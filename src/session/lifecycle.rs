//! Request-level session lifecycle: begin, read and end a session.
//!
//! These functions combine the token codec with a [`SessionStore`]. They are
//! stateless; the signing key and store are passed in by the caller.

use axum::extract::Query;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue, Uri};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{signing, SessionId, SessionStore, SessionStoreExt, SigningKey};
use crate::error::{SessionError, TokenError};

/// Query parameter consulted when no `Authorization` header is sent.
pub const AUTH_PARAM: &str = "auth";

/// Scheme prefix of the credential.
pub const SCHEME_BEARER: &str = "Bearer ";

#[derive(Deserialize)]
struct AuthQuery {
    auth: Option<String>,
}

/// Start a new session.
///
/// Generates a signed token, saves `state` for it and sets
/// `Authorization: Bearer <token>` on `response`. The header is only written
/// once the state has been saved.
pub async fn begin<S, T>(
    key: &SigningKey,
    store: &S,
    state: &T,
    response: &mut HeaderMap,
) -> Result<SessionId, SessionError>
where
    S: SessionStore + ?Sized,
    T: Serialize + Sync + ?Sized,
{
    let id = signing::generate(key).map_err(SessionError::CreationFailed)?;

    store
        .save(&id, state)
        .await
        .map_err(SessionError::PersistenceFailed)?;

    let value = HeaderValue::try_from(format!("{}{}", SCHEME_BEARER, id))
        .map_err(|e| SessionError::CreationFailed(TokenError::MalformedToken(e.to_string())))?;
    response.insert(AUTHORIZATION, value);

    tracing::info!(session = id.short(), "Session started");
    Ok(id)
}

/// Extract and validate the session token of a request.
///
/// The `Authorization` header wins; the `auth` query parameter is used only
/// when the header is missing or empty. Either source must carry the
/// `Bearer ` scheme.
pub fn extract_id(request: &Parts, key: &SigningKey) -> Result<SessionId, SessionError> {
    let credential = match request.headers.get(AUTHORIZATION) {
        Some(value) if !value.is_empty() => {
            Some(value.to_str().map_err(|_| SessionError::MissingScheme)?.to_string())
        }
        _ => query_credential(&request.uri),
    };

    let credential = credential
        .filter(|c| !c.is_empty())
        .ok_or(SessionError::NoToken)?;
    let token = credential
        .strip_prefix(SCHEME_BEARER)
        .ok_or(SessionError::MissingScheme)?;

    signing::validate(token, key).map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        SessionError::InvalidToken(e)
    })
}

fn query_credential(uri: &Uri) -> Option<String> {
    Query::<AuthQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(query)| query.auth)
}

/// Load the state of the request's session.
///
/// A successful read extends the session's lifetime in the store.
pub async fn get_state<S, T>(
    request: &Parts,
    key: &SigningKey,
    store: &S,
) -> Result<(SessionId, T), SessionError>
where
    S: SessionStore + ?Sized,
    T: DeserializeOwned + Send,
{
    let id = extract_id(request, key)?;
    let state = store.get(&id).await?;
    Ok((id, state))
}

/// End the request's session by deleting its state.
///
/// The token keeps a valid signature afterwards but no longer maps to any
/// state, so later reads fail with [`StoreError::NotFound`](crate::error::StoreError::NotFound).
pub async fn end<S>(request: &Parts, key: &SigningKey, store: &S) -> Result<SessionId, SessionError>
where
    S: SessionStore + ?Sized,
{
    let id = extract_id(request, key)?;
    store.delete(&id).await?;

    tracing::info!(session = id.short(), "Session ended");
    Ok(id)
}
