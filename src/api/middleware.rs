//! Session authentication middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::handlers::{session_rejection, AppState};
use super::types::{ApiError, SessionState};
use crate::session::{self, SessionId};

/// Require a live session for the wrapped routes.
///
/// On success the [`SessionId`] and [`SessionState`] are added to the
/// request extensions; otherwise the request is rejected with 401 for
/// missing, invalid or ended sessions and 503 when the store is down.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let loaded: Result<(SessionId, SessionState), _> =
        session::get_state(&parts, &state.signing_key, state.sessions.as_ref()).await;
    let (id, session_state) = loaded.map_err(session_rejection)?;

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(id);
    request.extensions_mut().insert(session_state);

    Ok(next.run(request).await)
}
