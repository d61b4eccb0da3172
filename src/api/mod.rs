//! API layer for session-gate.
//!
//! ## Endpoints
//!
//! ### Health & Info
//! - `GET /health` - Health check
//! - `GET /v1` - API information
//!
//! ### Sessions
//! - `POST /v1/sessions` - Sign in with `{"email", "password"}`; the token is
//!   returned in the `Authorization` response header
//! - `DELETE /v1/sessions/mine` - Sign out
//!
//! ### Users
//! - `POST /v1/users` - Sign up; starts a session like `POST /v1/sessions`
//! - `GET /v1/users/me` - Profile of the signed-in user (session required)
//!
//! Authenticated requests send `Authorization: Bearer <token>`, or the same
//! value in the `auth` query parameter where headers cannot be set.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use session_gate::api::{serve, AppState, ServerConfig};
//! use session_gate::session::{MemoryStore, SigningKey};
//! use session_gate::users::MemoryUserStore;
//!
//! #[tokio::main]
//! async fn main() -> session_gate::Result<()> {
//!     let state = AppState::new(
//!         SigningKey::new("change-me"),
//!         Arc::new(MemoryStore::default()),
//!         Arc::new(MemoryUserStore::new()),
//!     );
//!     serve(ServerConfig::new("127.0.0.1", 3000), state).await
//! }
//! ```

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod types;

// Re-export commonly used types
pub use handlers::AppState;
pub use middleware::require_session;
pub use router::{create_router, serve, ServerConfig};
pub use types::{ApiError, ErrorResponse, SessionState};
