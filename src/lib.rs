//! # session-gate
//!
//! Session authentication for HTTP services built on signed bearer tokens.
//!
//! A session is identified by a random token signed with a server-side
//! HMAC-SHA256 key. Session state lives in a [`SessionStore`] (Redis in
//! production, process memory for development and tests) and expires after
//! a sliding window of inactivity.
//!
//! ## Features
//!
//! - **Signed tokens**: forged or tampered tokens are rejected before any
//!   store lookup
//! - **Pluggable stores**: Redis and in-memory [`SessionStore`] backends
//! - **Request lifecycle**: begin, load and end sessions straight from HTTP
//!   request and response parts
//! - **HTTP service**: sign-in, sign-out and session-protected routes on axum
//!
//! ## Quick Start
//!
//! ```no_run
//! use axum::http::HeaderMap;
//! use session_gate::session::{self, MemoryStore, SigningKey};
//!
//! #[tokio::main]
//! async fn main() -> session_gate::Result<()> {
//!     session_gate::logging::try_init().ok();
//!
//!     let key = SigningKey::new("change-me");
//!     let store = MemoryStore::default();
//!
//!     let mut headers = HeaderMap::new();
//!     let id = session::begin(&key, &store, &"state", &mut headers).await?;
//!
//!     println!("Session {} began: {:?}", id.short(), headers);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod users;

// Re-export commonly used types
pub use config::Config;
pub use error::{GatewayError, Result, SessionError, StoreError, TokenError};
pub use session::{
    MemoryStore, RedisStore, SessionId, SessionStore, SessionStoreExt, SigningKey,
};
pub use users::{MemoryUserStore, User, UserStore};
