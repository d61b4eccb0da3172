//! Session management module.
//!
//! This module provides signed session tokens, the session store
//! abstraction with its Redis and in-memory backings, and the request-level
//! lifecycle built from them.
//!
//! ## Example
//!
//! ```rust
//! use session_gate::session::{self, MemoryStore, SigningKey};
//! use axum::http::{header::AUTHORIZATION, HeaderMap, Request};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let key = SigningKey::new("topsecret");
//! let store = MemoryStore::default();
//!
//! let mut response = HeaderMap::new();
//! let id = session::begin(&key, &store, &vec!["cart", "item-1"], &mut response)
//!     .await
//!     .unwrap();
//!
//! let (parts, _) = Request::builder()
//!     .header(AUTHORIZATION, response[AUTHORIZATION].clone())
//!     .body(())
//!     .unwrap()
//!     .into_parts();
//! let (same_id, cart): (_, Vec<String>) = session::get_state(&parts, &key, &store)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(same_id, id);
//! assert_eq!(cart, vec!["cart", "item-1"]);
//! # }
//! ```

mod id;
pub mod lifecycle;
mod memory_store;
mod redis_store;
mod signing;
mod store;

pub use id::{SessionId, SigningKey, KEY_PREFIX};
pub use lifecycle::{begin, end, extract_id, get_state, AUTH_PARAM, SCHEME_BEARER};
pub use memory_store::MemoryStore;
pub use redis_store::{RedisStore, DEFAULT_OP_TIMEOUT};
pub use signing::{generate, validate, ID_LENGTH, SIGNED_LENGTH};
pub use store::{SessionStore, SessionStoreExt, DEFAULT_SESSION_DURATION};
