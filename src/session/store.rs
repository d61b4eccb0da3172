//! Session storage abstraction.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::SessionId;
use crate::error::StoreError;

/// Default lifetime of an unused session.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(60 * 60);

/// Keyed storage for serialized session state with sliding expiry.
///
/// Implementations receive identifiers that were already validated by the
/// token codec and never check signatures themselves. Every entry lives for
/// [`session_duration`](SessionStore::session_duration) after it was last
/// written or read.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `payload` for `id`, replacing any previous entry.
    async fn save_raw(&self, id: &SessionId, payload: Vec<u8>) -> Result<(), StoreError>;

    /// Load the payload for `id` without touching its expiry.
    ///
    /// Returns [`StoreError::NotFound`] for missing or expired entries.
    async fn fetch_raw(&self, id: &SessionId) -> Result<Vec<u8>, StoreError>;

    /// Push the expiry of `id` out by a full session duration.
    ///
    /// Returns [`StoreError::NotFound`] if the entry is gone.
    async fn refresh(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Load the payload for `id` and refresh its expiry.
    ///
    /// A failed refresh fails the whole read.
    async fn get_raw(&self, id: &SessionId) -> Result<Vec<u8>, StoreError> {
        let payload = self.fetch_raw(id).await?;
        self.refresh(id).await?;
        Ok(payload)
    }

    /// Remove the entry for `id`. Removing a missing entry succeeds.
    async fn delete(&self, id: &SessionId) -> Result<(), StoreError>;

    /// How long entries live without being read.
    fn session_duration(&self) -> Duration;
}

/// Typed session state access on top of any [`SessionStore`].
///
/// State is stored as JSON.
#[async_trait]
pub trait SessionStoreExt: SessionStore {
    /// Serialize `state` and save it for `id`.
    async fn save<T>(&self, id: &SessionId, state: &T) -> Result<(), StoreError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let payload =
            serde_json::to_vec(state).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.save_raw(id, payload).await
    }

    /// Load the state for `id`, decode it as `T`, then refresh its expiry.
    ///
    /// State that fails to decode is left to expire on its own.
    async fn get<T>(&self, id: &SessionId) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        let payload = self.fetch_raw(id).await?;
        let state = serde_json::from_slice(&payload)
            .map_err(|e| StoreError::Deserialization(e.to_string()))?;
        self.refresh(id).await?;
        Ok(state)
    }
}

impl<S: SessionStore + ?Sized> SessionStoreExt for S {}
