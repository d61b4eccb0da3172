//! In-process session store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::store::DEFAULT_SESSION_DURATION;
use super::{SessionId, SessionStore};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct Entry {
    payload: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe in-memory [`SessionStore`] with the same sliding-expiry
/// semantics as the Redis store.
///
/// Expired entries are dropped lazily on access, by
/// [`purge_expired`](MemoryStore::purge_expired), or periodically by the
/// task from [`spawn_reaper`](MemoryStore::spawn_reaper). Time is read from
/// `tokio::time`, so a paused test clock controls expiry.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    session_duration: Duration,
}

impl MemoryStore {
    /// Create an empty store whose entries live for `session_duration`.
    pub fn new(session_duration: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            session_duration,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .map(|entries| entries.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| poisoned())?;

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }

    /// Spawn a task that purges expired entries every `every`.
    ///
    /// The task holds a weak reference and exits once the store is dropped.
    pub fn spawn_reaper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        let every = every.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };

                match store.purge_expired() {
                    Ok(0) => {}
                    Ok(purged) => tracing::debug!("Purged {} expired sessions", purged),
                    Err(e) => {
                        tracing::warn!("Stopping session reaper: {}", e);
                        break;
                    }
                }
            }
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_DURATION)
    }
}

fn poisoned() -> StoreError {
    StoreError::Persistence("internal lock poisoned".to_string())
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn save_raw(&self, id: &SessionId, payload: Vec<u8>) -> Result<(), StoreError> {
        let entry = Entry {
            payload,
            expires_at: Instant::now() + self.session_duration,
        };

        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(id.store_key(), entry);
        Ok(())
    }

    async fn fetch_raw(&self, id: &SessionId) -> Result<Vec<u8>, StoreError> {
        let key = id.store_key();
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| poisoned())?;

        match entries.get(&key) {
            Some(entry) if !entry.is_expired(now) => Ok(entry.payload.clone()),
            Some(_) => {
                entries.remove(&key);
                Err(StoreError::NotFound)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn refresh(&self, id: &SessionId) -> Result<(), StoreError> {
        let key = id.store_key();
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| poisoned())?;

        match entries.get_mut(&key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.expires_at = now + self.session_duration;
                Ok(())
            }
            Some(_) => {
                entries.remove(&key);
                Err(StoreError::NotFound)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(&id.store_key());
        Ok(())
    }

    fn session_duration(&self) -> Duration {
        self.session_duration
    }
}
