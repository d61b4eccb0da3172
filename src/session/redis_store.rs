//! Redis-backed session store.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::RedisResult;

use super::{SessionId, SessionStore};
use crate::error::{GatewayError, StoreError};

/// Default deadline for a single Redis command.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// [`SessionStore`] backed by Redis keys with native TTLs.
///
/// Keys have the form `sid:<token>`. Saves use `SETEX`, fetches use `GET`,
/// refreshes use `EXPIRE`, and deletes use `DEL`. Each command is bounded by
/// the operation timeout and reports [`StoreError::Persistence`] when it
/// fails or runs out of time.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    session_duration: Duration,
    op_timeout: Duration,
}

impl RedisStore {
    /// Wrap an existing connection manager.
    pub fn new(conn: ConnectionManager, session_duration: Duration) -> Self {
        Self {
            conn,
            session_duration,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    /// Connect to the Redis server at `url`.
    pub async fn connect(
        url: &str,
        session_duration: Duration,
        op_timeout: Duration,
    ) -> crate::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = tokio::time::timeout(op_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                GatewayError::Redis(format!("connecting to {} timed out", redacted_url(url)))
            })??;

        tracing::info!("Connected to session store at {}", redacted_url(url));
        Ok(Self::new(conn, session_duration).with_op_timeout(op_timeout))
    }

    /// Set the per-command deadline.
    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    fn ttl_secs(&self) -> u64 {
        self.session_duration.as_secs().max(1)
    }
}

/// Run one Redis command under `timeout`.
///
/// Command errors and timeouts both become [`StoreError::Persistence`].
async fn bounded<T, F>(op: &'static str, timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::warn!("Redis {} failed: {}", op, e);
            Err(StoreError::Persistence(format!("{} failed: {}", op, e)))
        }
        Err(_) => {
            tracing::warn!("Redis {} timed out after {:?}", op, timeout);
            Err(StoreError::Persistence(format!(
                "{} timed out after {:?}",
                op, timeout
            )))
        }
    }
}

/// Strip credentials from a connection URL before logging it.
fn redacted_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn save_raw(&self, id: &SessionId, payload: Vec<u8>) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SETEX");
        cmd.arg(id.store_key()).arg(self.ttl_secs()).arg(payload);

        let _: () = bounded("SETEX", self.op_timeout, cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn fetch_raw(&self, id: &SessionId) -> Result<Vec<u8>, StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("GET");
        cmd.arg(id.store_key());

        let payload: Option<Vec<u8>> =
            bounded("GET", self.op_timeout, cmd.query_async(&mut conn)).await?;
        payload.ok_or(StoreError::NotFound)
    }

    async fn refresh(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("EXPIRE");
        cmd.arg(id.store_key()).arg(self.ttl_secs());

        let refreshed: bool =
            bounded("EXPIRE", self.op_timeout, cmd.query_async(&mut conn)).await?;

        // Key expired since it was read
        if !refreshed {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("DEL");
        cmd.arg(id.store_key());

        let _removed: i64 = bounded("DEL", self.op_timeout, cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    fn session_duration(&self) -> Duration {
        self.session_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{generate, SessionStoreExt, SigningKey};

    /// URL of a disposable Redis server, if one is available.
    fn test_redis_url() -> Option<String> {
        std::env::var("SESSION_GATE_TEST_REDIS_URL").ok()
    }

    #[test]
    fn test_redacted_url() {
        assert_eq!(
            redacted_url("redis://user:pw@cache.local:6379/0"),
            "redis://***@cache.local:6379/0"
        );
        assert_eq!(redacted_url("redis://127.0.0.1:6379"), "redis://127.0.0.1:6379");
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_timeout_is_persistence_error() {
        let result: Result<(), _> = bounded(
            "GET",
            Duration::from_millis(250),
            std::future::pending::<RedisResult<()>>(),
        )
        .await;

        match result {
            Err(StoreError::Persistence(message)) => assert!(message.contains("timed out")),
            other => panic!("expected persistence error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_command_error_is_persistence_error() {
        let failed = async {
            Err::<Vec<u8>, _>(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection reset",
            )))
        };

        let result = bounded("GET", DEFAULT_OP_TIMEOUT, failed).await;
        match result {
            Err(StoreError::Persistence(message)) => {
                assert!(message.starts_with("GET failed"));
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected persistence error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_command_success_passes_through() {
        let result = bounded("DEL", DEFAULT_OP_TIMEOUT, async { Ok::<i64, _>(1) }).await;
        assert_eq!(result, Ok(1));
    }

    #[tokio::test]
    async fn test_connect_unreachable_fails() {
        let result = RedisStore::connect(
            "redis://127.0.0.1:1",
            Duration::from_secs(60),
            Duration::from_millis(500),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_connect_invalid_url_fails() {
        let result = RedisStore::connect(
            "not a url",
            Duration::from_secs(60),
            Duration::from_millis(500),
        )
        .await;
        assert!(matches!(result, Err(GatewayError::Redis(_))));
    }

    #[tokio::test]
    #[ignore = "Requires a Redis server (SESSION_GATE_TEST_REDIS_URL)"]
    async fn test_redis_round_trip() {
        let url = test_redis_url().expect("SESSION_GATE_TEST_REDIS_URL not set");
        let store = RedisStore::connect(&url, Duration::from_secs(60), DEFAULT_OP_TIMEOUT)
            .await
            .unwrap();
        let id = generate(&SigningKey::new("topsecret")).unwrap();

        store.save(&id, &vec!["a", "b"]).await.unwrap();
        let loaded: Vec<String> = store.get(&id).await.unwrap();
        assert_eq!(loaded, vec!["a", "b"]);

        store.delete(&id).await.unwrap();
        store.delete(&id).await.unwrap();
        let missing: Result<Vec<String>, _> = store.get(&id).await;
        assert_eq!(missing, Err(StoreError::NotFound));
    }

    #[tokio::test]
    #[ignore = "Requires a Redis server (SESSION_GATE_TEST_REDIS_URL)"]
    async fn test_redis_entry_expires() {
        let url = test_redis_url().expect("SESSION_GATE_TEST_REDIS_URL not set");
        let store = RedisStore::connect(&url, Duration::from_secs(1), DEFAULT_OP_TIMEOUT)
            .await
            .unwrap();
        let id = generate(&SigningKey::new("topsecret")).unwrap();

        store.save_raw(&id, b"1".to_vec()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(store.get_raw(&id).await, Err(StoreError::NotFound));
    }
}
