use crate::error::{StoreError, StoreResult};
use redis::aio::ConnectionManager;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

const MANAGER_BACKOFF_BASE: u64 = 2;
const MANAGER_BACKOFF_FACTOR_MS: u64 = 50;
const MANAGER_RETRIES: usize = 1;

/// Thin async wrapper over one Redis connection.
///
/// The connection slot is empty until [`RedisStore::connect`] succeeds and
/// after [`RedisStore::disconnect`]; every command fails with
/// [`StoreError::Unavailable`] while it is empty.
pub struct RedisStore {
    client: redis::Client,
    conn: RwLock<Option<ConnectionManager>>,
}

impl RedisStore {
    /// Validate the URL. Does not touch the network.
    pub fn open(redis_url: &str) -> StoreResult<Self> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
            conn: RwLock::new(None),
        })
    }

    /// Establish a connection and confirm it with `PING`.
    ///
    /// The manager retries once internally; longer backoff is left to the
    /// caller's retry policy. The slot stays empty when the ping fails.
    pub async fn connect(&self) -> StoreResult<()> {
        let conn = ConnectionManager::new_with_backoff(
            self.client.clone(),
            MANAGER_BACKOFF_BASE,
            MANAGER_BACKOFF_FACTOR_MS,
            MANAGER_RETRIES,
        )
        .await?;
        *self.conn.write().await = Some(conn);
        if let Err(e) = self.ping().await {
            self.disconnect().await;
            return Err(e);
        }
        Ok(())
    }

    /// Drop the connection. Later commands fail until `connect` succeeds.
    pub async fn disconnect(&self) {
        if self.conn.write().await.take().is_some() {
            debug!("Redis connection released");
        }
    }

    async fn conn(&self) -> StoreResult<ConnectionManager> {
        let guard = self.conn.read().await;
        let Some(ref conn) = *guard else {
            return Err(StoreError::Unavailable);
        };
        Ok(conn.clone())
    }

    pub async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await?)
    }

    /// `SET key value PX ttl`. Millisecond expiry so sub-second TTLs round up
    /// to at least 1 ms instead of being rejected.
    pub async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let millis = ttl.as_millis().max(1) as u64;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    /// Returns whether the key existed.
    pub async fn del(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let removed = redis::cmd("DEL")
            .arg(key)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    pub async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let count = redis::cmd("EXISTS")
            .arg(key)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn().await?;
        let mut keys = redis::cmd("KEYS")
            .arg(pattern)
            .query_async::<_, Vec<String>>(&mut conn)
            .await?;
        keys.sort();
        Ok(keys)
    }

    /// Raw `TTL` reply: `-2` missing, `-1` no expiry, else seconds.
    pub async fn ttl(&self, key: &str) -> StoreResult<i64> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("TTL")
            .arg(key)
            .query_async::<_, i64>(&mut conn)
            .await?)
    }

    pub async fn key_type(&self, key: &str) -> StoreResult<String> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("TYPE")
            .arg(key)
            .query_async::<_, String>(&mut conn)
            .await?)
    }

    pub async fn flush_all(&self) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("FLUSHALL")
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
