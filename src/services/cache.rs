use crate::config::{CacheBackend, CacheConfig, RetryPolicy};
use crate::error::{StoreError, StoreResult};
use crate::services::connection::{ConnectionEvent, ConnectionState, ConnectionStatus};
use crate::services::memory_store::MemoryStore;
use crate::services::redis_store::RedisStore;
use crate::types::{CacheCategory, KeyInfo, KeyInspection, KeyTtl};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How often the in-memory backend drops expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

enum Backend {
    Redis(RedisStore),
    Memory(MemoryStore),
    /// No store configured. Every lookup misses.
    Offline,
}

impl Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::Redis(_) => "redis",
            Backend::Memory(_) => "memory",
            Backend::Offline => "none",
        }
    }
}

/// Response cache over a key/value store.
///
/// Hot-path operations (`get`, `set`, `delete`, `exists`, `clear`) never
/// fail: while the store is unreachable they behave as misses and return
/// `false`. Administrative operations (`list_keys`, `inspect`, `remove_key`,
/// `flush`) report [`StoreError::Unavailable`] instead.
pub struct CacheService {
    backend: Backend,
    status: ConnectionStatus,
    retry: RetryPolicy,
    reconnecting: AtomicBool,
    closed: AtomicBool,
    me: Weak<CacheService>,
}

/// Snapshot of the cache connection for health and admin endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub backend: &'static str,
    pub state: ConnectionState,
    pub connected: bool,
}

impl CacheService {
    fn build(backend: Backend, initial: ConnectionState, retry: RetryPolicy) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            backend,
            status: ConnectionStatus::new(initial),
            retry,
            reconnecting: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            me: me.clone(),
        })
    }

    /// Build the configured backend and connect to it.
    ///
    /// Never fails. When the store cannot be reached within the retry budget
    /// the service starts disconnected and every hot-path call misses.
    pub async fn connect(config: &CacheConfig) -> Arc<Self> {
        match config.backend {
            CacheBackend::Disabled => {
                info!("Response cache disabled");
                Self::offline()
            }
            CacheBackend::Memory => {
                info!("Using in-memory response cache");
                Self::in_memory()
            }
            CacheBackend::Redis => {
                let store = match RedisStore::open(&config.redis_url) {
                    Ok(store) => store,
                    Err(e) => {
                        warn!(
                            "Invalid Redis URL {}: {}. Running without cache.",
                            config.redis_url, e
                        );
                        return Self::offline();
                    }
                };
                let service = Self::build(
                    Backend::Redis(store),
                    ConnectionState::Disconnected,
                    config.retry.clone(),
                );
                if service.establish().await {
                    info!("Connected to Redis at {}", config.redis_url);
                } else {
                    warn!(
                        "Failed to connect to Redis at {}. Running without cache until it answers.",
                        config.redis_url
                    );
                    service.spawn_reconnect();
                }
                service
            }
        }
    }

    /// Cache backed by an in-process map. Always connected until closed.
    ///
    /// Expired entries are swept in the background while a Tokio runtime is
    /// available; without one they are only dropped when read.
    pub fn in_memory() -> Arc<Self> {
        Self::in_memory_sweeping(SWEEP_INTERVAL)
    }

    fn in_memory_sweeping(every: Duration) -> Arc<Self> {
        let service = Self::build(
            Backend::Memory(MemoryStore::new()),
            ConnectionState::Connected,
            RetryPolicy::default(),
        );
        service.spawn_sweeper(every);
        service
    }

    /// Cache with no store at all.
    pub fn offline() -> Arc<Self> {
        Self::build(
            Backend::Offline,
            ConnectionState::Disconnected,
            RetryPolicy::default(),
        )
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.status.get()
    }

    pub fn status(&self) -> CacheStatus {
        let state = self.state();
        CacheStatus {
            backend: self.backend.name(),
            state,
            connected: state == ConnectionState::Connected,
        }
    }

    /// Release the store connection and stop any reconnect loop.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.status.apply(ConnectionEvent::CloseRequested);
        if let Backend::Redis(store) = &self.backend {
            store.disconnect().await;
        }
        self.status.apply(ConnectionEvent::Ended);
        info!("Cache closed");
    }

    /// Connect attempts with linear, capped backoff. Returns whether the
    /// store ended up connected.
    async fn establish(&self) -> bool {
        let Backend::Redis(store) = &self.backend else {
            return self.is_connected();
        };

        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            if self.closed.load(Ordering::SeqCst) {
                return false;
            }
            self.status.apply(ConnectionEvent::ConnectStarted);
            match store.connect().await {
                Ok(()) => {
                    let state = self.status.apply(ConnectionEvent::Ready);
                    if state == ConnectionState::Connected && !self.closed.load(Ordering::SeqCst) {
                        return true;
                    }
                    // Closed while the attempt was in flight.
                    store.disconnect().await;
                    self.status.apply(ConnectionEvent::Ended);
                    return false;
                }
                Err(e) => {
                    attempts += 1;
                    self.status.apply(ConnectionEvent::Error);
                    warn!("Redis connect attempt {} failed: {}", attempts, e);
                    if !self.retry.should_retry(attempts, started.elapsed()) {
                        warn!("Giving up on Redis after {} attempts", attempts);
                        return false;
                    }
                    tokio::time::sleep(self.retry.delay_for(attempts)).await;
                }
            }
        }
    }

    /// Start a background reconnect unless one is running or the cache is
    /// closed.
    ///
    /// Each round spends the retry budget; between rounds the task waits the
    /// capped delay. It runs until the store answers, the cache is closed or
    /// the service is dropped.
    fn spawn_reconnect(&self) {
        if !matches!(self.backend, Backend::Redis(_)) || self.closed.load(Ordering::SeqCst) {
            return;
        }
        if self.reconnecting.swap(true, Ordering::AcqRel) {
            return;
        }
        let me = self.me.clone();
        let pause = self.retry.cap;
        tokio::spawn(async move {
            if let Some(this) = me.upgrade() {
                if let Backend::Redis(store) = &this.backend {
                    store.disconnect().await;
                }
            }
            let mut round = 0u32;
            loop {
                let Some(this) = me.upgrade() else {
                    return;
                };
                round += 1;
                if this.establish().await {
                    info!("Reconnected to Redis after {} round(s)", round);
                    this.reconnecting.store(false, Ordering::Release);
                    return;
                }
                if this.closed.load(Ordering::SeqCst) {
                    this.reconnecting.store(false, Ordering::Release);
                    return;
                }
                debug!("Redis still unreachable, probing again in {:?}", pause);
                drop(this);
                tokio::time::sleep(pause).await;
            }
        });
    }

    /// Periodically drop expired entries from the in-memory backend. Stops
    /// once the cache is closed or dropped.
    fn spawn_sweeper(&self, every: Duration) {
        if !matches!(self.backend, Backend::Memory(_)) {
            return;
        }
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("No async runtime, expired cache entries are dropped on read only");
            return;
        }
        let me = self.me.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(this) = me.upgrade() else {
                    return;
                };
                if this.closed.load(Ordering::SeqCst) {
                    return;
                }
                if let Backend::Memory(store) = &this.backend {
                    let swept = store.cleanup();
                    if swept > 0 {
                        debug!("Swept {} expired cache entries", swept);
                    }
                }
            }
        });
    }

    /// Record a failed store command. Connection loss flips the state and
    /// schedules a reconnect.
    fn note_failure(&self, op: &str, key: &str, err: &StoreError) {
        if err.is_connection_loss() {
            warn!("Cache {} {} lost connection: {}", op, key, err);
            self.status.apply(ConnectionEvent::Error);
            self.spawn_reconnect();
        } else {
            error!("Cache {} {} failed: {}", op, key, err);
        }
    }

    fn ensure_connected(&self) -> StoreResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }

    async fn raw_get(&self, key: &str) -> StoreResult<Option<String>> {
        match &self.backend {
            Backend::Redis(store) => store.get(key).await,
            Backend::Memory(store) => Ok(store.get(key)),
            Backend::Offline => Err(StoreError::Unavailable),
        }
    }

    async fn raw_set(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        match &self.backend {
            Backend::Redis(store) => store.set_ex(key, value, ttl).await,
            Backend::Memory(store) => {
                store.set_ex(key, value.to_string(), ttl);
                Ok(())
            }
            Backend::Offline => Err(StoreError::Unavailable),
        }
    }

    async fn raw_del(&self, key: &str) -> StoreResult<bool> {
        match &self.backend {
            Backend::Redis(store) => store.del(key).await,
            Backend::Memory(store) => Ok(store.del(key)),
            Backend::Offline => Err(StoreError::Unavailable),
        }
    }

    async fn raw_exists(&self, key: &str) -> StoreResult<bool> {
        match &self.backend {
            Backend::Redis(store) => store.exists(key).await,
            Backend::Memory(store) => Ok(store.exists(key)),
            Backend::Offline => Err(StoreError::Unavailable),
        }
    }

    async fn raw_keys(&self) -> StoreResult<Vec<String>> {
        match &self.backend {
            Backend::Redis(store) => store.keys("*").await,
            Backend::Memory(store) => Ok(store.keys("*")),
            Backend::Offline => Err(StoreError::Unavailable),
        }
    }

    async fn raw_ttl(&self, key: &str) -> StoreResult<i64> {
        match &self.backend {
            Backend::Redis(store) => store.ttl(key).await,
            Backend::Memory(store) => Ok(store.ttl(key)),
            Backend::Offline => Err(StoreError::Unavailable),
        }
    }

    async fn raw_type(&self, key: &str) -> StoreResult<String> {
        match &self.backend {
            Backend::Redis(store) => store.key_type(key).await,
            Backend::Memory(store) => Ok(store.key_type(key).to_string()),
            Backend::Offline => Err(StoreError::Unavailable),
        }
    }

    async fn raw_flush(&self) -> StoreResult<()> {
        match &self.backend {
            Backend::Redis(store) => store.flush_all().await,
            Backend::Memory(store) => {
                store.flush_all();
                Ok(())
            }
            Backend::Offline => Err(StoreError::Unavailable),
        }
    }

    /// Cached value for `key`. Missing, expired, undecodable and
    /// disconnected all read as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.is_connected() {
            return None;
        }
        match self.raw_get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!("Cache hit: {}", key);
                    Some(value)
                }
                Err(e) => {
                    warn!("Discarding malformed cache value for {}: {}", key, e);
                    None
                }
            },
            Ok(None) => {
                debug!("Cache miss: {}", key);
                None
            }
            Err(e) => {
                self.note_failure("get", key, &e);
                None
            }
        }
    }

    /// Store `value` as JSON for `ttl`. Returns whether it was written.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        if ttl.is_zero() || !self.is_connected() {
            return false;
        }
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to encode cache value for {}: {}", key, e);
                return false;
            }
        };
        match self.raw_set(key, &raw, ttl).await {
            Ok(()) => {
                debug!("Cached {} for {}s", key, ttl.as_secs());
                true
            }
            Err(e) => {
                self.note_failure("set", key, &e);
                false
            }
        }
    }

    /// Remove `key`. `false` when it was absent or the store is down.
    pub async fn delete(&self, key: &str) -> bool {
        if !self.is_connected() {
            return false;
        }
        match self.raw_del(key).await {
            Ok(removed) => removed,
            Err(e) => {
                self.note_failure("delete", key, &e);
                false
            }
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        if !self.is_connected() {
            return false;
        }
        match self.raw_exists(key).await {
            Ok(found) => found,
            Err(e) => {
                self.note_failure("exists", key, &e);
                false
            }
        }
    }

    /// Remove every key. Returns whether the store was flushed.
    pub async fn clear(&self) -> bool {
        match self.flush().await {
            Ok(()) => true,
            Err(StoreError::Unavailable) => false,
            Err(e) => {
                self.note_failure("clear", "*", &e);
                false
            }
        }
    }

    /// Every stored key with its remaining TTL, type and category.
    pub async fn list_keys(&self) -> StoreResult<Vec<KeyInfo>> {
        self.ensure_connected()?;
        let keys = self.admin("keys", "*", self.raw_keys().await)?;

        let mut infos = Vec::with_capacity(keys.len());
        for key in keys {
            let ttl = self.admin("ttl", &key, self.raw_ttl(&key).await)?;
            let key_type = self.admin("type", &key, self.raw_type(&key).await)?;
            let category = CacheCategory::from_key(&key)
                .map_or("other", |c| c.prefix())
                .to_string();
            infos.push(KeyInfo {
                ttl: KeyTtl::from_raw(ttl).label(),
                key_type,
                category,
                key,
            });
        }
        Ok(infos)
    }

    /// Raw view of one key, or `None` when it does not exist.
    ///
    /// Values that are not valid JSON come back as a JSON string.
    pub async fn inspect(&self, key: &str) -> StoreResult<Option<KeyInspection>> {
        self.ensure_connected()?;
        let Some(raw) = self.admin("inspect", key, self.raw_get(key).await)? else {
            return Ok(None);
        };
        let ttl = self.admin("ttl", key, self.raw_ttl(key).await)?;
        let key_type = self.admin("type", key, self.raw_type(key).await)?;

        let value = serde_json::from_str(&raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.clone()));

        Ok(Some(KeyInspection {
            key: key.to_string(),
            value,
            ttl: KeyTtl::from_raw(ttl).label(),
            key_type,
            size: raw.len(),
        }))
    }

    /// Delete one key. Returns whether it existed.
    pub async fn remove_key(&self, key: &str) -> StoreResult<bool> {
        self.ensure_connected()?;
        self.admin("delete", key, self.raw_del(key).await)
    }

    pub async fn flush(&self) -> StoreResult<()> {
        self.ensure_connected()?;
        self.admin("flush", "*", self.raw_flush().await)?;
        info!("Cache flushed");
        Ok(())
    }

    fn admin<T>(&self, op: &str, key: &str, result: StoreResult<T>) -> StoreResult<T> {
        result.map_err(|e| {
            if e.is_connection_loss() {
                self.note_failure(op, key, &e);
                StoreError::Unavailable
            } else {
                e
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_round_trip() {
        let cache = CacheService::in_memory();
        let value = json!({"c": 189.5, "t": 1700000000});
        assert!(cache.set("quote:aapl", &value, Duration::from_secs(60)).await);
        let fetched: Option<serde_json::Value> = cache.get("quote:aapl").await;
        assert_eq!(fetched, Some(value));
        assert!(cache.exists("quote:aapl").await);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let cache = CacheService::in_memory();
        assert!(!cache.set("quote:aapl", &1, Duration::ZERO).await);
        assert!(!cache.exists("quote:aapl").await);
    }

    #[tokio::test]
    async fn test_malformed_value_is_miss() {
        let cache = CacheService::in_memory();
        assert!(cache.set("quote:aapl", "text", Duration::from_secs(60)).await);
        let fetched: Option<u64> = cache.get("quote:aapl").await;
        assert_eq!(fetched, None);
    }

    #[tokio::test]
    async fn test_offline_degrades() {
        let cache = CacheService::offline();
        assert!(!cache.is_connected());
        assert!(!cache.set("quote:aapl", &1, Duration::from_secs(60)).await);
        assert_eq!(cache.get::<u64>("quote:aapl").await, None);
        assert!(!cache.delete("quote:aapl").await);
        assert!(!cache.exists("quote:aapl").await);
        assert!(!cache.clear().await);
        assert!(matches!(cache.list_keys().await, Err(StoreError::Unavailable)));
        assert!(matches!(cache.inspect("quote:aapl").await, Err(StoreError::Unavailable)));
        assert!(matches!(cache.remove_key("quote:aapl").await, Err(StoreError::Unavailable)));
    }

    #[tokio::test]
    async fn test_close_disconnects() {
        let cache = CacheService::in_memory();
        assert!(cache.is_connected());
        cache.close().await;
        assert_eq!(cache.state(), ConnectionState::Disconnected);
        assert!(!cache.set("quote:aapl", &1, Duration::from_secs(60)).await);
        // Second close is a no-op.
        cache.close().await;
    }

    #[tokio::test]
    async fn test_inspect_non_json_value() {
        let cache = CacheService::in_memory();
        if let Backend::Memory(store) = &cache.backend {
            store.set_ex("raw", "plain text".into(), Duration::from_secs(60));
        }
        let inspection = cache.inspect("raw").await.unwrap().unwrap();
        assert_eq!(inspection.value, json!("plain text"));
        assert_eq!(inspection.size, 10);
        assert_eq!(inspection.key_type, "string");

        let keys = cache.list_keys().await.unwrap();
        assert_eq!(keys[0].category, "other");
    }

    #[tokio::test]
    async fn test_sweeper_drops_expired_entries() {
        let cache = CacheService::in_memory_sweeping(Duration::from_millis(20));
        for i in 0..200 {
            let key = format!("quote:sym{}", i);
            assert!(cache.set(&key, &i, Duration::from_millis(5)).await);
        }
        cache.set("quote:keep", &1, Duration::from_secs(60)).await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        let Backend::Memory(store) = &cache.backend else {
            panic!("expected memory backend");
        };
        assert_eq!(store.len(), 1);
        assert!(cache.exists("quote:keep").await);
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            step: Duration::from_millis(1),
            cap: Duration::from_millis(20),
            max_elapsed: Duration::from_secs(5),
        }
    }

    /// Redis-backed cache that believes it is connected but holds no
    /// connection, so the first command fails as a lost connection.
    fn detached_redis() -> Arc<CacheService> {
        let store = RedisStore::open("redis://127.0.0.1:1/").unwrap();
        CacheService::build(Backend::Redis(store), ConnectionState::Connected, fast_retry())
    }

    async fn wait_for_reconnect_to_stop(cache: &CacheService) {
        for _ in 0..500 {
            if !cache.reconnecting.load(Ordering::Acquire) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("reconnect loop did not stop");
    }

    #[tokio::test]
    async fn test_lost_connection_keeps_probing_until_closed() {
        let cache = detached_redis();
        assert!(cache.is_connected());

        assert_eq!(cache.get::<u64>("quote:aapl").await, None);
        assert!(!cache.is_connected());
        assert!(cache.reconnecting.load(Ordering::Acquire));

        // Several retry rounds later the loop is still running.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(cache.reconnecting.load(Ordering::Acquire));
        assert!(!cache.is_connected());

        cache.close().await;
        wait_for_reconnect_to_stop(&cache).await;
        assert_eq!(cache.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_closed_cache_never_reconnects() {
        let cache = detached_redis();
        cache.close().await;

        assert!(!cache.establish().await);
        assert_eq!(cache.state(), ConnectionState::Disconnected);

        cache.spawn_reconnect();
        assert!(!cache.reconnecting.load(Ordering::Acquire));
        assert_eq!(cache.get::<u64>("quote:aapl").await, None);
        assert_eq!(cache.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_unreachable_redis_starts_offline_and_probes() {
        let config = CacheConfig {
            backend: CacheBackend::Redis,
            redis_url: "redis://127.0.0.1:1/".to_string(),
            retry: fast_retry(),
        };
        let cache = CacheService::connect(&config).await;
        assert!(!cache.is_connected());
        assert_eq!(cache.status().backend, "redis");
        assert_eq!(cache.get::<u64>("quote:aapl").await, None);
        assert!(cache.reconnecting.load(Ordering::Acquire));

        cache.close().await;
        wait_for_reconnect_to_stop(&cache).await;
    }
}
