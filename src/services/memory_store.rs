use dashmap::DashMap;
use std::time::{Duration, Instant};

/// In-process key/value store with per-key expiry.
///
/// Speaks the same small command set as the Redis store (`GET`, `SET EX`,
/// `DEL`, `EXISTS`, `KEYS`, `TTL`, `TYPE`, `FLUSHALL`) so the cache layer can
/// run without an external server.
#[derive(Default)]
pub struct MemoryStore {
    data: DashMap<String, StoreEntry>,
}

struct StoreEntry {
    value: String,
    expires_at: Instant,
}

impl StoreEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value, dropping it first if it has expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.data.get(key)?;
        if entry.is_live(Instant::now()) {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.data.remove(key);
            None
        }
    }

    /// Store a value that expires after `ttl`.
    pub fn set_ex(&self, key: &str, value: String, ttl: Duration) {
        self.data.insert(
            key.to_string(),
            StoreEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Remove a key. Returns whether a live key was removed.
    pub fn del(&self, key: &str) -> bool {
        let now = Instant::now();
        self.data
            .remove(key)
            .map_or(false, |(_, entry)| entry.is_live(now))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All live keys matching a `KEYS`-style pattern. Only `*` and exact
    /// matches are supported, plus a trailing `*` prefix form.
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .data
            .iter()
            .filter(|e| e.value().is_live(now))
            .map(|e| e.key().clone())
            .filter(|k| matches_pattern(pattern, k))
            .collect();
        keys.sort();
        keys
    }

    /// Remaining lifetime in seconds, `-2` when missing. Every entry
    /// expires, so the `-1` reply never occurs.
    pub fn ttl(&self, key: &str) -> i64 {
        let now = Instant::now();
        match self.data.get(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at.saturating_duration_since(now).as_secs() as i64
            }
            _ => -2,
        }
    }

    /// Value type of a key: `string` or `none`.
    pub fn key_type(&self, key: &str) -> &'static str {
        if self.exists(key) {
            "string"
        } else {
            "none"
        }
    }

    pub fn flush_all(&self) {
        self.data.clear();
    }

    /// Remove all expired entries. Returns how many were dropped.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.data.len();
        self.data.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.data.len())
    }

    /// Number of entries (including expired ones not yet cleaned up).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn matches_pattern(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => pattern == key,
    }
}
