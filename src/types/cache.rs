use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Kind of cached payload. Each category has a fixed expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheCategory {
    Historical,
    Quote,
    Profile,
    Search,
}

impl CacheCategory {
    /// Key prefix for this category.
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheCategory::Historical => "stock",
            CacheCategory::Quote => "quote",
            CacheCategory::Profile => "company",
            CacheCategory::Search => "search",
        }
    }

    /// Category of an existing key, judged by its prefix.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.split(':').next()? {
            "stock" => Some(CacheCategory::Historical),
            "quote" => Some(CacheCategory::Quote),
            "company" => Some(CacheCategory::Profile),
            "search" => Some(CacheCategory::Search),
            _ => None,
        }
    }

    /// Expiry for entries of this category. `None` means never cached.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            CacheCategory::Historical => Some(Duration::from_secs(3600)),
            CacheCategory::Quote => Some(Duration::from_secs(60)),
            CacheCategory::Profile => Some(Duration::from_secs(86_400)),
            CacheCategory::Search => None,
        }
    }
}

/// A cacheable query. Search is deliberately absent: it is always live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheQuery<'a> {
    Historical {
        symbol: &'a str,
        period: &'a str,
        range: &'a str,
    },
    Quote {
        symbol: &'a str,
    },
    Profile {
        symbol: &'a str,
    },
}

impl CacheQuery<'_> {
    pub fn category(&self) -> CacheCategory {
        match self {
            CacheQuery::Historical { .. } => CacheCategory::Historical,
            CacheQuery::Quote { .. } => CacheCategory::Quote,
            CacheQuery::Profile { .. } => CacheCategory::Profile,
        }
    }

    /// Deterministic store key. Symbols are case-insensitive.
    pub fn key(&self) -> String {
        let prefix = self.category().prefix();
        match self {
            CacheQuery::Historical {
                symbol,
                period,
                range,
            } => format!("{}:{}:{}:{}", prefix, symbol.to_lowercase(), period, range),
            CacheQuery::Quote { symbol } | CacheQuery::Profile { symbol } => {
                format!("{}:{}", prefix, symbol.to_lowercase())
            }
        }
    }

    pub fn ttl(&self) -> Duration {
        // Every keyed category has an expiry; only search lacks one.
        self.category().ttl().unwrap_or(Duration::ZERO)
    }
}

/// Remaining lifetime of a stored key, as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key has no expiry.
    Never,
    /// Key does not exist.
    Missing,
    Seconds(i64),
}

impl KeyTtl {
    /// Interpret a raw store TTL reply (`-1` no expiry, `-2` missing).
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            -1 => KeyTtl::Never,
            r if r < 0 => KeyTtl::Missing,
            r => KeyTtl::Seconds(r),
        }
    }

    pub fn label(&self) -> String {
        match self {
            KeyTtl::Never => "never".to_string(),
            KeyTtl::Missing => "missing".to_string(),
            KeyTtl::Seconds(s) => format!("{}s", s),
        }
    }
}

/// One row of the administrative key listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub key: String,
    pub ttl: String,
    #[serde(rename = "type")]
    pub key_type: String,
    /// Key prefix, e.g. `stock` or `quote`.
    pub category: String,
}

/// Raw view of one stored key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInspection {
    pub key: String,
    pub value: serde_json::Value,
    pub ttl: String,
    #[serde(rename = "type")]
    pub key_type: String,
    /// Stored value size in bytes.
    pub size: usize,
}
