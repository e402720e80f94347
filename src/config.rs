use std::env;
use std::time::Duration;

/// Which store backs the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// Redis at `CacheConfig::redis_url`.
    Redis,
    /// In-process TTL map. Nothing survives a restart.
    Memory,
    /// No store at all. Every lookup misses.
    Disabled,
}

impl CacheBackend {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "redis" => Some(Self::Redis),
            "memory" | "mem" => Some(Self::Memory),
            "none" | "off" | "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Reconnect backoff for the cache store.
///
/// Delay before attempt `n` is `min(n * step, cap)`. Retrying stops after
/// `max_attempts` attempts or once `max_elapsed` has passed, whichever comes
/// first.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub step: Duration,
    pub cap: Duration,
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            step: Duration::from_millis(100),
            cap: Duration::from_millis(3000),
            max_elapsed: Duration::from_secs(60 * 60),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt).min(self.cap)
    }

    /// Whether another attempt is allowed after `attempts` failures.
    pub fn should_retry(&self, attempts: u32, elapsed: Duration) -> bool {
        attempts < self.max_attempts && elapsed < self.max_elapsed
    }
}

/// Cache store configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Redis URL, used when `backend` is `Redis`.
    pub redis_url: String,
    pub retry: RetryPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Response cache settings.
    pub cache: CacheConfig,
    /// Finnhub API key for quotes and company profiles.
    pub finnhub_api_key: Option<String>,
    /// Timeout for upstream HTTP requests.
    pub http_timeout: Duration,
    /// Maximum number of symbol search results returned.
    pub search_result_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cache: CacheConfig::default(),
            finnhub_api_key: None,
            http_timeout: Duration::from_secs(30),
            search_result_limit: 15,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let retry_defaults = RetryPolicy::default();

        let backend = env::var("CACHE_BACKEND")
            .ok()
            .and_then(|v| CacheBackend::parse(&v))
            .unwrap_or(defaults.cache.backend);

        let retry = RetryPolicy {
            max_attempts: env_parse("CACHE_CONNECT_ATTEMPTS").unwrap_or(retry_defaults.max_attempts),
            step: env_parse("CACHE_RETRY_STEP_MS")
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.step),
            cap: env_parse("CACHE_RETRY_CAP_MS")
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.cap),
            max_elapsed: env_parse("CACHE_RETRY_MAX_ELAPSED_SECS")
                .map(Duration::from_secs)
                .unwrap_or(retry_defaults.max_elapsed),
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            cache: CacheConfig {
                backend,
                redis_url: env::var("REDIS_URL").unwrap_or(defaults.cache.redis_url),
                retry,
            },
            finnhub_api_key: env::var("FINNHUB_API_KEY").ok().filter(|k| !k.is_empty()),
            http_timeout: env_parse("HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            search_result_limit: env_parse("SEARCH_RESULT_LIMIT")
                .unwrap_or(defaults.search_result_limit),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
