use crate::error::{AppError, Result, UpstreamError};
use crate::services::cache::CacheService;
use crate::services::signals;
use crate::services::single_flight::SingleFlight;
use crate::sources::{MarketDataProvider, UpstreamResult};
use crate::types::{
    CacheQuery, Cached, ChartPayload, CompanyProfile, HistoryRange, IndicatorBundle,
    IndicatorSeries, Interval, OhlcvSeries, Quote, SearchResults, StockHistory,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const NO_DATA_MESSAGE: &str = "No data found for the given symbol";

type Flight = UpstreamResult<Value>;

/// Read-through access to market data.
///
/// Each keyed query checks the cache, and on a miss fetches upstream once per
/// key (concurrent misses share the fetch), stores the payload with its
/// category TTL and returns it. Search is always live.
pub struct MarketDataService {
    cache: Arc<CacheService>,
    provider: Arc<dyn MarketDataProvider>,
    flights: SingleFlight<Flight>,
    search_limit: usize,
}

impl MarketDataService {
    pub fn new(
        cache: Arc<CacheService>,
        provider: Arc<dyn MarketDataProvider>,
        search_limit: usize,
    ) -> Self {
        Self {
            cache,
            provider,
            flights: SingleFlight::new(),
            search_limit,
        }
    }

    pub fn cache(&self) -> &Arc<CacheService> {
        &self.cache
    }

    /// Cache-aside lookup for one query.
    ///
    /// The leader of a single-flight group writes the cache; followers only
    /// read its result. Upstream failures propagate and are never cached.
    async fn read_through<T, F, Fut>(&self, query: CacheQuery<'_>, fetch: F) -> Result<Cached<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = UpstreamResult<Option<T>>> + Send + 'static,
    {
        let key = query.key();
        if let Some(hit) = self.cache.get::<T>(&key).await {
            return Ok(Cached::hit(hit));
        }
        debug!("Cache miss for {}, fetching upstream", key);

        let cache = self.cache.clone();
        let ttl = query.ttl();
        let flight_key = key.clone();
        let outcome = self
            .flights
            .run(&key, move || fill(cache, flight_key, ttl, fetch()))
            .await?;

        if outcome.is_null() {
            return Err(AppError::NotFound(NO_DATA_MESSAGE.to_string()));
        }
        Ok(Cached::miss(serde_json::from_value(outcome)?))
    }

    /// Historical bars. Unknown periods fall back to `1d`, unknown ranges
    /// to `1mo`; the cache key uses the normalized labels.
    pub async fn history(&self, symbol: &str, period: &str, range: &str) -> Result<Cached<StockHistory>> {
        let symbol = normalize_symbol(symbol)?;
        let interval = Interval::parse_or_default(period);
        let range = HistoryRange::parse_or_default(range);
        let query = CacheQuery::Historical {
            symbol: &symbol,
            period: interval.label(),
            range: range.label(),
        };

        let provider = self.provider.clone();
        let owned_symbol = symbol.clone();
        self.read_through(query, move || {
            fetch_history(provider, owned_symbol, interval, range)
        })
        .await
    }

    pub async fn quote(&self, symbol: &str) -> Result<Cached<Quote>> {
        let symbol = normalize_symbol(symbol)?;
        let provider = self.provider.clone();
        let owned_symbol = symbol.clone();
        self.read_through(CacheQuery::Quote { symbol: &symbol }, move || async move {
            provider.quote(&owned_symbol).await.map(Some)
        })
        .await
    }

    pub async fn profile(&self, symbol: &str) -> Result<Cached<CompanyProfile>> {
        let symbol = normalize_symbol(symbol)?;
        let provider = self.provider.clone();
        let owned_symbol = symbol.clone();
        self.read_through(CacheQuery::Profile { symbol: &symbol }, move || async move {
            provider.profile(&owned_symbol).await.map(Some)
        })
        .await
    }

    /// Live symbol search. A blank query returns no results without calling
    /// upstream.
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let trimmed = query.trim();
        let results = if trimmed.is_empty() {
            Vec::new()
        } else {
            self.provider.search(trimmed, self.search_limit).await?
        };
        Ok(SearchResults {
            query: query.to_string(),
            results,
            fetch_time: chrono::Utc::now().to_rfc3339(),
            cached: false,
        })
    }

    /// Bars for analysis, served through the historical cache.
    async fn series(&self, symbol: &str, period: &str, range: &str) -> Result<(String, OhlcvSeries)> {
        let history = self.history(symbol, period, range).await?;
        let series = history.data.chart.to_series()?;
        Ok((history.data.symbol, series))
    }

    /// Indicator snapshot, analyses and composite signal for one symbol.
    pub async fn analysis(&self, symbol: &str, period: &str, range: &str) -> Result<IndicatorBundle> {
        let (symbol, series) = self.series(symbol, period, range).await?;
        Ok(signals::analyze(&symbol, &series)?)
    }

    /// Chart overlay series for one symbol.
    pub async fn overlays(&self, symbol: &str, period: &str, range: &str) -> Result<IndicatorSeries> {
        let (symbol, series) = self.series(symbol, period, range).await?;
        Ok(signals::overlay_series(&symbol, &series))
    }
}

/// Run the upstream fetch and store a non-empty result. `Null` marks an
/// empty result so it can be shared without being cached.
async fn fill<T, Fut>(cache: Arc<CacheService>, key: String, ttl: Duration, fetch: Fut) -> Flight
where
    T: Serialize,
    Fut: Future<Output = UpstreamResult<Option<T>>>,
{
    let Some(data) = fetch.await? else {
        return Ok(Value::Null);
    };
    let value = serde_json::to_value(&data)
        .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;
    cache.set(&key, &value, ttl).await;
    Ok(value)
}

async fn fetch_history(
    provider: Arc<dyn MarketDataProvider>,
    symbol: String,
    interval: Interval,
    range: HistoryRange,
) -> UpstreamResult<Option<StockHistory>> {
    let end = chrono::Utc::now().timestamp();
    let raw = provider
        .history(&symbol, interval, range.start_from(end), end)
        .await?;
    let series = OhlcvSeries::from_raw(raw);
    if series.is_empty() {
        return Ok(None);
    }
    info!("Fetched {} bars for {}", series.len(), symbol);
    Ok(Some(StockHistory {
        chart: ChartPayload::from(&series),
        symbol,
        period: interval.label().to_string(),
        range: range.label().to_string(),
        fetch_time: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Trim and upper-case a ticker. Blank symbols are rejected.
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Symbol is required".to_string()));
    }
    Ok(trimmed.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert!(matches!(normalize_symbol("  "), Err(AppError::BadRequest(_))));
    }
}
