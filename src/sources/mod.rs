//! Upstream market-data providers.

pub mod finnhub;
pub mod yahoo;

pub use finnhub::FinnhubClient;
pub use yahoo::YahooFinanceClient;

use crate::error::UpstreamError;
use crate::types::{CompanyProfile, Interval, Quote, RawBar, SearchHit};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// A source of bars, quotes, profiles and symbol search.
///
/// Operations a provider cannot serve fail with
/// [`UpstreamError::NotConfigured`].
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw bars for `symbol` between `start` and `end` (epoch seconds).
    /// An unknown window yields an empty vector, not an error.
    async fn history(
        &self,
        symbol: &str,
        interval: Interval,
        start: i64,
        end: i64,
    ) -> UpstreamResult<Vec<RawBar>> {
        let _ = (symbol, interval, start, end);
        Err(unsupported(self.name(), "history"))
    }

    async fn quote(&self, symbol: &str) -> UpstreamResult<Quote> {
        let _ = symbol;
        Err(unsupported(self.name(), "quote"))
    }

    async fn profile(&self, symbol: &str) -> UpstreamResult<CompanyProfile> {
        let _ = symbol;
        Err(unsupported(self.name(), "profile"))
    }

    /// Equity matches for free text, at most `limit`.
    async fn search(&self, query: &str, limit: usize) -> UpstreamResult<Vec<SearchHit>> {
        let _ = (query, limit);
        Err(unsupported(self.name(), "search"))
    }
}

fn unsupported(provider: &str, op: &str) -> UpstreamError {
    UpstreamError::NotConfigured(format!("{} {}", provider, op))
}

/// Map a non-success HTTP status to a typed failure.
pub(crate) fn check_status(provider: &str, symbol: &str, status: StatusCode) -> UpstreamResult<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        StatusCode::NOT_FOUND => UpstreamError::SymbolNotFound(symbol.to_string()),
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited(provider.to_string()),
        other => UpstreamError::Status(other.as_u16()),
    })
}

/// Routes each operation to the provider that serves it.
///
/// History and search go to Yahoo. Quotes prefer Finnhub when a key is
/// configured. Profiles need Finnhub.
pub struct UpstreamRouter {
    yahoo: Arc<dyn MarketDataProvider>,
    finnhub: Option<Arc<dyn MarketDataProvider>>,
}

impl UpstreamRouter {
    pub fn new(
        yahoo: Arc<dyn MarketDataProvider>,
        finnhub: Option<Arc<dyn MarketDataProvider>>,
    ) -> Self {
        Self { yahoo, finnhub }
    }
}

#[async_trait]
impl MarketDataProvider for UpstreamRouter {
    fn name(&self) -> &'static str {
        "router"
    }

    async fn history(
        &self,
        symbol: &str,
        interval: Interval,
        start: i64,
        end: i64,
    ) -> UpstreamResult<Vec<RawBar>> {
        self.yahoo.history(symbol, interval, start, end).await
    }

    async fn quote(&self, symbol: &str) -> UpstreamResult<Quote> {
        match &self.finnhub {
            Some(finnhub) => finnhub.quote(symbol).await,
            None => self.yahoo.quote(symbol).await,
        }
    }

    async fn profile(&self, symbol: &str) -> UpstreamResult<CompanyProfile> {
        match &self.finnhub {
            Some(finnhub) => finnhub.profile(symbol).await,
            None => Err(UpstreamError::NotConfigured("FINNHUB_API_KEY".to_string())),
        }
    }

    async fn search(&self, query: &str, limit: usize) -> UpstreamResult<Vec<SearchHit>> {
        self.yahoo.search(query, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl MarketDataProvider for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn quote(&self, _symbol: &str) -> UpstreamResult<Quote> {
            Err(UpstreamError::RateLimited(self.0.to_string()))
        }
    }

    #[tokio::test]
    async fn test_default_methods_are_unsupported() {
        let provider = Named("stub");
        let err = provider.profile("AAPL").await.unwrap_err();
        assert_eq!(err, UpstreamError::NotConfigured("stub profile".into()));
    }

    #[tokio::test]
    async fn test_router_prefers_finnhub_for_quotes() {
        let router = UpstreamRouter::new(Arc::new(Named("yahoo")), Some(Arc::new(Named("finnhub"))));
        let err = router.quote("AAPL").await.unwrap_err();
        assert_eq!(err, UpstreamError::RateLimited("finnhub".into()));

        let router = UpstreamRouter::new(Arc::new(Named("yahoo")), None);
        let err = router.quote("AAPL").await.unwrap_err();
        assert_eq!(err, UpstreamError::RateLimited("yahoo".into()));
    }

    #[tokio::test]
    async fn test_router_profile_needs_finnhub() {
        let router = UpstreamRouter::new(Arc::new(Named("yahoo")), None);
        let err = router.profile("AAPL").await.unwrap_err();
        assert!(matches!(err, UpstreamError::NotConfigured(_)));
    }

    #[test]
    fn test_check_status() {
        assert!(check_status("yahoo", "AAPL", StatusCode::OK).is_ok());
        assert_eq!(
            check_status("yahoo", "ZZZZ", StatusCode::NOT_FOUND),
            Err(UpstreamError::SymbolNotFound("ZZZZ".into()))
        );
        assert_eq!(
            check_status("yahoo", "AAPL", StatusCode::TOO_MANY_REQUESTS),
            Err(UpstreamError::RateLimited("yahoo".into()))
        );
        assert_eq!(
            check_status("yahoo", "AAPL", StatusCode::BAD_GATEWAY),
            Err(UpstreamError::Status(502))
        );
    }
}
