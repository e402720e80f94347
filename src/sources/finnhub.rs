//! Finnhub API client for stock data.
//!
//! Provides real-time quotes, company profiles, and search functionality
//! for US stocks.

use super::{check_status, MarketDataProvider, UpstreamResult};
use crate::error::UpstreamError;
use crate::types::{CompanyProfile, Quote, SearchHit};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const FINNHUB_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub quote response.
#[derive(Debug, Clone, Deserialize)]
struct FinnhubQuote {
    /// Current price
    #[serde(rename = "c")]
    current: Option<f64>,
    /// High price of the day
    #[serde(rename = "h")]
    high: Option<f64>,
    /// Low price of the day
    #[serde(rename = "l")]
    low: Option<f64>,
    /// Open price of the day
    #[serde(rename = "o")]
    open: Option<f64>,
    /// Previous close price
    #[serde(rename = "pc")]
    previous_close: Option<f64>,
    /// Timestamp
    #[serde(rename = "t")]
    timestamp: Option<i64>,
}

/// Finnhub company profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinnhubProfile {
    country: Option<String>,
    currency: Option<String>,
    exchange: Option<String>,
    #[serde(rename = "finnhubIndustry")]
    industry: Option<String>,
    ipo: Option<String>,
    logo: Option<String>,
    /// In millions of `currency`.
    market_capitalization: Option<f64>,
    name: Option<String>,
    weburl: Option<String>,
}

/// Finnhub search result.
#[derive(Debug, Clone, Deserialize)]
struct FinnhubSearchResult {
    #[serde(default)]
    result: Vec<FinnhubSymbol>,
}

/// Finnhub symbol from search.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinnhubSymbol {
    description: String,
    symbol: String,
    #[serde(rename = "type")]
    symbol_type: String,
}

/// Finnhub reports unknown symbols as an all-zero quote.
fn to_quote(symbol: &str, raw: FinnhubQuote, fetch_time: String) -> UpstreamResult<Quote> {
    let current = raw
        .current
        .filter(|c| *c > 0.0)
        .ok_or_else(|| UpstreamError::SymbolNotFound(symbol.to_string()))?;
    let previous_close = raw.previous_close.unwrap_or(current);

    Ok(Quote::from_prices(
        current,
        previous_close,
        raw.high.unwrap_or(current),
        raw.low.unwrap_or(current),
        raw.open.unwrap_or(current),
        raw.timestamp
            .filter(|t| *t > 0)
            .unwrap_or_else(|| chrono::Utc::now().timestamp()),
        fetch_time,
    ))
}

/// Finnhub reports unknown symbols as an empty object.
fn to_profile(symbol: &str, raw: FinnhubProfile, fetch_time: String) -> UpstreamResult<CompanyProfile> {
    let name = raw
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| UpstreamError::SymbolNotFound(symbol.to_string()))?;

    let text = |value: Option<String>| {
        value
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| CompanyProfile::UNKNOWN.to_string())
    };

    let mut profile = CompanyProfile::unknown(fetch_time);
    profile.name = name;
    profile.industry = text(raw.industry);
    profile.country = text(raw.country);
    profile.website = text(raw.weburl);
    profile.exchange = text(raw.exchange);
    profile.market_cap = raw
        .market_capitalization
        .map(|mc| mc * 1_000_000.0)
        .unwrap_or(0.0);
    if let Some(currency) = raw.currency.filter(|c| !c.is_empty()) {
        profile.currency = currency;
    }
    profile.logo = raw.logo.filter(|l| !l.is_empty());
    profile.ipo = raw.ipo.filter(|i| !i.is_empty());
    Ok(profile)
}

fn search_hits(raw: FinnhubSearchResult, limit: usize) -> Vec<SearchHit> {
    raw.result
        .into_iter()
        .filter(|s| s.symbol_type == "Common Stock")
        .map(|s| SearchHit {
            description: if s.description.is_empty() {
                s.symbol.clone()
            } else {
                s.description
            },
            symbol: s.symbol,
            kind: s.symbol_type,
            exchange: "US".to_string(),
        })
        .take(limit)
        .collect()
}

/// Finnhub API client.
pub struct FinnhubClient {
    client: Client,
    api_key: String,
}

impl FinnhubClient {
    /// Create a new Finnhub client.
    pub fn new(api_key: String, timeout: Duration) -> UpstreamResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        subject: &str,
        query: &[(&str, &str)],
    ) -> UpstreamResult<T> {
        let url = format!("{}{}", FINNHUB_URL, path);
        debug!("Fetching Finnhub {} for {}", path, subject);

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await?;
        check_status("finnhub", subject, response.status())?;

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MarketDataProvider for FinnhubClient {
    fn name(&self) -> &'static str {
        "finnhub"
    }

    async fn quote(&self, symbol: &str) -> UpstreamResult<Quote> {
        let symbol = symbol.to_uppercase();
        let raw: FinnhubQuote = self
            .get_json("/quote", &symbol, &[("symbol", symbol.as_str())])
            .await?;
        to_quote(&symbol, raw, chrono::Utc::now().to_rfc3339())
    }

    async fn profile(&self, symbol: &str) -> UpstreamResult<CompanyProfile> {
        let symbol = symbol.to_uppercase();
        let raw: FinnhubProfile = self
            .get_json("/stock/profile2", &symbol, &[("symbol", symbol.as_str())])
            .await?;
        to_profile(&symbol, raw, chrono::Utc::now().to_rfc3339())
    }

    async fn search(&self, query: &str, limit: usize) -> UpstreamResult<Vec<SearchHit>> {
        let raw: FinnhubSearchResult = self.get_json("/search", query, &[("q", query)]).await?;
        Ok(search_hits(raw, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_mapping() {
        let json = r#"{"c": 110.0, "d": 10.0, "dp": 10.0, "h": 111.0, "l": 99.0, "o": 100.5, "pc": 100.0, "t": 1700000000}"#;
        let raw: FinnhubQuote = serde_json::from_str(json).unwrap();
        let quote = to_quote("AAPL", raw, "now".into()).unwrap();
        assert_eq!(quote.c, 110.0);
        assert_eq!(quote.d, 10.0);
        assert_eq!(quote.o, 100.5);
        assert_eq!(quote.t, 1_700_000_000);
    }

    #[test]
    fn test_zero_quote_is_unknown_symbol() {
        let json = r#"{"c": 0, "d": null, "dp": null, "h": 0, "l": 0, "o": 0, "pc": 0, "t": 0}"#;
        let raw: FinnhubQuote = serde_json::from_str(json).unwrap();
        let err = to_quote("ZZZZ", raw, "now".into()).unwrap_err();
        assert_eq!(err, UpstreamError::SymbolNotFound("ZZZZ".into()));
    }

    #[test]
    fn test_profile_defaults() {
        let json = r#"{"name": "Apple Inc", "finnhubIndustry": "Technology", "marketCapitalization": 2500000.5, "exchange": "", "ticker": "AAPL"}"#;
        let raw: FinnhubProfile = serde_json::from_str(json).unwrap();
        let profile = to_profile("AAPL", raw, "now".into()).unwrap();
        assert_eq!(profile.name, "Apple Inc");
        assert_eq!(profile.industry, "Technology");
        assert_eq!(profile.exchange, "N/A");
        assert_eq!(profile.sector, "N/A");
        assert_eq!(profile.currency, "USD");
        assert_eq!(profile.employees, 0);
        assert!((profile.market_cap - 2_500_000_500_000.0).abs() < 1.0);
    }

    #[test]
    fn test_empty_profile_is_unknown_symbol() {
        let raw: FinnhubProfile = serde_json::from_str("{}").unwrap();
        let err = to_profile("ZZZZ", raw, "now".into()).unwrap_err();
        assert_eq!(err, UpstreamError::SymbolNotFound("ZZZZ".into()));
    }

    #[test]
    fn test_search_keeps_common_stock() {
        let json = r#"{"count": 3, "result": [
            {"description": "APPLE INC", "displaySymbol": "AAPL", "symbol": "AAPL", "type": "Common Stock"},
            {"description": "APPLE INC-CDR", "displaySymbol": "AAPL.NE", "symbol": "AAPL.NE", "type": "DR"},
            {"description": "", "displaySymbol": "APLE", "symbol": "APLE", "type": "Common Stock"}
        ]}"#;
        let raw: FinnhubSearchResult = serde_json::from_str(json).unwrap();
        let hits = search_hits(raw, 15);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].kind, "Common Stock");
        assert_eq!(hits[1].description, "APLE");
    }
}
