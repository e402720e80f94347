//! Yahoo Finance API client.
//!
//! Serves historical bars and symbol search, and can build a quote from the
//! chart metadata. Uses the unofficial public endpoints (no key required).

use super::{check_status, MarketDataProvider, UpstreamResult};
use crate::error::UpstreamError;
use crate::types::{Interval, Quote, RawBar, SearchHit};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: YahooMeta,
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    quotes: Vec<YahooSearchQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSearchQuote {
    symbol: Option<String>,
    shortname: Option<String>,
    longname: Option<String>,
    exchange: Option<String>,
    type_disp: Option<String>,
}

/// Normalize symbol for Yahoo Finance API.
/// Yahoo uses hyphens instead of dots for share classes (e.g., BRK-B not BRK.B)
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.to_uppercase().replace('.', "-")
}

/// Unwrap the single chart result, mapping Yahoo's error object.
fn chart_result(symbol: &str, response: YahooChartResponse) -> UpstreamResult<Option<YahooResult>> {
    if let Some(error) = response.chart.error {
        return Err(if error.code == "Not Found" {
            UpstreamError::SymbolNotFound(symbol.to_string())
        } else {
            UpstreamError::InvalidResponse(format!("{} - {}", error.code, error.description))
        });
    }
    Ok(response.chart.result.and_then(|r| r.into_iter().next()))
}

/// Turn a chart result into raw bars, one per timestamp.
fn raw_bars(result: YahooResult) -> Vec<RawBar> {
    let Some(timestamps) = result.timestamp else {
        return Vec::new();
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    timestamps
        .iter()
        .enumerate()
        .map(|(i, &time)| RawBar {
            time,
            open: opens.get(i).copied().flatten(),
            high: highs.get(i).copied().flatten(),
            low: lows.get(i).copied().flatten(),
            close: closes.get(i).copied().flatten(),
            volume: volumes.get(i).copied().flatten(),
        })
        .collect()
}

/// Build a quote from chart metadata, falling back to the last bar.
fn quote_from_chart(symbol: &str, result: YahooResult, fetch_time: String) -> UpstreamResult<Quote> {
    let meta = &result.meta;
    let first_open = result
        .indicators
        .quote
        .first()
        .and_then(|q| q.open.as_ref())
        .and_then(|o| o.iter().flatten().next().copied());

    let current = meta
        .regular_market_price
        .ok_or_else(|| UpstreamError::SymbolNotFound(symbol.to_string()))?;
    let previous_close = meta
        .chart_previous_close
        .or(meta.previous_close)
        .unwrap_or(current);

    Ok(Quote::from_prices(
        current,
        previous_close,
        meta.regular_market_day_high.unwrap_or(current),
        meta.regular_market_day_low.unwrap_or(current),
        first_open.unwrap_or(current),
        meta.regular_market_time
            .unwrap_or_else(|| chrono::Utc::now().timestamp()),
        fetch_time,
    ))
}

/// Keep listed equities and label them for the search response.
fn search_hits(response: YahooSearchResponse, limit: usize) -> Vec<SearchHit> {
    response
        .quotes
        .into_iter()
        .filter(|q| q.type_disp.as_deref() == Some("Equity"))
        .filter_map(|q| {
            let symbol = q.symbol?;
            let exchange = q.exchange.filter(|e| !e.is_empty())?;
            Some(SearchHit {
                description: q.longname.or(q.shortname).unwrap_or_else(|| symbol.clone()),
                symbol,
                kind: "Common Stock".to_string(),
                exchange,
            })
        })
        .take(limit)
        .collect()
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client.
    pub fn new(timeout: Duration) -> UpstreamResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    async fn fetch_chart(&self, symbol: &str, query: &[(&str, String)]) -> UpstreamResult<Option<YahooResult>> {
        let yahoo_symbol = normalize_yahoo_symbol(symbol);
        let url = format!("{}/{}", CHART_URL, yahoo_symbol);

        debug!("Fetching Yahoo Finance chart: {} {:?}", url, query);

        let response = self.client.get(&url).query(query).send().await?;
        check_status("yahoo", symbol, response.status())?;

        let data: YahooChartResponse = response.json().await?;
        chart_result(symbol, data)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn history(
        &self,
        symbol: &str,
        interval: Interval,
        start: i64,
        end: i64,
    ) -> UpstreamResult<Vec<RawBar>> {
        let query = [
            ("period1", start.to_string()),
            ("period2", end.to_string()),
            ("interval", interval.label().to_string()),
            ("includePrePost", "false".to_string()),
        ];
        Ok(self
            .fetch_chart(symbol, &query)
            .await?
            .map(raw_bars)
            .unwrap_or_default())
    }

    async fn quote(&self, symbol: &str) -> UpstreamResult<Quote> {
        let query = [
            ("range", "1d".to_string()),
            ("interval", "1d".to_string()),
        ];
        let result = self
            .fetch_chart(symbol, &query)
            .await?
            .ok_or_else(|| UpstreamError::SymbolNotFound(symbol.to_string()))?;
        quote_from_chart(symbol, result, chrono::Utc::now().to_rfc3339())
    }

    async fn search(&self, query: &str, limit: usize) -> UpstreamResult<Vec<SearchHit>> {
        debug!("Searching Yahoo Finance: {}", query);

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("q", query.to_string()),
                ("quotesCount", limit.to_string()),
                ("newsCount", "0".to_string()),
            ])
            .send()
            .await?;
        check_status("yahoo", query, response.status())?;

        let data: YahooSearchResponse = response.json().await?;
        Ok(search_hits(data, limit))
    }
}
