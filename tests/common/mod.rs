//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use stockscope::error::UpstreamError;
use stockscope::sources::{MarketDataProvider, UpstreamResult};
use stockscope::types::{CompanyProfile, Interval, Quote, RawBar, SearchHit};

/// Scripted provider that counts calls per operation.
#[derive(Default)]
pub struct FakeProvider {
    pub bars: Vec<RawBar>,
    pub delay: Duration,
    pub failure: Mutex<Option<UpstreamError>>,
    pub history_calls: AtomicUsize,
    pub quote_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn with_bars(n: usize) -> Self {
        Self {
            bars: sample_bars(n),
            ..Default::default()
        }
    }

    pub fn failing(err: UpstreamError) -> Self {
        Self {
            failure: Mutex::new(Some(err)),
            ..Default::default()
        }
    }

    pub fn clear_failure(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn begin(&self, counter: &AtomicUsize) -> UpstreamResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MarketDataProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn history(
        &self,
        _symbol: &str,
        _interval: Interval,
        _start: i64,
        _end: i64,
    ) -> UpstreamResult<Vec<RawBar>> {
        self.begin(&self.history_calls).await?;
        Ok(self.bars.clone())
    }

    async fn quote(&self, _symbol: &str) -> UpstreamResult<Quote> {
        self.begin(&self.quote_calls).await?;
        Ok(Quote::from_prices(
            110.0,
            100.0,
            111.0,
            99.0,
            100.5,
            1_700_000_000,
            chrono::Utc::now().to_rfc3339(),
        ))
    }

    async fn profile(&self, symbol: &str) -> UpstreamResult<CompanyProfile> {
        self.begin(&self.profile_calls).await?;
        let mut profile = CompanyProfile::unknown(chrono::Utc::now().to_rfc3339());
        profile.name = format!("{} Inc", symbol);
        Ok(profile)
    }

    async fn search(&self, query: &str, limit: usize) -> UpstreamResult<Vec<SearchHit>> {
        self.begin(&self.search_calls).await?;
        Ok(vec![SearchHit {
            symbol: query.to_uppercase(),
            description: format!("{} Corp", query),
            kind: "Common Stock".to_string(),
            exchange: "NMS".to_string(),
        }]
        .into_iter()
        .take(limit)
        .collect())
    }
}

/// Daily bars oscillating around 100 with varying volume.
pub fn sample_bars(n: usize) -> Vec<RawBar> {
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.4).sin() * 5.0 + i as f64 * 0.1;
            RawBar {
                time: 1_700_000_000 + i as i64 * 86_400,
                open: Some(close - 0.5),
                high: Some(close + 1.0),
                low: Some(close - 1.0),
                close: Some(close),
                volume: Some(1_000_000 + (i as u64 % 7) * 50_000),
            }
        })
        .collect()
}
