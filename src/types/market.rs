use serde::{Deserialize, Serialize};

/// Live quote snapshot in the `{c, d, dp, h, l, o, pc, t}` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Current price.
    pub c: f64,
    /// Change from previous close.
    pub d: f64,
    /// Percent change from previous close.
    pub dp: f64,
    /// Day high.
    pub h: f64,
    /// Day low.
    pub l: f64,
    /// Day open.
    pub o: f64,
    /// Previous close.
    pub pc: f64,
    /// Snapshot time in epoch seconds.
    pub t: i64,
    pub fetch_time: String,
}

impl Quote {
    /// Build a quote, deriving the change fields from the previous close.
    pub fn from_prices(
        current: f64,
        previous_close: f64,
        high: f64,
        low: f64,
        open: f64,
        t: i64,
        fetch_time: String,
    ) -> Self {
        let d = current - previous_close;
        let dp = if previous_close != 0.0 {
            d / previous_close * 100.0
        } else {
            0.0
        };
        Self {
            c: current,
            d,
            dp,
            h: high,
            l: low,
            o: open,
            pc: previous_close,
            t,
            fetch_time,
        }
    }
}

/// Company profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub name: String,
    pub industry: String,
    pub sector: String,
    pub country: String,
    pub website: String,
    pub description: String,
    pub employees: u64,
    pub market_cap: f64,
    pub exchange: String,
    pub currency: String,
    pub logo: Option<String>,
    pub ipo: Option<String>,
    pub fetch_time: String,
}

impl CompanyProfile {
    /// Placeholder used for fields the provider does not report.
    pub const UNKNOWN: &'static str = "N/A";

    /// An empty profile with every text field set to `N/A`.
    pub fn unknown(fetch_time: String) -> Self {
        Self {
            name: Self::UNKNOWN.to_string(),
            industry: Self::UNKNOWN.to_string(),
            sector: Self::UNKNOWN.to_string(),
            country: Self::UNKNOWN.to_string(),
            website: Self::UNKNOWN.to_string(),
            description: Self::UNKNOWN.to_string(),
            employees: 0,
            market_cap: 0.0,
            exchange: Self::UNKNOWN.to_string(),
            currency: "USD".to_string(),
            logo: None,
            ipo: None,
            fetch_time,
        }
    }
}

/// One symbol search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub symbol: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub exchange: String,
}

/// Symbol search response. Never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub fetch_time: String,
    pub cached: bool,
}

/// A response payload annotated with where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cached<T> {
    #[serde(flatten)]
    pub data: T,
    pub cached: bool,
    /// Time the hit was served, present only for cache hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<String>,
}

impl<T> Cached<T> {
    pub fn hit(data: T) -> Self {
        Self {
            data,
            cached: true,
            cache_time: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    pub fn miss(data: T) -> Self {
        Self {
            data,
            cached: false,
            cache_time: None,
        }
    }
}
