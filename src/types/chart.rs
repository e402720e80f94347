use crate::error::SignalError;
use serde::{Deserialize, Serialize};

/// Bar interval requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "2m")]
    TwoMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "60m")]
    SixtyMinutes,
    #[serde(rename = "90m")]
    NinetyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
}

impl Interval {
    /// Get the interval from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Interval::OneMinute),
            "2m" => Some(Interval::TwoMinutes),
            "5m" => Some(Interval::FiveMinutes),
            "15m" => Some(Interval::FifteenMinutes),
            "30m" => Some(Interval::ThirtyMinutes),
            "60m" => Some(Interval::SixtyMinutes),
            "90m" => Some(Interval::NinetyMinutes),
            "1h" => Some(Interval::OneHour),
            "1d" => Some(Interval::OneDay),
            "5d" => Some(Interval::FiveDays),
            "1wk" => Some(Interval::OneWeek),
            "1mo" => Some(Interval::OneMonth),
            "3mo" => Some(Interval::ThreeMonths),
            _ => None,
        }
    }

    /// Parse, falling back to daily bars for anything unknown.
    pub fn parse_or_default(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Interval::OneDay)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::TwoMinutes => "2m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::SixtyMinutes => "60m",
            Interval::NinetyMinutes => "90m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::FiveDays => "5d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
            Interval::ThreeMonths => "3mo",
        }
    }
}

/// Look-back window for historical bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryRange {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
}

impl HistoryRange {
    /// Get the range from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1d" => Some(HistoryRange::OneDay),
            "5d" => Some(HistoryRange::FiveDays),
            "1mo" => Some(HistoryRange::OneMonth),
            "3mo" => Some(HistoryRange::ThreeMonths),
            "6mo" => Some(HistoryRange::SixMonths),
            "1y" => Some(HistoryRange::OneYear),
            "2y" => Some(HistoryRange::TwoYears),
            _ => None,
        }
    }

    /// Parse, falling back to one month for anything unknown.
    pub fn parse_or_default(s: &str) -> Self {
        Self::from_str(s).unwrap_or(HistoryRange::OneMonth)
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryRange::OneDay => "1d",
            HistoryRange::FiveDays => "5d",
            HistoryRange::OneMonth => "1mo",
            HistoryRange::ThreeMonths => "3mo",
            HistoryRange::SixMonths => "6mo",
            HistoryRange::OneYear => "1y",
            HistoryRange::TwoYears => "2y",
        }
    }

    /// Number of calendar days covered.
    pub fn days(&self) -> i64 {
        match self {
            HistoryRange::OneDay => 1,
            HistoryRange::FiveDays => 5,
            HistoryRange::OneMonth => 30,
            HistoryRange::ThreeMonths => 90,
            HistoryRange::SixMonths => 180,
            HistoryRange::OneYear => 365,
            HistoryRange::TwoYears => 730,
        }
    }

    /// Window start in epoch seconds, counted back from `end`.
    pub fn start_from(&self, end: i64) -> i64 {
        end - self.days() * 86_400
    }
}

/// One OHLCV bar. `time` is in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// A bar as reported by a provider, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawBar {
    pub time: i64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

impl RawBar {
    /// Fill gaps from the close. Bars without a usable close are dropped.
    fn normalize(self) -> Option<Bar> {
        let close = self.close.filter(|c| c.is_finite() && *c >= 0.0)?;
        Some(Bar {
            time: self.time,
            open: self.open.filter(|v| v.is_finite()).unwrap_or(close),
            high: self.high.filter(|v| v.is_finite()).unwrap_or(close),
            low: self.low.filter(|v| v.is_finite()).unwrap_or(close),
            close,
            volume: self.volume.unwrap_or(0),
        })
    }
}

/// Time-ordered OHLCV series with unique timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OhlcvSeries {
    bars: Vec<Bar>,
}

impl OhlcvSeries {
    /// Build from bars, sorting by time and keeping the last bar per timestamp.
    pub fn from_bars(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.time);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.time == bar.time => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self { bars: deduped }
    }

    /// Normalize raw provider bars into a series.
    pub fn from_raw(raw: Vec<RawBar>) -> Self {
        Self::from_bars(raw.into_iter().filter_map(RawBar::normalize).collect())
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.bars.iter().map(|b| b.time).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }
}

/// Parallel-array chart shape consumed by the UI: `{t, o, h, l, c, v}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartPayload {
    pub t: Vec<i64>,
    pub o: Vec<f64>,
    pub h: Vec<f64>,
    pub l: Vec<f64>,
    pub c: Vec<f64>,
    pub v: Vec<u64>,
}

impl From<&OhlcvSeries> for ChartPayload {
    fn from(series: &OhlcvSeries) -> Self {
        let bars = series.bars();
        Self {
            t: series.timestamps(),
            o: bars.iter().map(|b| b.open).collect(),
            h: series.highs(),
            l: series.lows(),
            c: series.closes(),
            v: bars.iter().map(|b| b.volume).collect(),
        }
    }
}

impl ChartPayload {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Convert back to per-bar records. All arrays must match `t` in length.
    pub fn to_series(&self) -> Result<OhlcvSeries, SignalError> {
        let expected = self.t.len();
        let lengths = [
            ("o", self.o.len()),
            ("h", self.h.len()),
            ("l", self.l.len()),
            ("c", self.c.len()),
            ("v", self.v.len()),
        ];
        if let Some((field, actual)) = lengths.into_iter().find(|(_, len)| *len != expected) {
            return Err(SignalError::LengthMismatch {
                field,
                expected,
                actual,
            });
        }

        let bars = (0..expected)
            .map(|i| Bar {
                time: self.t[i],
                open: self.o[i],
                high: self.h[i],
                low: self.l[i],
                close: self.c[i],
                volume: self.v[i],
            })
            .collect();
        Ok(OhlcvSeries::from_bars(bars))
    }
}

/// Historical bars for one (symbol, period, range) query, as cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHistory {
    pub chart: ChartPayload,
    pub symbol: String,
    pub period: String,
    pub range: String,
    /// RFC 3339 time the bars were fetched upstream.
    pub fetch_time: String,
}
