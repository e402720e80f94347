use serde::{Deserialize, Serialize};

/// Direction of the composite trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDirection {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl SignalDirection {
    /// Get display label for this direction.
    pub fn label(&self) -> &'static str {
        match self {
            SignalDirection::StrongBuy => "STRONG BUY",
            SignalDirection::Buy => "BUY",
            SignalDirection::Hold => "HOLD",
            SignalDirection::Sell => "SELL",
            SignalDirection::StrongSell => "STRONG SELL",
        }
    }
}

/// How strongly the indicators agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Result of the four-factor vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeSignal {
    pub direction: SignalDirection,
    pub confidence: Confidence,
    pub description: String,
    /// Number of bars in the look-back window, `min(20, N)`.
    pub timeframe: usize,
    pub bullish_votes: u32,
    pub bearish_votes: u32,
    /// Factors counted, including ones that did not cross a threshold.
    pub total_votes: u32,
    pub bullish_pct: f64,
}

/// MACD line, signal line and histogram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Bollinger bands; all three vectors share one length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Stochastic oscillator %K and its %D smoothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// Latest value of each indicator. `None` when the series is too short.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    /// MACD minus its signal line.
    pub macd_diff: Option<f64>,
    /// Price position between the Bollinger bands, in percent.
    pub bollinger_position: Option<f64>,
    pub stochastic_k: Option<f64>,
    pub stochastic_d: Option<f64>,
    pub williams_r: Option<f64>,
}

/// Price movement and position within the recent range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAnalysis {
    pub current_price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub range_high: f64,
    pub range_low: f64,
    /// Position of the price within [range_low, range_high], in percent.
    pub range_position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakoutState {
    Breakout,
    Breakdown,
    ApproachingResistance,
    Neutral,
}

/// Support/resistance levels and breakout classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakoutAnalysis {
    pub state: BreakoutState,
    pub resistance: f64,
    pub support: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeState {
    High,
    AboveAverage,
    Normal,
    Low,
}

/// Current volume relative to the recent average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAnalysis {
    pub state: VolumeState,
    pub current_volume: f64,
    pub average_volume: f64,
    pub volume_ratio: f64,
    pub description: String,
}

/// Everything derived from one OHLCV series for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorBundle {
    pub symbol: String,
    pub data_points: usize,
    pub indicators: IndicatorSnapshot,
    pub price: PriceAnalysis,
    pub breakout: BreakoutAnalysis,
    pub volume: VolumeAnalysis,
    pub signal: CompositeSignal,
}

/// Indicator series for chart overlays, aligned to bar timestamps.
///
/// Each series is paired with the timestamps of the bars it covers, so
/// warm-up truncation (SMA, RSI, Bollinger) does not shift points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSeries {
    pub symbol: String,
    pub sma: Vec<SeriesPoint>,
    pub ema: Vec<SeriesPoint>,
    pub rsi: Vec<SeriesPoint>,
    pub macd: Vec<SeriesPoint>,
    pub macd_signal: Vec<SeriesPoint>,
    pub macd_histogram: Vec<SeriesPoint>,
    pub bollinger_upper: Vec<SeriesPoint>,
    pub bollinger_middle: Vec<SeriesPoint>,
    pub bollinger_lower: Vec<SeriesPoint>,
}

/// One point of an overlay series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: i64,
    pub value: f64,
}
