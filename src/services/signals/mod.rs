//! Trading signals service module.
//!
//! Turns an OHLCV series into indicator readings, support/resistance and
//! volume context, and a composite buy/sell signal.

pub mod indicators;

use crate::error::SignalError;
use crate::types::{
    BreakoutAnalysis, BreakoutState, CompositeSignal, Confidence, IndicatorBundle,
    IndicatorSeries, IndicatorSnapshot, OhlcvSeries, PriceAnalysis, SeriesPoint, SignalDirection,
    VolumeAnalysis, VolumeState,
};
use indicators::{band_position, BollingerBands, Ema, Macd, Rsi, Sma, Stochastic, WilliamsR};

/// Bars in the look-back window for trend, volume and breakout factors.
pub const LOOKBACK: usize = 20;

/// RSI period used when enough data is available.
pub const RSI_PERIOD: usize = 14;

/// Fewest price points the composite signal accepts.
pub const MIN_SIGNAL_POINTS: usize = 2;

/// One factor's contribution to the composite vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Bullish,
    Bearish,
    /// Counted towards the total without favouring either side.
    Neutral,
}

/// RSI factor: overbought is bearish, oversold bullish, otherwise the
/// midline decides.
pub fn rsi_vote(rsi: f64) -> Vote {
    if rsi > 70.0 {
        Vote::Bearish
    } else if rsi < 30.0 {
        Vote::Bullish
    } else if rsi > 50.0 {
        Vote::Bullish
    } else {
        Vote::Bearish
    }
}

/// Trend factor: price above its moving average is bullish.
pub fn trend_vote(price: f64, sma: f64) -> Vote {
    if price > sma {
        Vote::Bullish
    } else {
        Vote::Bearish
    }
}

/// Volume factor on `current / average` volume.
pub fn volume_vote(volume_ratio: Option<f64>) -> Vote {
    match volume_ratio {
        Some(r) if r > 1.5 => Vote::Bullish,
        Some(r) if r < 0.7 => Vote::Bearish,
        _ => Vote::Neutral,
    }
}

/// Breakout factor on `price / resistance`.
pub fn breakout_vote(price_vs_resistance: Option<f64>) -> Vote {
    match price_vs_resistance {
        Some(r) if r > 0.99 => Vote::Bullish,
        Some(r) if r < 0.90 => Vote::Bearish,
        _ => Vote::Neutral,
    }
}

#[derive(Debug, Default)]
struct Tally {
    bullish: u32,
    bearish: u32,
    total: u32,
}

impl Tally {
    fn record(&mut self, vote: Vote) {
        self.total += 1;
        match vote {
            Vote::Bullish => self.bullish += 1,
            Vote::Bearish => self.bearish += 1,
            Vote::Neutral => {}
        }
    }

    fn bullish_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.bullish as f64 / self.total as f64 * 100.0
    }
}

/// Map the bullish share of votes to a direction, confidence and rationale.
pub fn classify(bullish_pct: f64) -> (SignalDirection, Confidence, &'static str) {
    if bullish_pct >= 75.0 {
        (
            SignalDirection::StrongBuy,
            Confidence::High,
            "Breakout confirmed with high volume - strong bullish signal",
        )
    } else if bullish_pct >= 60.0 {
        (
            SignalDirection::Buy,
            Confidence::Medium,
            "Multiple bullish indicators align - positive outlook",
        )
    } else if bullish_pct >= 40.0 {
        (
            SignalDirection::Hold,
            Confidence::Low,
            "Mixed signals - wait for clearer direction",
        )
    } else if bullish_pct >= 25.0 {
        (
            SignalDirection::Sell,
            Confidence::Medium,
            "Multiple bearish indicators - consider reducing position",
        )
    } else {
        (
            SignalDirection::StrongSell,
            Confidence::High,
            "Multiple strong bearish signals - high risk environment",
        )
    }
}

/// Length of the trailing window: `min(LOOKBACK, n)`.
fn window_len(n: usize) -> usize {
    n.min(LOOKBACK)
}

/// RSI period adapted to short series: `min(14, n - 1)`.
fn rsi_period(n: usize) -> usize {
    RSI_PERIOD.min(n.saturating_sub(1))
}

fn tail(values: &[f64], len: usize) -> &[f64] {
    &values[values.len() - len..]
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Current volume over the trailing average. `None` when the average is zero.
fn volume_ratio(volumes: &[f64]) -> Option<f64> {
    let current = *volumes.last()?;
    let average = mean(tail(volumes, window_len(volumes.len())));
    (average > 0.0).then(|| current / average)
}

fn check_inputs(
    prices: &[f64],
    highs: &[f64],
    lows: &[f64],
    volumes: &[f64],
) -> Result<(), SignalError> {
    let n = prices.len();
    if n < MIN_SIGNAL_POINTS {
        return Err(SignalError::InsufficientData {
            required: MIN_SIGNAL_POINTS,
            actual: n,
        });
    }
    for (field, values) in [("highs", highs), ("lows", lows), ("volumes", volumes)] {
        if values.len() != n {
            return Err(SignalError::LengthMismatch {
                field,
                expected: n,
                actual: values.len(),
            });
        }
    }
    Ok(())
}

/// Four-factor majority vote over RSI, trend, volume and breakout.
///
/// RSI and trend vote only when their indicator is defined. Volume and
/// breakout are always counted in the total, even when neither threshold is
/// crossed, so a neutral reading pulls the bullish percentage down.
pub fn composite_signal(
    prices: &[f64],
    highs: &[f64],
    lows: &[f64],
    volumes: &[f64],
) -> Result<CompositeSignal, SignalError> {
    check_inputs(prices, highs, lows, volumes)?;

    let n = prices.len();
    let window = window_len(n);
    let current_price = prices[n - 1];

    let sma = Sma::new(window).last(prices);
    let rsi = Rsi::new(rsi_period(n))
        .last(prices)
        .filter(|v| v.is_finite());

    let resistance = tail(highs, window)
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let price_vs_resistance = (resistance > 0.0).then(|| current_price / resistance);

    let mut tally = Tally::default();
    if let Some(rsi) = rsi {
        tally.record(rsi_vote(rsi));
    }
    if let Some(sma) = sma {
        tally.record(trend_vote(current_price, sma));
    }
    tally.record(volume_vote(volume_ratio(volumes)));
    tally.record(breakout_vote(price_vs_resistance));

    let bullish_pct = tally.bullish_pct();
    let (direction, confidence, description) = classify(bullish_pct);

    Ok(CompositeSignal {
        direction,
        confidence,
        description: description.to_string(),
        timeframe: window,
        bullish_votes: tally.bullish,
        bearish_votes: tally.bearish,
        total_votes: tally.total,
        bullish_pct,
    })
}

/// Latest indicator readings, with periods shortened for short series.
pub fn snapshot(series: &OhlcvSeries) -> IndicatorSnapshot {
    let n = series.len();
    if n == 0 {
        return IndicatorSnapshot::default();
    }

    let closes = series.closes();
    let highs = series.highs();
    let lows = series.lows();
    let window = window_len(n);
    let current_price = closes[n - 1];

    let macd = Macd::default().calculate(&closes);
    let macd_last = macd.macd.last().copied();
    let signal_last = macd.signal.last().copied();

    let bands = BollingerBands::new(window, 2.0).calculate(&closes);
    let bollinger_position = match (bands.upper.last(), bands.lower.last()) {
        (Some(upper), Some(lower)) => Some(band_position(current_price, *upper, *lower)),
        _ => None,
    };

    let stochastic = Stochastic::default().calculate(&highs, &lows, &closes);

    IndicatorSnapshot {
        rsi: Rsi::new(rsi_period(n))
            .last(&closes)
            .filter(|v| v.is_finite()),
        sma: Sma::new(window).last(&closes),
        ema: Ema::new(window).last(&closes),
        macd: macd_last,
        macd_signal: signal_last,
        macd_diff: macd_last.zip(signal_last).map(|(m, s)| m - s),
        bollinger_position,
        stochastic_k: stochastic.k.last().copied(),
        stochastic_d: stochastic.d.last().copied(),
        williams_r: WilliamsR::default().calculate(&highs, &lows, &closes).last().copied(),
    }
}

/// Change since the previous close and position in the trailing range.
pub fn price_analysis(series: &OhlcvSeries) -> Option<PriceAnalysis> {
    let n = series.len();
    if n < MIN_SIGNAL_POINTS {
        return None;
    }
    let closes = series.closes();
    let window = window_len(n);
    let current_price = closes[n - 1];
    let previous_price = closes[n - 2];
    let change = current_price - previous_price;
    let change_percent = if previous_price != 0.0 {
        change / previous_price * 100.0
    } else {
        0.0
    };

    let highs = series.highs();
    let lows = series.lows();
    let range_high = tail(&highs, window).iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range_low = tail(&lows, window).iter().copied().fold(f64::INFINITY, f64::min);
    let range = range_high - range_low;
    let range_position = if range > 0.0 {
        (current_price - range_low) / range * 100.0
    } else {
        50.0
    };

    Some(PriceAnalysis {
        current_price,
        change,
        change_percent,
        range_high,
        range_low,
        range_position,
    })
}

/// Classify the price against trailing resistance and support.
pub fn breakout_analysis(series: &OhlcvSeries) -> Option<BreakoutAnalysis> {
    let last = series.last()?;
    let window = window_len(series.len());
    let highs = series.highs();
    let lows = series.lows();
    let resistance = tail(&highs, window).iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let support = tail(&lows, window).iter().copied().fold(f64::INFINITY, f64::min);
    let price = last.close;

    let (state, description) = if price >= resistance * 0.99 {
        (
            BreakoutState::Breakout,
            "Price broke above 20-day high - potential upward momentum",
        )
    } else if price <= support * 1.01 {
        (
            BreakoutState::Breakdown,
            "Price broke below 20-day low - potential downward pressure",
        )
    } else if price > resistance * 0.95 {
        (
            BreakoutState::ApproachingResistance,
            "Price approaching resistance level - watch for breakout",
        )
    } else {
        (BreakoutState::Neutral, "Price trading within normal range")
    };

    Some(BreakoutAnalysis {
        state,
        resistance,
        support,
        description: description.to_string(),
    })
}

/// Compare the latest volume with the trailing average.
pub fn volume_analysis(series: &OhlcvSeries) -> Option<VolumeAnalysis> {
    let volumes = series.volumes();
    let current_volume = *volumes.last()?;
    let average_volume = mean(tail(&volumes, window_len(volumes.len())));
    let ratio = volume_ratio(&volumes).unwrap_or(0.0);

    let (state, description) = if ratio >= 2.0 {
        (
            VolumeState::High,
            "Elevated volume suggests strong interest in current move",
        )
    } else if ratio >= 1.5 {
        (
            VolumeState::AboveAverage,
            "Above average volume supporting price movement",
        )
    } else if ratio <= 0.5 {
        (
            VolumeState::Low,
            "Low volume may indicate weak conviction in move",
        )
    } else {
        (VolumeState::Normal, "Volume within normal range")
    };

    Some(VolumeAnalysis {
        state,
        current_volume,
        average_volume,
        volume_ratio: ratio,
        description: description.to_string(),
    })
}

/// Compute every derived value for one series.
pub fn analyze(symbol: &str, series: &OhlcvSeries) -> Result<IndicatorBundle, SignalError> {
    let signal = composite_signal(
        &series.closes(),
        &series.highs(),
        &series.lows(),
        &series.volumes(),
    )?;

    // composite_signal has already rejected series shorter than two bars.
    let insufficient = || SignalError::InsufficientData {
        required: MIN_SIGNAL_POINTS,
        actual: series.len(),
    };

    Ok(IndicatorBundle {
        symbol: symbol.to_uppercase(),
        data_points: series.len(),
        indicators: snapshot(series),
        price: price_analysis(series).ok_or_else(insufficient)?,
        breakout: breakout_analysis(series).ok_or_else(insufficient)?,
        volume: volume_analysis(series).ok_or_else(insufficient)?,
        signal,
    })
}

/// Pair the trailing timestamps with an indicator series that ends on the
/// last bar. Undefined points are dropped.
fn align(timestamps: &[i64], values: &[f64]) -> Vec<SeriesPoint> {
    let offset = timestamps.len().saturating_sub(values.len());
    timestamps[offset..]
        .iter()
        .zip(values.iter())
        .filter(|(_, v)| v.is_finite())
        .map(|(&time, &value)| SeriesPoint { time, value })
        .collect()
}

/// Chart overlay series at the standard periods.
pub fn overlay_series(symbol: &str, series: &OhlcvSeries) -> IndicatorSeries {
    let timestamps = series.timestamps();
    let closes = series.closes();
    let macd = Macd::default().calculate(&closes);
    let bands = BollingerBands::default().calculate(&closes);

    IndicatorSeries {
        symbol: symbol.to_uppercase(),
        sma: align(&timestamps, &Sma::new(LOOKBACK).calculate(&closes)),
        ema: align(&timestamps, &Ema::new(LOOKBACK).calculate(&closes)),
        rsi: align(&timestamps, &Rsi::default().calculate(&closes)),
        macd: align(&timestamps, &macd.macd),
        macd_signal: align(&timestamps, &macd.signal),
        macd_histogram: align(&timestamps, &macd.histogram),
        bollinger_upper: align(&timestamps, &bands.upper),
        bollinger_middle: align(&timestamps, &bands.middle),
        bollinger_lower: align(&timestamps, &bands.lower),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;

    fn series_from(closes: &[f64], volumes: &[u64]) -> OhlcvSeries {
        OhlcvSeries::from_bars(
            closes
                .iter()
                .zip(volumes.iter())
                .enumerate()
                .map(|(i, (&close, &volume))| Bar {
                    time: 1_700_000_000 + i as i64 * 86_400,
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume,
                })
                .collect(),
        )
    }

    #[test]
    fn test_rsi_vote_bands() {
        assert_eq!(rsi_vote(80.0), Vote::Bearish);
        assert_eq!(rsi_vote(20.0), Vote::Bullish);
        assert_eq!(rsi_vote(55.0), Vote::Bullish);
        assert_eq!(rsi_vote(50.0), Vote::Bearish);
        assert_eq!(rsi_vote(35.0), Vote::Bearish);
    }

    #[test]
    fn test_volume_and_breakout_votes() {
        assert_eq!(volume_vote(Some(1.6)), Vote::Bullish);
        assert_eq!(volume_vote(Some(0.3)), Vote::Bearish);
        assert_eq!(volume_vote(Some(1.0)), Vote::Neutral);
        assert_eq!(volume_vote(None), Vote::Neutral);
        assert_eq!(breakout_vote(Some(1.0)), Vote::Bullish);
        assert_eq!(breakout_vote(Some(0.85)), Vote::Bearish);
        assert_eq!(breakout_vote(Some(0.95)), Vote::Neutral);
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(100.0).0, SignalDirection::StrongBuy);
        assert_eq!(classify(75.0).1, Confidence::High);
        assert_eq!(classify(66.7).0, SignalDirection::Buy);
        assert_eq!(classify(50.0), (SignalDirection::Hold, Confidence::Low, "Mixed signals - wait for clearer direction"));
        assert_eq!(classify(25.0).0, SignalDirection::Sell);
        assert_eq!(classify(0.0).0, SignalDirection::StrongSell);
    }

    #[test]
    fn test_neutral_factors_still_counted() {
        // Pure uptrend: RSI 100 (bearish), trend bullish, flat volume
        // (neutral) and price at resistance (bullish).
        let closes: Vec<f64> = (1..=25).map(|v| v as f64).collect();
        let highs = closes.clone();
        let lows = closes.clone();
        let volumes = vec![100.0; 25];
        let signal = composite_signal(&closes, &highs, &lows, &volumes).unwrap();
        assert_eq!(signal.total_votes, 4);
        assert_eq!(signal.bullish_votes, 2);
        assert_eq!(signal.bearish_votes, 1);
        assert_eq!(signal.bullish_pct, 50.0);
        assert_eq!(signal.direction, SignalDirection::Hold);
        assert_eq!(signal.timeframe, 20);
    }

    #[test]
    fn test_flat_series_skips_rsi() {
        let flat = vec![10.0; 30];
        let volumes = vec![5.0; 30];
        let signal = composite_signal(&flat, &flat, &flat, &volumes).unwrap();
        // RSI is 0/0 and skipped; trend bearish; volume neutral; breakout bullish.
        assert_eq!(signal.total_votes, 3);
        assert_eq!(signal.bullish_votes, 1);
        assert_eq!(signal.bearish_votes, 1);
    }

    #[test]
    fn test_composite_requires_two_points() {
        let err = composite_signal(&[1.0], &[1.0], &[1.0], &[1.0]).unwrap_err();
        assert_eq!(
            err,
            SignalError::InsufficientData {
                required: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_composite_rejects_mismatched_lengths() {
        let err = composite_signal(&[1.0, 2.0], &[1.0, 2.0], &[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, SignalError::LengthMismatch { field: "lows", .. }));
    }

    #[test]
    fn test_two_point_series() {
        let signal = composite_signal(&[10.0, 11.0], &[10.0, 11.0], &[10.0, 11.0], &[1.0, 1.0]).unwrap();
        assert_eq!(signal.timeframe, 2);
        assert_eq!(signal.total_votes, 4);
    }

    #[test]
    fn test_analyze_builds_bundle() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.3).sin() * 4.0).collect();
        let volumes: Vec<u64> = (0..40).map(|i| 1000 + (i % 5) * 100).collect();
        let series = series_from(&closes, &volumes);
        let bundle = analyze("aapl", &series).unwrap();
        assert_eq!(bundle.symbol, "AAPL");
        assert_eq!(bundle.data_points, 40);
        assert!(bundle.indicators.rsi.is_some());
        assert!(bundle.indicators.macd_diff.is_some());
        assert!(bundle.indicators.bollinger_position.is_some());
        assert!(bundle.indicators.williams_r.is_some());
    }

    #[test]
    fn test_breakout_states() {
        let rising: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = series_from(&rising, &[10; 20]);
        assert_eq!(breakout_analysis(&series).unwrap().state, BreakoutState::Breakout);

        let falling: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        let series = series_from(&falling, &[10; 20]);
        assert_eq!(breakout_analysis(&series).unwrap().state, BreakoutState::Breakdown);
    }

    #[test]
    fn test_volume_analysis_states() {
        let closes = vec![10.0; 20];
        let mut volumes = vec![100u64; 20];
        volumes[19] = 400;
        let high = volume_analysis(&series_from(&closes, &volumes)).unwrap();
        assert_eq!(high.state, VolumeState::High);

        volumes[19] = 10;
        let low = volume_analysis(&series_from(&closes, &volumes)).unwrap();
        assert_eq!(low.state, VolumeState::Low);
    }

    #[test]
    fn test_price_analysis_change() {
        let series = series_from(&[100.0, 110.0], &[1, 1]);
        let price = price_analysis(&series).unwrap();
        assert_eq!(price.change, 10.0);
        assert!((price.change_percent - 10.0).abs() < 1e-9);
        // range 99..111, price 110
        assert!((price.range_position - 11.0 / 12.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlay_alignment() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + i as f64).collect();
        let series = series_from(&closes, &[1; 30]);
        let overlay = overlay_series("msft", &series);
        assert_eq!(overlay.sma.len(), 11);
        assert_eq!(overlay.sma.first().unwrap().time, series.bars()[19].time);
        assert_eq!(overlay.ema.len(), 30);
        assert_eq!(overlay.rsi.len(), 16);
        assert_eq!(overlay.rsi.last().unwrap().time, series.bars()[29].time);
        assert_eq!(overlay.bollinger_upper.len(), 11);
    }
}
