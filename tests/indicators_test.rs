//! Indicator engine tests

use stockscope::services::signals::indicators::{BollingerBands, Ema, Macd, Rsi, Sma};
use stockscope::services::signals::{composite_signal, MIN_SIGNAL_POINTS};
use stockscope::error::SignalError;
use stockscope::types::{Confidence, SignalDirection};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn test_sma_example() {
    assert_eq!(Sma::new(3).calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]), vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_sma_period_longer_than_input() {
    assert!(Sma::new(10).calculate(&[1.0, 2.0, 3.0]).is_empty());
}

#[test]
fn test_ema_example() {
    let ema = Ema::new(2).calculate(&[1.0, 2.0, 3.0]);
    assert_eq!(ema.len(), 3);
    assert!(approx(ema[0], 1.0));
    assert!(approx(ema[1], 1.667));
    assert!(approx(ema[2], 2.556));
}

#[test]
fn test_rsi_saturates_at_100() {
    let prices: Vec<f64> = (1..=16).map(|v| v as f64).collect();
    let rsi = Rsi::new(14).calculate(&prices);
    assert_eq!(rsi.len(), 2);
    assert_eq!(*rsi.last().unwrap(), 100.0);
}

#[test]
fn test_rsi_too_short_is_empty() {
    let prices: Vec<f64> = (1..=14).map(|v| v as f64).collect();
    assert!(Rsi::new(14).calculate(&prices).is_empty());
}

#[test]
fn test_macd_lengths_match_input() {
    let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.2).cos() * 3.0).collect();
    let macd = Macd::default().calculate(&prices);
    assert_eq!(macd.macd.len(), 60);
    assert_eq!(macd.signal.len(), 60);
    assert_eq!(macd.histogram.len(), 60);
    for i in 0..60 {
        assert!(approx(macd.histogram[i], macd.macd[i] - macd.signal[i]));
    }
}

#[test]
fn test_bollinger_ordering() {
    let prices: Vec<f64> = (0..50).map(|i| 50.0 + (i as f64 * 0.7).sin() * 8.0).collect();
    let bands = BollingerBands::default().calculate(&prices);
    assert_eq!(bands.middle.len(), 31);
    for i in 0..bands.middle.len() {
        assert!(bands.lower[i] <= bands.middle[i]);
        assert!(bands.middle[i] <= bands.upper[i]);
    }
}

/// Downtrend with RSI below the midline, price under its 20-bar average,
/// a volume collapse on the last bar and a resistance spike far above.
fn bearish_fixture() -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut closes = vec![100.0];
    for i in 1..30 {
        let prev = closes[i - 1];
        closes.push(if i % 2 == 1 { prev - 2.0 } else { prev + 1.5 });
    }
    let mut highs: Vec<f64> = closes.iter().map(|c| c + 0.5).collect();
    highs[25] = 150.0;
    let lows: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
    let mut volumes = vec![1000.0; 30];
    volumes[29] = 300.0;
    (closes, highs, lows, volumes)
}

#[test]
fn test_all_bearish_is_strong_sell() {
    let (closes, highs, lows, volumes) = bearish_fixture();
    let signal = composite_signal(&closes, &highs, &lows, &volumes).unwrap();

    assert_eq!(signal.bullish_votes, 0);
    assert_eq!(signal.bearish_votes, 4);
    assert_eq!(signal.total_votes, 4);
    assert_eq!(signal.bullish_pct, 0.0);
    assert_eq!(signal.direction, SignalDirection::StrongSell);
    assert_eq!(signal.confidence, Confidence::High);
    assert_eq!(signal.timeframe, 20);
    assert_eq!(
        signal.description,
        "Multiple strong bearish signals - high risk environment"
    );
}

/// One early surge keeps the smoothed RSI overbought while the last 20 bars
/// slide steadily, volume dries up and an old high sits far above price.
fn overbought_fixture() -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut closes = vec![100.0; 6];
    closes.push(1100.0);
    while closes.len() < 30 {
        let prev = closes[closes.len() - 1];
        closes.push(prev - 5.0);
    }
    let mut highs: Vec<f64> = closes.iter().map(|c| c + 0.5).collect();
    highs[20] = 1250.0;
    let lows: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
    let mut volumes = vec![1000.0; 30];
    volumes[29] = 300.0;
    (closes, highs, lows, volumes)
}

#[test]
fn test_overbought_rsi_votes_bearish() {
    let (closes, highs, lows, volumes) = overbought_fixture();
    let rsi = Rsi::new(14).last(&closes).unwrap();
    assert!(rsi > 70.0 && rsi < 90.0, "rsi = {}", rsi);
    let sma = Sma::new(20).last(&closes).unwrap();
    assert!(closes[29] < sma);

    let signal = composite_signal(&closes, &highs, &lows, &volumes).unwrap();
    assert_eq!(signal.bullish_votes, 0);
    assert_eq!(signal.bearish_votes, 4);
    assert_eq!(signal.total_votes, 4);
    assert_eq!(signal.direction, SignalDirection::StrongSell);
    assert_eq!(signal.confidence, Confidence::High);
}

#[test]
fn test_composite_short_input_errors() {
    let err = composite_signal(&[], &[], &[], &[]).unwrap_err();
    assert_eq!(
        err,
        SignalError::InsufficientData {
            required: MIN_SIGNAL_POINTS,
            actual: 0
        }
    );
}

#[test]
fn test_composite_timeframe_short_series() {
    let closes = [10.0, 10.5, 11.0, 10.8, 11.2];
    let signal = composite_signal(&closes, &closes, &closes, &[1.0; 5]).unwrap();
    assert_eq!(signal.timeframe, 5);
}
