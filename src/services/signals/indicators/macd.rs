//! MACD (Moving Average Convergence Divergence) indicator.

use super::Ema;
use crate::types::MacdSeries;

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
///
/// Both EMAs are seeded from the first price, so every line has the same
/// length as the input.
#[derive(Debug, Clone, Copy)]
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }

    pub fn calculate(&self, prices: &[f64]) -> MacdSeries {
        let fast_ema = Ema::new(self.fast_period).calculate(prices);
        let slow_ema = Ema::new(self.slow_period).calculate(prices);

        let macd: Vec<f64> = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        let signal = Ema::new(self.signal_period).calculate(&macd);

        let histogram = macd
            .iter()
            .zip(signal.iter())
            .map(|(m, s)| m - s)
            .collect();

        MacdSeries {
            macd,
            signal,
            histogram,
        }
    }
}
