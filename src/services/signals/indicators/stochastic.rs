//! Stochastic Oscillator indicator.

use super::{window_extremes, Sma};
use crate::types::StochasticSeries;

/// Stochastic Oscillator.
///
/// Compares closing price to price range over a period:
/// %K = (Current Close - Lowest Low) / (Highest High - Lowest Low) * 100
/// %D = SMA(%K, d_period)
///
/// Signals:
/// - Below 20: Oversold (bullish)
/// - Above 80: Overbought (bearish)
#[derive(Debug, Clone, Copy)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
        }
    }
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        Self { k_period, d_period }
    }

    /// %K has `len - k_period + 1` points; %D is the SMA of %K.
    pub fn calculate(&self, highs: &[f64], lows: &[f64], closes: &[f64]) -> StochasticSeries {
        let len = closes.len().min(highs.len()).min(lows.len());
        if self.k_period == 0 || len < self.k_period {
            return StochasticSeries::default();
        }

        let k: Vec<f64> = (self.k_period - 1..len)
            .map(|i| {
                let start = i + 1 - self.k_period;
                let (lowest_low, highest_high) = window_extremes(&highs[start..=i], &lows[start..=i]);
                let range = highest_high - lowest_low;
                if range > 0.0 {
                    (closes[i] - lowest_low) / range * 100.0
                } else {
                    50.0
                }
            })
            .collect();

        let d = Sma::new(self.d_period).calculate(&k);

        StochasticSeries { k, d }
    }
}
