//! Williams %R indicator.

use super::window_extremes;

/// Williams %R.
///
/// %R = (Highest High - Close) / (Highest High - Lowest Low) * -100
///
/// Ranges from -100 (close at the low) to 0 (close at the high).
#[derive(Debug, Clone, Copy)]
pub struct WilliamsR {
    period: usize,
}

impl Default for WilliamsR {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl WilliamsR {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Produces `len - period + 1` points.
    pub fn calculate(&self, highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
        let len = closes.len().min(highs.len()).min(lows.len());
        if self.period == 0 || len < self.period {
            return Vec::new();
        }

        (self.period - 1..len)
            .map(|i| {
                let start = i + 1 - self.period;
                let (lowest_low, highest_high) = window_extremes(&highs[start..=i], &lows[start..=i]);
                let range = highest_high - lowest_low;
                if range > 0.0 {
                    (highest_high - closes[i]) / range * -100.0
                } else {
                    -50.0
                }
            })
            .collect()
    }
}
