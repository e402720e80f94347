//! Relative Strength Index (RSI) indicator.

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses.
/// Values range from 0-100:
/// - Below 30: Oversold (potential buy signal)
/// - Above 70: Overbought (potential sell signal)
///
/// The first point averages the first `period` price changes; later points
/// use Wilder smoothing. With no losses in the window the ratio is infinite
/// and RSI is exactly 100.
#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Minimum number of prices needed for one RSI point.
    pub fn min_periods(&self) -> usize {
        self.period + 1
    }

    /// Calculate the RSI series. Produces `len - period` points, or none when
    /// fewer than `period + 1` prices are given.
    pub fn calculate(&self, prices: &[f64]) -> Vec<f64> {
        let period = self.period;
        if period == 0 || prices.len() < self.min_periods() {
            return Vec::new();
        }

        let mut gains = Vec::with_capacity(prices.len() - 1);
        let mut losses = Vec::with_capacity(prices.len() - 1);

        for pair in prices.windows(2) {
            let change = pair[1] - pair[0];
            if change > 0.0 {
                gains.push(change);
                losses.push(0.0);
            } else {
                gains.push(0.0);
                losses.push(-change);
            }
        }

        // Calculate initial averages
        let mut avg_gain: f64 = gains.iter().take(period).sum::<f64>() / period as f64;
        let mut avg_loss: f64 = losses.iter().take(period).sum::<f64>() / period as f64;

        let mut rsi = Vec::with_capacity(gains.len() - period + 1);
        rsi.push(Self::from_averages(avg_gain, avg_loss));

        for i in period..gains.len() {
            avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
            rsi.push(Self::from_averages(avg_gain, avg_loss));
        }

        rsi
    }

    /// Latest RSI value.
    pub fn last(&self, prices: &[f64]) -> Option<f64> {
        self.calculate(prices).last().copied()
    }

    fn from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
