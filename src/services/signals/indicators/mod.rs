//! Technical indicator implementations.
//!
//! Every indicator is a pure function of its input slices. Inputs shorter
//! than the indicator's period produce an empty series, never an error.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod williams_r;

pub use bollinger::{band_position, BollingerBands};
pub use ema::Ema;
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::Stochastic;
pub use williams_r::WilliamsR;

/// Lowest low and highest high of a window.
pub(crate) fn window_extremes(highs: &[f64], lows: &[f64]) -> (f64, f64) {
    let lowest_low = lows.iter().copied().fold(f64::INFINITY, f64::min);
    let highest_high = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (lowest_low, highest_high)
}
