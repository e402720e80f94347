//! Bollinger Bands indicator.

use super::Sma;
use crate::types::BollingerSeries;

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// The standard deviation is the population deviation of each SMA window.
#[derive(Debug, Clone, Copy)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }

    /// Calculate standard deviation.
    fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }

    /// Calculate the bands. Each band has `len - period + 1` points.
    pub fn calculate(&self, prices: &[f64]) -> BollingerSeries {
        let middle = Sma::new(self.period).calculate(prices);
        if middle.is_empty() {
            return BollingerSeries::default();
        }

        let mut upper = Vec::with_capacity(middle.len());
        let mut lower = Vec::with_capacity(middle.len());

        for (window, mean) in prices.windows(self.period).zip(middle.iter()) {
            let width = self.std_dev_multiplier * Self::std_dev(window, *mean);
            upper.push(mean + width);
            lower.push(mean - width);
        }

        BollingerSeries {
            upper,
            middle,
            lower,
        }
    }
}

/// Price position between the bands in percent.
///
/// 0 at the lower band, 100 at the upper band; 50 when the bands collapse.
pub fn band_position(price: f64, upper: f64, lower: f64) -> f64 {
    let band_width = upper - lower;
    if band_width > 0.0 {
        (price - lower) / band_width * 100.0
    } else {
        50.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_length_matches_sma() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64).sin()).collect();
        let bands = BollingerBands::default().calculate(&prices);
        assert_eq!(bands.middle.len(), 11);
        assert_eq!(bands.upper.len(), 11);
        assert_eq!(bands.lower.len(), 11);
    }

    #[test]
    fn test_bollinger_band_ordering() {
        let prices: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 10.0 + (i % 7) as f64)
            .collect();
        let bands = BollingerBands::default().calculate(&prices);
        for i in 0..bands.middle.len() {
            assert!(bands.lower[i] <= bands.middle[i]);
            assert!(bands.middle[i] <= bands.upper[i]);
        }
    }

    #[test]
    fn test_bollinger_population_std_dev() {
        // mean 5, population variance 4
        let bands = BollingerBands::new(8, 2.0).calculate(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(bands.middle, vec![5.0]);
        assert!((bands.upper[0] - 9.0).abs() < 1e-12);
        assert!((bands.lower[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_insufficient_data() {
        assert_eq!(
            BollingerBands::default().calculate(&[1.0, 2.0, 3.0]),
            BollingerSeries::default()
        );
    }

    #[test]
    fn test_band_position() {
        assert_eq!(band_position(15.0, 20.0, 10.0), 50.0);
        assert_eq!(band_position(20.0, 20.0, 10.0), 100.0);
        assert_eq!(band_position(7.0, 7.0, 7.0), 50.0);
    }
}
