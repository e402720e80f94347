//! Simple Moving Average (SMA) indicator.

/// SMA (Simple Moving Average) indicator.
///
/// Point `i` of the output is the mean of the window ending at input index
/// `period - 1 + i`, so the output has `len - period + 1` points.
#[derive(Debug, Clone, Copy)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Calculate the SMA series. Empty when `period` exceeds the input length.
    pub fn calculate(&self, values: &[f64]) -> Vec<f64> {
        if self.period == 0 || values.len() < self.period {
            return Vec::new();
        }

        values
            .windows(self.period)
            .map(|window| window.iter().sum::<f64>() / self.period as f64)
            .collect()
    }

    /// Latest SMA value.
    pub fn last(&self, values: &[f64]) -> Option<f64> {
        self.calculate(values).last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_basic() {
        assert_eq!(Sma::new(3).calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_sma_length() {
        let values: Vec<f64> = (1..=30).map(|v| v as f64).collect();
        assert_eq!(Sma::new(20).calculate(&values).len(), 11);
    }

    #[test]
    fn test_sma_period_equals_length() {
        assert_eq!(Sma::new(4).calculate(&[2.0, 4.0, 6.0, 8.0]), vec![5.0]);
    }

    #[test]
    fn test_sma_insufficient_data() {
        assert!(Sma::new(5).calculate(&[1.0, 2.0]).is_empty());
        assert_eq!(Sma::new(5).last(&[1.0, 2.0]), None);
    }

    #[test]
    fn test_sma_zero_period() {
        assert!(Sma::new(0).calculate(&[1.0, 2.0]).is_empty());
    }
}
