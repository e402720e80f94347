//! Exponential Moving Average (EMA) indicator.

/// EMA (Exponential Moving Average) indicator.
///
/// Seeded with the first input value rather than an SMA warm-up, so the
/// output has one point per input point and the first point is just the
/// seed.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Smoothing factor `2 / (period + 1)`.
    pub fn multiplier(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// Calculate the EMA series.
    pub fn calculate(&self, values: &[f64]) -> Vec<f64> {
        let Some(&seed) = values.first() else {
            return Vec::new();
        };
        if self.period == 0 {
            return Vec::new();
        }

        let multiplier = self.multiplier();
        let mut ema = Vec::with_capacity(values.len());
        ema.push(seed);

        let mut prev = seed;
        for value in &values[1..] {
            prev = value * multiplier + prev * (1.0 - multiplier);
            ema.push(prev);
        }

        ema
    }

    /// Latest EMA value.
    pub fn last(&self, values: &[f64]) -> Option<f64> {
        self.calculate(values).last().copied()
    }
}
