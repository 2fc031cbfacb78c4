//! Descriptive statistics with explicit zero guards
//!
//! No function here returns NaN or infinity for finite input.

/// Statistical summary of a set of values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Statistics {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub count: usize,
}

impl Statistics {
    /// Calculate statistics from a set of values
    ///
    /// An empty set yields all zeros.
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;

        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Self {
            mean: finite_or_zero(mean),
            median: finite_or_zero(median),
            std_dev: finite_or_zero(variance.sqrt()),
            count,
        }
    }
}

/// Map NaN and infinities to 0
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
