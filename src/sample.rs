//! Numeric samples with missing values removed
//!
//! A [`Sample`] is what every test in this crate consumes. Construction drops
//! missing entries (`None` or NaN) so downstream code only sees finite data.

use serde::{Deserialize, Serialize};

use crate::error::{AbTestError, Result};

/// Immutable sample of finite observations
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    values: Vec<f64>,
}

impl Sample {
    /// Build a sample, dropping NaN entries
    ///
    /// # Errors
    ///
    /// Returns [`AbTestError::InvalidInput`] if any value is infinite.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Result<Self> {
        Self::from_optional(values.into_iter().map(Some))
    }

    /// Build a sample from cells that may be missing
    ///
    /// `None` and NaN are both treated as missing.
    ///
    /// # Errors
    ///
    /// Returns [`AbTestError::InvalidInput`] if any present value is infinite.
    pub fn from_optional(values: impl IntoIterator<Item = Option<f64>>) -> Result<Self> {
        let mut kept = Vec::new();
        for value in values.into_iter().flatten() {
            if value.is_nan() {
                continue;
            }
            if value.is_infinite() {
                return Err(AbTestError::invalid(format!(
                    "sample contains non-finite value {value}"
                )));
            }
            kept.push(value);
        }
        Ok(Self { values: kept })
    }

    /// Observations in load order
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the sample has no observations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arithmetic mean (NaN for an empty sample)
    #[must_use]
    pub fn mean(&self) -> f64 {
        mean(&self.values)
    }

    /// Unbiased variance with n-1 denominator (NaN when n < 2)
    #[must_use]
    pub fn variance(&self) -> f64 {
        variance(&self.values)
    }

    /// Median (NaN for an empty sample)
    #[must_use]
    pub fn median(&self) -> f64 {
        median(&self.values)
    }

    /// Descriptive summary used in reports
    #[must_use]
    pub fn summary(&self) -> SampleSummary {
        SampleSummary {
            n: self.len(),
            mean: self.mean(),
            median: self.median(),
            std_dev: self.variance().sqrt(),
        }
    }
}

/// Descriptive statistics of one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    /// Number of observations
    pub n: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Sample standard deviation
    pub std_dev: f64,
}

pub(crate) fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

pub(crate) fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

pub(crate) fn median(data: &[f64]) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }

    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}
