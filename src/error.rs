//! Error types for A/B test analysis
//!
//! Every fallible operation in the crate returns [`Result`]. Failures from
//! the numeric routines (too few observations, constant samples, invalid
//! counts) are surfaced as typed variants instead of NaN results.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AbTestError>;

/// Errors raised while loading samples or running statistical tests
#[derive(Debug, Error)]
pub enum AbTestError {
    /// Sample too small for the requested test
    #[error("{test} requires at least {required} observations, got {actual}")]
    InsufficientData {
        /// Name of the test that rejected the sample
        test: &'static str,
        /// Minimum number of observations
        required: usize,
        /// Observations actually available
        actual: usize,
    },

    /// Caller supplied inconsistent or out-of-range input
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the input
        reason: String,
    },

    /// Numeric routine cannot produce a finite result for this data
    #[error("{test} cannot be computed: {reason}")]
    DegenerateSample {
        /// Name of the test
        test: &'static str,
        /// Why the computation is undefined
        reason: String,
    },

    /// A probability distribution could not be constructed
    #[error("Distribution error: {reason}")]
    Distribution {
        /// Message from the distribution constructor
        reason: String,
    },

    /// A CSV cell could not be parsed as a number
    #[error("Row {row}, column '{column}': cannot parse '{value}' as a number")]
    Parse {
        /// 1-based data row (header excluded)
        row: usize,
        /// Column name
        column: String,
        /// Raw cell content
        value: String,
    },

    /// Input file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON rendering failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be extracted or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AbTestError {
    /// Shorthand for [`AbTestError::InvalidInput`]
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`AbTestError::DegenerateSample`]
    pub(crate) fn degenerate(test: &'static str, reason: impl Into<String>) -> Self {
        Self::DegenerateSample {
            test,
            reason: reason.into(),
        }
    }

    /// Wrap a distribution constructor error
    pub(crate) fn distribution(err: impl std::fmt::Display) -> Self {
        Self::Distribution {
            reason: err.to_string(),
        }
    }
}

impl From<figment::Error> for AbTestError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_message() {
        let err = AbTestError::InsufficientData {
            test: "Shapiro-Wilk",
            required: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Shapiro-Wilk requires at least 3 observations, got 2"
        );
    }

    #[test]
    fn test_parse_error_names_row_and_column() {
        let err = AbTestError::Parse {
            row: 4,
            column: "Purchase".to_string(),
            value: "abc".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 4"));
        assert!(msg.contains("Purchase"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: AbTestError = io.into();
        assert!(matches!(err, AbTestError::Io(_)));
    }

    #[test]
    fn test_helpers_build_expected_variants() {
        assert!(matches!(
            AbTestError::invalid("bad"),
            AbTestError::InvalidInput { .. }
        ));
        assert!(matches!(
            AbTestError::degenerate("Levene", "zero spread"),
            AbTestError::DegenerateSample { test: "Levene", .. }
        ));
        assert!(matches!(
            AbTestError::distribution("shape must be positive"),
            AbTestError::Distribution { .. }
        ));
    }
}
