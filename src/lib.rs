//! # abtest
//!
//! Classical A/B test analysis for two-group experiments.
//!
//! Given a control and a test sample, abtest checks the assumptions behind a
//! parametric comparison (Shapiro-Wilk normality per group, Levene variance
//! homogeneity), selects Student's t, Welch's t or Mann-Whitney U, and
//! reports whether the null hypothesis of equal means is rejected. Conversion
//! rates are compared with a proportions z-test.
//!
//! ## Example
//!
//! ```rust
//! use abtest::{analyze_means, analyze_ratios, AnalysisConfig, Sample, TestMethod};
//!
//! let config = AnalysisConfig::default();
//!
//! let control = Sample::new([10.0, 12.0, 11.0, 13.0, 12.0, 11.0, 10.0, 12.0, 13.0, 11.0]).unwrap();
//! let test = Sample::new([14.0, 15.0, 13.0, 16.0, 15.0, 14.0, 13.0, 15.0, 16.0, 14.0]).unwrap();
//! let report = analyze_means(&control, &test, &config).unwrap();
//! assert_eq!(report.result.method, TestMethod::StudentT);
//! assert!(report.result.reject_null);
//!
//! let ratios = analyze_ratios(&[50, 50], &[100, 100], None, &config).unwrap();
//! assert!(!ratios.reject_null);
//! ```
//!
//! ## Modules
//!
//! - [`sample`]: numeric samples and summaries
//! - [`assumptions`]: Shapiro-Wilk and Levene checks
//! - [`stats`]: the hypothesis tests themselves
//! - [`analysis`]: test selection and the end-to-end pipelines
//! - [`report`]: text and JSON rendering
//! - [`config`]: layered configuration
//! - [`loader`]: CSV input

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// Clippy allows (MUST come after deny/warn to override them)
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // usize -> f64 for sample sizes
#![allow(clippy::cast_possible_truncation)] // f64 -> usize for rank statistics
#![allow(clippy::cast_sign_loss)] // rank statistics are non-negative
#![allow(clippy::must_use_candidate)] // Not all methods need #[must_use]
#![allow(clippy::doc_markdown)] // Allow technical terms without backticks
#![allow(clippy::missing_panics_doc)] // Allow missing Panics doc sections
#![allow(clippy::float_cmp)] // Allow float comparisons in tests
#![allow(clippy::many_single_char_names)] // Statistical notation (n, w, u, z)
#![allow(clippy::similar_names)] // n1/n2, u1/u2

pub mod analysis;
pub mod assumptions;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod report;
pub mod sample;
pub mod stats;

pub use analysis::{analyze_means, analyze_ratios, select_test, MeansReport, SelectionPolicy};
pub use assumptions::{AssumptionCheck, AssumptionKind};
pub use config::AnalysisConfig;
pub use error::{AbTestError, Result};
pub use report::{FormatConfig, OutputFormat};
pub use sample::{Sample, SampleSummary};
pub use stats::{Alternative, TestMethod, TestResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
        assert!(VERSION.contains('.'));
    }
}
