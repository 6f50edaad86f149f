//! Rendering of analysis results
//!
//! Results are computed as data first; this module turns them into the
//! console text (or JSON) printed by the CLI. Formatting options are passed
//! explicitly through [`FormatConfig`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::MeansReport;
use crate::assumptions::AssumptionCheck;
use crate::error::{AbTestError, Result};
use crate::stats::TestResult;

/// Largest supported number of decimals
pub const MAX_PRECISION: usize = 12;

/// Output encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl FromStr for OutputFormat {
    type Err = AbTestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AbTestError::invalid(format!(
                "unknown output format '{other}' (expected text or json)"
            ))),
        }
    }
}

/// Display options for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Decimals for statistics and p-values
    pub precision: usize,
    /// Output encoding
    pub output: OutputFormat,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            precision: 4,
            output: OutputFormat::Text,
        }
    }
}

/// `Test Stat = …, p-value = …` line shared by every report
fn stat_line(statistic: f64, p_value: f64, precision: usize) -> String {
    format!("Test Stat = {statistic:.precision$}, p-value = {p_value:.precision$}")
}

/// Render one assumption check
#[must_use]
pub fn render_assumption(check: &AssumptionCheck, format: &FormatConfig) -> String {
    let verdict = if check.satisfied {
        "is satisfied"
    } else {
        "is NOT satisfied"
    };
    format!(
        "{}\n{} {verdict}",
        stat_line(check.statistic, check.p_value, format.precision),
        check.kind.label()
    )
}

/// Render the outcome of a means test
#[must_use]
pub fn render_means_result(result: &TestResult, format: &FormatConfig) -> String {
    let stats = stat_line(result.statistic, result.p_value, format.precision);
    if result.reject_null {
        format!(
            "Test name = {} is applied H0 is REJECTED, there is a significant difference between the means {stats}",
            result.test_name
        )
    } else {
        format!(
            "Test name = {} is applied H0 is NOT REJECTED, there is no significant difference between the means {stats}",
            result.test_name
        )
    }
}

/// Render the outcome of a ratio test
#[must_use]
pub fn render_ratio_result(result: &TestResult, format: &FormatConfig) -> String {
    let stats = stat_line(result.statistic, result.p_value, format.precision);
    if result.reject_null {
        format!(
            "Test name = {} is applied H0 is REJECTED, there is a significant difference between the ratios {stats}",
            result.test_name
        )
    } else {
        format!(
            "Test name = {} is applied H0 is NOT REJECTED, there is no significant difference between the ratios {stats}",
            result.test_name
        )
    }
}

/// Render a full means report (assumption checks then the final test)
///
/// # Errors
///
/// Returns [`AbTestError::Json`] if JSON serialization fails.
pub fn render_means_report(report: &MeansReport, format: &FormatConfig) -> Result<String> {
    if format.output == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(report)?);
    }

    let sections = [
        ("Control group normality", &report.control_normality),
        ("Test group normality", &report.test_normality),
        ("Homogeneity of variance", &report.homogeneity),
    ];
    let mut out = String::new();
    for (title, check) in sections {
        out.push_str(&format!(
            "{title} ({}):\n{}\n",
            check.test_name,
            render_assumption(check, format)
        ));
    }
    out.push_str(&render_means_result(&report.result, format));
    Ok(out)
}

/// Render a ratio test outcome
///
/// # Errors
///
/// Returns [`AbTestError::Json`] if JSON serialization fails.
pub fn render_ratio_report(result: &TestResult, format: &FormatConfig) -> Result<String> {
    match format.output {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(render_ratio_result(result, format)),
    }
}

/// Render a standalone normality check
///
/// # Errors
///
/// Returns [`AbTestError::Json`] if JSON serialization fails.
pub fn render_assumption_report(check: &AssumptionCheck, format: &FormatConfig) -> Result<String> {
    match format.output {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(check)?),
        OutputFormat::Text => Ok(render_assumption(check, format)),
    }
}
