//! A/B analysis pipelines
//!
//! [`analyze_means`] checks normality of both groups and homogeneity of
//! their variances, picks a test with [`select_test`] and runs it.
//! [`analyze_ratios`] compares conversion rates with a proportions z-test.
//!
//! Both return plain data; rendering lives in [`crate::report`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assumptions::{homogeneity_check, normality_check, AssumptionCheck};
use crate::config::AnalysisConfig;
use crate::error::{AbTestError, Result};
use crate::sample::{Sample, SampleSummary};
use crate::stats::{
    mann_whitney_u, proportions_z_test, student_t_test, welch_t_test, TestMethod, TestResult,
};

/// How assumption outcomes map to a means test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Both normal and homogeneous: Student's t. Both normal, unequal
    /// variances: Welch's t. Otherwise: Mann-Whitney U.
    #[default]
    Intended,
    /// Student's t only when every assumption holds, Mann-Whitney U for
    /// everything else (Welch's t is never chosen)
    Legacy,
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Intended => "intended",
            Self::Legacy => "legacy",
        })
    }
}

impl FromStr for SelectionPolicy {
    type Err = AbTestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "intended" => Ok(Self::Intended),
            "legacy" => Ok(Self::Legacy),
            other => Err(AbTestError::invalid(format!(
                "unknown selection policy '{other}' (expected intended or legacy)"
            ))),
        }
    }
}

/// Pick the means test from assumption outcomes
#[must_use]
pub fn select_test(
    control_normal: bool,
    test_normal: bool,
    homogeneous: bool,
    policy: SelectionPolicy,
) -> TestMethod {
    let both_normal = control_normal && test_normal;
    match (policy, both_normal, homogeneous) {
        (_, true, true) => TestMethod::StudentT,
        (SelectionPolicy::Intended, true, false) => TestMethod::WelchT,
        _ => TestMethod::MannWhitneyU,
    }
}

/// Everything computed by [`analyze_means`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeansReport {
    /// Descriptive statistics of the control group
    pub control_summary: SampleSummary,
    /// Descriptive statistics of the test group
    pub test_summary: SampleSummary,
    /// Normality of the control group
    pub control_normality: AssumptionCheck,
    /// Normality of the test group
    pub test_normality: AssumptionCheck,
    /// Homogeneity of variance between the groups
    pub homogeneity: AssumptionCheck,
    /// Policy used for test selection
    pub policy: SelectionPolicy,
    /// Selected test and its outcome
    pub result: TestResult,
}

/// Run the full means comparison
///
/// # Errors
///
/// - [`AbTestError::Config`] if `config` fails [`AnalysisConfig::validate`]
/// - Failures from the assumption checks and the selected test (too few
///   observations, constant samples)
pub fn analyze_means(
    control: &Sample,
    test: &Sample,
    config: &AnalysisConfig,
) -> Result<MeansReport> {
    config.validate()?;
    let alpha = config.alpha;

    let control_normality = normality_check(control, alpha)?;
    let test_normality = normality_check(test, alpha)?;
    let homogeneity = homogeneity_check(control, test, alpha)?;

    let method = select_test(
        control_normality.satisfied,
        test_normality.satisfied,
        homogeneity.satisfied,
        config.policy,
    );
    info!(
        control_normal = control_normality.satisfied,
        test_normal = test_normality.satisfied,
        homogeneous = homogeneity.satisfied,
        policy = %config.policy,
        test = %method,
        "selected means test"
    );

    let result = run_means_test(method, control, test, config)?;
    info!(
        statistic = result.statistic,
        p_value = result.p_value,
        reject_null = result.reject_null,
        "means test complete"
    );

    Ok(MeansReport {
        control_summary: control.summary(),
        test_summary: test.summary(),
        control_normality,
        test_normality,
        homogeneity,
        policy: config.policy,
        result,
    })
}

fn run_means_test(
    method: TestMethod,
    control: &Sample,
    test: &Sample,
    config: &AnalysisConfig,
) -> Result<TestResult> {
    let (alpha, alternative) = (config.alpha, config.alternative);
    match method {
        TestMethod::StudentT => student_t_test(control, test, alpha, alternative),
        TestMethod::WelchT => welch_t_test(control, test, alpha, alternative),
        TestMethod::MannWhitneyU => mann_whitney_u(control, test, alpha, alternative),
        TestMethod::ProportionsZ => Err(AbTestError::invalid(
            "proportions z-test is not a means test",
        )),
    }
}

/// Compare conversion rates with a proportions z-test
///
/// `value` is the null difference (two groups) or null proportion (one
/// group).
///
/// # Errors
///
/// [`AbTestError::Config`] if `config` fails [`AnalysisConfig::validate`];
/// otherwise see [`proportions_z_test`].
pub fn analyze_ratios(
    successes: &[u64],
    observations: &[u64],
    value: Option<f64>,
    config: &AnalysisConfig,
) -> Result<TestResult> {
    config.validate()?;
    let result = proportions_z_test(
        successes,
        observations,
        value,
        config.alpha,
        config.alternative,
    )?;
    info!(
        statistic = result.statistic,
        p_value = result.p_value,
        reject_null = result.reject_null,
        "ratio test complete"
    );
    Ok(result)
}
