//! Two-sample hypothesis tests for A/B experiments
//!
//! Each test consumes [`Sample`]s and produces a [`TestResult`]: the test
//! statistic, its p-value and the reject/accept decision at the caller's
//! significance level.
//!
//! ## Tests
//!
//! - **Student's t-test**: pooled variance, for normal data with equal variances
//! - **Welch's t-test**: separate variances, for normal data with unequal variances
//! - **Mann-Whitney U test**: rank based, no normality assumption
//! - **Proportions z-test**: one or two conversion rates
//!
//! ## Citations
//!
//! - Welch, B. L. (1947). "The Generalization of 'Student's' Problem."
//!   *Biometrika*, 34(1-2), 28-35.
//! - Mann, H. B., & Whitney, D. R. (1947). "On a Test of Whether one of Two
//!   Random Variables is Stochastically Larger than the Other."
//!   *Annals of Mathematical Statistics*, 18(1), 50-60.

#![allow(clippy::cast_precision_loss)] // Statistical functions need usize->f64

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::error::{AbTestError, Result};
use crate::sample::Sample;

/// Statistical test method used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    /// Two-sample t-test assuming equal variances
    StudentT,
    /// Two-sample t-test without the equal-variance assumption
    WelchT,
    /// Mann-Whitney U test (non-parametric)
    MannWhitneyU,
    /// z-test for one or two proportions
    ProportionsZ,
}

impl TestMethod {
    /// Human-readable test name used in reports
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StudentT => "Two Sample T-test",
            Self::WelchT => "Welch T-test",
            Self::MannWhitneyU => "Mann-Whitney U",
            Self::ProportionsZ => "Proportions z-test",
        }
    }
}

impl fmt::Display for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Alternative hypothesis
///
/// `Greater` means the control group (first argument) is larger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    /// Groups differ in either direction
    #[default]
    TwoSided,
    /// Control is smaller than test
    Less,
    /// Control is larger than test
    Greater,
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TwoSided => "two-sided",
            Self::Less => "less",
            Self::Greater => "greater",
        })
    }
}

impl FromStr for Alternative {
    type Err = AbTestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "two-sided" | "two_sided" | "twosided" => Ok(Self::TwoSided),
            "less" | "smaller" => Ok(Self::Less),
            "greater" | "larger" => Ok(Self::Greater),
            other => Err(AbTestError::invalid(format!(
                "unknown alternative '{other}' (expected two-sided, less or greater)"
            ))),
        }
    }
}

/// Outcome of a hypothesis test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Fixed display name of the test
    pub test_name: String,
    /// Test method identifier
    pub method: TestMethod,
    /// Test statistic (t, U or z)
    pub statistic: f64,
    /// P-value under the chosen alternative
    pub p_value: f64,
    /// Degrees of freedom, for t-tests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub df: Option<f64>,
    /// Significance level the decision was made at
    pub alpha: f64,
    /// Alternative hypothesis
    pub alternative: Alternative,
    /// Whether H0 is rejected (`p_value < alpha`)
    pub reject_null: bool,
}

impl TestResult {
    fn new(
        method: TestMethod,
        statistic: f64,
        p_value: f64,
        df: Option<f64>,
        alpha: f64,
        alternative: Alternative,
    ) -> Self {
        let p_value = p_value.clamp(0.0, 1.0);
        Self {
            test_name: method.name().to_string(),
            method,
            statistic,
            p_value,
            df,
            alpha,
            alternative,
            reject_null: p_value < alpha,
        }
    }
}

// ============================================================================
// t-tests
// ============================================================================

/// Student's two-sample t-test with pooled variance
///
/// t = (x̄₁ - x̄₂) / √(s²ₚ (1/n₁ + 1/n₂)), df = n₁ + n₂ - 2.
///
/// # Errors
///
/// - [`AbTestError::InsufficientData`] if either sample has fewer than 2 observations
/// - [`AbTestError::DegenerateSample`] if the pooled variance is zero
pub fn student_t_test(
    control: &Sample,
    test: &Sample,
    alpha: f64,
    alternative: Alternative,
) -> Result<TestResult> {
    const NAME: &str = TestMethod::StudentT.name();
    require_len(NAME, control, 2)?;
    require_len(NAME, test, 2)?;

    let n1 = control.len() as f64;
    let n2 = test.len() as f64;
    let df = n1 + n2 - 2.0;

    let pooled = ((n1 - 1.0) * control.variance() + (n2 - 1.0) * test.variance()) / df;
    let se = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    if se <= 0.0 || !se.is_finite() {
        return Err(AbTestError::degenerate(NAME, "pooled variance is zero"));
    }

    let t_stat = (control.mean() - test.mean()) / se;
    let p_value = t_p_value(t_stat, df, alternative)?;

    Ok(TestResult::new(
        TestMethod::StudentT,
        t_stat,
        p_value,
        Some(df),
        alpha,
        alternative,
    ))
}

/// Welch's t-test (unequal variances)
///
/// t = (x̄₁ - x̄₂) / √(s²₁/n₁ + s²₂/n₂) with Welch-Satterthwaite degrees of freedom.
///
/// # Errors
///
/// - [`AbTestError::InsufficientData`] if either sample has fewer than 2 observations
/// - [`AbTestError::DegenerateSample`] if both variances are zero
pub fn welch_t_test(
    control: &Sample,
    test: &Sample,
    alpha: f64,
    alternative: Alternative,
) -> Result<TestResult> {
    const NAME: &str = TestMethod::WelchT.name();
    require_len(NAME, control, 2)?;
    require_len(NAME, test, 2)?;

    let n1 = control.len() as f64;
    let n2 = test.len() as f64;

    let vn1 = control.variance() / n1;
    let vn2 = test.variance() / n2;
    let se = (vn1 + vn2).sqrt();
    if se <= 0.0 || !se.is_finite() {
        return Err(AbTestError::degenerate(NAME, "both samples have zero variance"));
    }

    let df = (vn1 + vn2).powi(2) / (vn1.powi(2) / (n1 - 1.0) + vn2.powi(2) / (n2 - 1.0));
    let t_stat = (control.mean() - test.mean()) / se;
    let p_value = t_p_value(t_stat, df, alternative)?;

    Ok(TestResult::new(
        TestMethod::WelchT,
        t_stat,
        p_value,
        Some(df),
        alpha,
        alternative,
    ))
}

fn t_p_value(t_stat: f64, df: f64, alternative: Alternative) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).map_err(AbTestError::distribution)?;
    Ok(match alternative {
        Alternative::TwoSided => 2.0 * dist.sf(t_stat.abs()),
        Alternative::Less => dist.cdf(t_stat),
        Alternative::Greater => dist.sf(t_stat),
    })
}

// ============================================================================
// Mann-Whitney U Test
// ============================================================================

/// The exact U distribution is used while the smaller group has at most
/// this many observations
const MWU_EXACT_MAX_N: usize = 8;

/// Mann-Whitney U test for non-parametric comparison
///
/// Also known as Wilcoxon rank-sum test. Compares two independent samples
/// without assuming normality. The reported statistic is U for the control
/// sample.
///
/// ## Algorithm
///
/// 1. Combine and rank all observations
/// 2. Handle ties by assigning average ranks
/// 3. Compute U from the control rank sum
/// 4. Exact null distribution when either group has at most 8 observations
///    and there are no ties; otherwise normal approximation with tie and
///    continuity corrections
///
/// # Errors
///
/// - [`AbTestError::InsufficientData`] if either sample is empty
/// - [`AbTestError::DegenerateSample`] if every observation is tied
pub fn mann_whitney_u(
    control: &Sample,
    test: &Sample,
    alpha: f64,
    alternative: Alternative,
) -> Result<TestResult> {
    const NAME: &str = TestMethod::MannWhitneyU.name();
    require_len(NAME, control, 1)?;
    require_len(NAME, test, 1)?;

    let n1 = control.len();
    let n2 = test.len();

    // Combine samples with group labels
    let mut combined: Vec<(f64, usize)> = control
        .values()
        .iter()
        .map(|&x| (x, 0)) // Group 0 = control
        .chain(test.values().iter().map(|&x| (x, 1))) // Group 1 = test
        .collect();

    combined.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (ranks, tie_sizes) = assign_ranks_with_ties(&combined);

    let r1: f64 = ranks
        .iter()
        .filter(|(_, group)| *group == 0)
        .map(|(rank, _)| rank)
        .sum();

    let u1 = r1 - (n1 * (n1 + 1)) as f64 / 2.0;
    let u2 = (n1 * n2) as f64 - u1;

    let (u, factor) = match alternative {
        Alternative::Greater => (u1, 1.0),
        Alternative::Less => (u2, 1.0),
        Alternative::TwoSided => (u1.max(u2), 2.0),
    };

    let has_ties = tie_sizes.iter().any(|&t| t > 1);
    let p_one_sided = if !has_ties && n1.min(n2) <= MWU_EXACT_MAX_N {
        mwu_exact_sf(u, n1, n2)
    } else {
        mwu_asymptotic_sf(u, n1, n2, &tie_sizes)?
    };

    Ok(TestResult::new(
        TestMethod::MannWhitneyU,
        u1,
        p_one_sided * factor,
        None,
        alpha,
        alternative,
    ))
}

/// Assign ranks to sorted values, handling ties by averaging
///
/// Returns `(rank, group)` pairs and the size of every tie block.
fn assign_ranks_with_ties(sorted: &[(f64, usize)]) -> (Vec<(f64, usize)>, Vec<usize>) {
    let mut ranks = Vec::with_capacity(sorted.len());
    let mut tie_sizes = Vec::new();
    let mut i = 0;

    while i < sorted.len() {
        let value = sorted[i].0;
        let mut j = i;

        // Find extent of tie
        while j < sorted.len() && sorted[j].0 == value {
            j += 1;
        }

        // Ranks are 1-indexed: positions i..j get ranks (i+1)..=j
        let avg_rank = (i + 1 + j) as f64 / 2.0;

        for item in sorted.iter().take(j).skip(i) {
            ranks.push((avg_rank, item.1));
        }
        tie_sizes.push(j - i);

        i = j;
    }

    (ranks, tie_sizes)
}

/// P(U >= u) under the normal approximation
fn mwu_asymptotic_sf(u: f64, n1: usize, n2: usize, tie_sizes: &[usize]) -> Result<f64> {
    let n = (n1 + n2) as f64;
    let n1n2 = (n1 * n2) as f64;
    let mu = n1n2 / 2.0;

    let tie_term: f64 = tie_sizes
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let var = n1n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if var <= 0.0 || !var.is_finite() {
        return Err(AbTestError::degenerate(
            "Mann-Whitney U",
            "all observations are tied",
        ));
    }

    // Continuity correction
    let z = (u - mu - 0.5) / var.sqrt();
    Ok(standard_normal()?.sf(z))
}

/// P(U >= u) from the exact permutation distribution (no ties)
fn mwu_exact_sf(u: f64, n1: usize, n2: usize) -> f64 {
    let counts = mwu_exact_counts(n1, n2);
    let total: f64 = counts.iter().sum();
    let start = u.ceil().max(0.0) as usize;
    let upper: f64 = counts.iter().skip(start).sum();
    upper / total
}

/// Number of rank arrangements yielding each U value in `0..=n1*n2`
///
/// The counts are the coefficients of the Gaussian binomial
/// `[n+m choose m]_q = prod_{i=1..m} (1 - q^(n+i)) / (1 - q^i)` with
/// `m = min(n1, n2)`, built one factor at a time in O(m^2 * n).
fn mwu_exact_counts(n1: usize, n2: usize) -> Vec<f64> {
    let (m, n) = (n1.min(n2), n1.max(n2));
    let max_u = m * n;

    let mut counts = vec![0.0; max_u + 1];
    counts[0] = 1.0;
    for i in 1..=m {
        // Multiply by (1 - q^(n+i)); terms above max_u never feed back down
        let shift = n + i;
        for k in (shift..=max_u).rev() {
            counts[k] -= counts[k - shift];
        }
        // Divide by (1 - q^i)
        for k in i..=max_u {
            counts[k] += counts[k - i];
        }
    }
    counts
}

// ============================================================================
// Proportions z-test
// ============================================================================

/// z-test for one or two proportions
///
/// With two groups, tests p₁ - p₂ = `value` (default 0) using the pooled
/// proportion for the standard error. With one group, tests p = `value`
/// using the sample proportion for the standard error.
///
/// # Errors
///
/// - [`AbTestError::InvalidInput`] for mismatched lengths, more than two
///   groups, zero observations, successes exceeding observations, or a
///   one-group test without `value`
/// - [`AbTestError::DegenerateSample`] if the pooled proportion is 0 or 1
pub fn proportions_z_test(
    successes: &[u64],
    observations: &[u64],
    value: Option<f64>,
    alpha: f64,
    alternative: Alternative,
) -> Result<TestResult> {
    const NAME: &str = TestMethod::ProportionsZ.name();

    if successes.len() != observations.len() {
        return Err(AbTestError::invalid(format!(
            "{} success counts but {} observation counts",
            successes.len(),
            observations.len()
        )));
    }
    for (&count, &nobs) in successes.iter().zip(observations) {
        if nobs == 0 {
            return Err(AbTestError::invalid("observation counts must be positive"));
        }
        if count > nobs {
            return Err(AbTestError::invalid(format!(
                "success count {count} exceeds observation count {nobs}"
            )));
        }
    }

    let props: Vec<f64> = successes
        .iter()
        .zip(observations)
        .map(|(&c, &n)| c as f64 / n as f64)
        .collect();

    let diff = match (props.as_slice(), value) {
        ([p], Some(v)) => p - v,
        ([_], None) => {
            return Err(AbTestError::invalid(
                "a null value is required for a one-sample proportions test",
            ))
        },
        ([p1, p2], v) => p1 - p2 - v.unwrap_or(0.0),
        _ => {
            return Err(AbTestError::invalid(format!(
                "proportions test supports one or two groups, got {}",
                props.len()
            )))
        },
    };

    let pooled = successes.iter().sum::<u64>() as f64 / observations.iter().sum::<u64>() as f64;
    let nobs_fact: f64 = observations.iter().map(|&n| 1.0 / n as f64).sum();
    let se = (pooled * (1.0 - pooled) * nobs_fact).sqrt();
    if se <= 0.0 {
        return Err(AbTestError::degenerate(
            NAME,
            format!("pooled proportion is {pooled}, variance is zero"),
        ));
    }

    let z = diff / se;
    let normal = standard_normal()?;
    let p_value = match alternative {
        Alternative::TwoSided => 2.0 * normal.sf(z.abs()),
        Alternative::Less => normal.cdf(z),
        Alternative::Greater => normal.sf(z),
    };

    Ok(TestResult::new(
        TestMethod::ProportionsZ,
        z,
        p_value,
        None,
        alpha,
        alternative,
    ))
}

// ============================================================================
// Helpers
// ============================================================================

pub(crate) fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(AbTestError::distribution)
}

pub(crate) fn require_len(test: &'static str, sample: &Sample, required: usize) -> Result<()> {
    if sample.len() < required {
        return Err(AbTestError::InsufficientData {
            test,
            required,
            actual: sample.len(),
        });
    }
    Ok(())
}
