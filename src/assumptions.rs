//! Assumption checks run before choosing a means test
//!
//! - **Normality**: Shapiro-Wilk W test, Royston (1992, 1995) approximation
//! - **Homogeneity of variance**: Levene's test centred on the median
//!   (Brown-Forsythe variant)
//!
//! Both checks report an [`AssumptionCheck`] whose `satisfied` flag is
//! `p_value >= alpha`. Inputs the routines cannot handle are returned as
//! errors rather than folded into a verdict.
//!
//! ## Citations
//!
//! - Shapiro & Wilk (1965). "An analysis of variance test for normality".
//!   Biometrika, 52(3-4), 591-611.
//! - Royston (1995). "Remark AS R94: A remark on Algorithm AS 181".
//!   Applied Statistics, 44(4), 547-551.
//! - Brown & Forsythe (1974). "Robust tests for the equality of variances".
//!   JASA, 69(346), 364-367.

#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use tracing::{debug, warn};

use crate::error::{AbTestError, Result};
use crate::sample::{self, Sample};
use crate::stats::{require_len, standard_normal};

const SHAPIRO_WILK: &str = "Shapiro-Wilk";
const LEVENE: &str = "Levene";

/// Largest sample for which the Royston p-value is calibrated
const SHAPIRO_WILK_MAX_N: usize = 5000;

/// Which assumption a check covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionKind {
    /// Sample drawn from a normal distribution
    Normality,
    /// Groups share a common variance
    Homogeneity,
}

impl AssumptionKind {
    /// Label used in verdict strings
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normality => "Normality",
            Self::Homogeneity => "Homogeneity",
        }
    }
}

/// Result of an assumption check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionCheck {
    /// Assumption being checked
    pub kind: AssumptionKind,
    /// Name of the underlying test
    pub test_name: String,
    /// Test statistic (W or F)
    pub statistic: f64,
    /// P-value of the test
    pub p_value: f64,
    /// Whether the assumption holds (`p_value >= alpha`)
    pub satisfied: bool,
}

impl AssumptionCheck {
    fn new(
        kind: AssumptionKind,
        test_name: &str,
        statistic: f64,
        p_value: f64,
        alpha: f64,
    ) -> Self {
        let p_value = p_value.clamp(0.0, 1.0);
        Self {
            kind,
            test_name: test_name.to_string(),
            statistic,
            p_value,
            satisfied: p_value >= alpha,
        }
    }
}

// ============================================================================
// Normality (Shapiro-Wilk)
// ============================================================================

/// Check whether a sample is consistent with a normal distribution
///
/// # Errors
///
/// - [`AbTestError::InsufficientData`] if the sample has fewer than 3 observations
/// - [`AbTestError::DegenerateSample`] if every observation is identical
pub fn normality_check(sample: &Sample, alpha: f64) -> Result<AssumptionCheck> {
    let (w, p_value) = shapiro_wilk(sample)?;
    let check = AssumptionCheck::new(AssumptionKind::Normality, SHAPIRO_WILK, w, p_value, alpha);
    debug!(
        statistic = check.statistic,
        p_value = check.p_value,
        satisfied = check.satisfied,
        "normality check"
    );
    Ok(check)
}

/// Shapiro-Wilk W statistic and p-value
///
/// Coefficients come from Blom's approximation to the expected normal order
/// statistics with Royston's polynomial corrections; the p-value uses
/// Royston's normalizing transformation of W. n = 3 uses the exact formula.
///
/// # Errors
///
/// See [`normality_check`].
pub fn shapiro_wilk(sample: &Sample) -> Result<(f64, f64)> {
    require_len(SHAPIRO_WILK, sample, 3)?;
    let n = sample.len();
    if n > SHAPIRO_WILK_MAX_N {
        warn!(n, "Shapiro-Wilk p-value may be inaccurate for n > 5000");
    }

    let mut x = sample.values().to_vec();
    x.sort_by(f64::total_cmp);

    let range = x[n - 1] - x[0];
    if range <= 0.0 {
        return Err(AbTestError::degenerate(
            SHAPIRO_WILK,
            "all observations are identical",
        ));
    }

    if n == 3 {
        return Ok(shapiro_wilk_n3(&x));
    }

    let a = sw_coefficients(n)?;
    let w = sw_statistic(&x, &a).min(1.0);
    let p_value = sw_p_value(w, n)?;
    Ok((w, p_value))
}

// n = 3: a = [sqrt(1/2), 0, -sqrt(1/2)], exact p-value
fn shapiro_wilk_n3(x: &[f64]) -> (f64, f64) {
    let mean = sample::mean(x);
    let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();

    let numerator = std::f64::consts::FRAC_1_SQRT_2 * (x[2] - x[0]);
    let w = (numerator * numerator / ss).clamp(0.75, 1.0);

    // p = (6/pi) * (asin(sqrt(w)) - asin(sqrt(3/4)))
    let p = 6.0 / std::f64::consts::PI * (w.sqrt().asin() - std::f64::consts::FRAC_PI_3);
    (w, p.clamp(0.0, 1.0))
}

// Royston polynomial coefficients (AS R94)
const SW_C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_19, 4.434_685, -2.706_056];
const SW_C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];
const SW_C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.778_57, 0.062_767, -0.002_032_2];
const SW_C5: [f64; 4] = [-1.5861, -0.310_82, -0.083_751, 0.003_891_5];
const SW_C6: [f64; 3] = [-0.4803, -0.082_676, 0.003_030_2];
const SW_G: [f64; 2] = [-2.273, 0.459];

// c[0] + c[1]*x + c[2]*x^2 + ... (Horner)
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

// Antisymmetric weights for the lower half of the order statistics
fn sw_coefficients(n: usize) -> Result<Vec<f64>> {
    let nn2 = n / 2;
    let normal = standard_normal()?;
    let nf = n as f64;

    // Blom's approximation: m[i] is the expected (i+1)-th order statistic
    let m: Vec<f64> = (0..nn2)
        .map(|i| normal.inverse_cdf((i as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let a1 = poly(&SW_C1, rsn) - m[0] / ssumm2;

    // For n <= 5 only the extreme weight is corrected; above that, the two outermost
    let corrected = if n <= 5 { 1 } else { 2 };
    let mut a = Vec::with_capacity(nn2);
    a.push(a1);
    let (fac_sq, one_minus) = if corrected == 1 {
        (summ2 - 2.0 * m[0] * m[0], 1.0 - 2.0 * a1 * a1)
    } else {
        let a2 = -m[1] / ssumm2 + poly(&SW_C2, rsn);
        a.push(a2);
        (
            summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1],
            1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2,
        )
    };
    if fac_sq <= 0.0 || one_minus <= 0.0 {
        return Err(AbTestError::degenerate(
            SHAPIRO_WILK,
            "coefficient normalization failed",
        ));
    }
    let fac = (fac_sq / one_minus).sqrt();
    a.extend(m.iter().skip(corrected).map(|mi| -mi / fac));

    Ok(a)
}

// W = (sum a_i * (x_(n+1-i) - x_(i)))^2 / sum (x_i - mean)^2
fn sw_statistic(x: &[f64], a: &[f64]) -> f64 {
    let n = x.len();
    let sa: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();

    let mean = sample::mean(x);
    let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();

    (sa * sa) / ss
}

fn sw_p_value(w: f64, n: usize) -> Result<f64> {
    let nf = n as f64;
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return Ok(1.0);
    }
    let y = w1.ln();
    let normal = standard_normal()?;

    let z = if n <= 11 {
        let gamma = poly(&SW_G, nf);
        if y >= gamma {
            return Ok(0.0);
        }
        let y2 = -(gamma - y).ln();
        let m = poly(&SW_C3, nf);
        let s = poly(&SW_C4, nf).exp();
        (y2 - m) / s
    } else {
        let xx = nf.ln();
        let m = poly(&SW_C5, xx);
        let s = poly(&SW_C6, xx).exp();
        (y - m) / s
    };

    Ok(normal.sf(z))
}

// ============================================================================
// Homogeneity of variance (Levene)
// ============================================================================

/// Check whether control and test share a common variance
///
/// # Errors
///
/// - [`AbTestError::InsufficientData`] if either sample has fewer than 2 observations
/// - [`AbTestError::DegenerateSample`] if the absolute deviations have no spread
pub fn homogeneity_check(control: &Sample, test: &Sample, alpha: f64) -> Result<AssumptionCheck> {
    let (f, p_value) = levene(&[control, test])?;
    let check = AssumptionCheck::new(AssumptionKind::Homogeneity, LEVENE, f, p_value, alpha);
    debug!(
        statistic = check.statistic,
        p_value = check.p_value,
        satisfied = check.satisfied,
        "homogeneity check"
    );
    Ok(check)
}

/// Levene's F statistic and p-value for two or more groups
///
/// 1. zᵢⱼ = |xᵢⱼ - median(groupᵢ)|
/// 2. One-way ANOVA on the z values; F ~ F(k-1, N-k)
///
/// # Errors
///
/// See [`homogeneity_check`]; also [`AbTestError::InvalidInput`] for fewer
/// than two groups.
pub fn levene(groups: &[&Sample]) -> Result<(f64, f64)> {
    let k = groups.len();
    if k < 2 {
        return Err(AbTestError::invalid(format!(
            "Levene's test needs at least two groups, got {k}"
        )));
    }
    for group in groups {
        require_len(LEVENE, group, 2)?;
    }

    let z_groups: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let median = g.median();
            g.values().iter().map(|&x| (x - median).abs()).collect()
        })
        .collect();

    let total_n: usize = z_groups.iter().map(Vec::len).sum();
    let grand_mean = z_groups.iter().flatten().sum::<f64>() / total_n as f64;
    let group_means: Vec<f64> = z_groups.iter().map(|z| sample::mean(z)).collect();

    let ss_between: f64 = z_groups
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.len() as f64 * (m - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = z_groups
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.iter().map(|v| (v - m).powi(2)).sum::<f64>())
        .sum();

    if ss_within <= 0.0 {
        return Err(AbTestError::degenerate(
            LEVENE,
            "absolute deviations from the median have zero within-group spread",
        ));
    }

    let df_between = (k - 1) as f64;
    let df_within = (total_n - k) as f64;
    let f = (ss_between / df_between) / (ss_within / df_within);

    let dist = FisherSnedecor::new(df_between, df_within).map_err(AbTestError::distribution)?;
    Ok((f, dist.sf(f)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: &[f64]) -> Sample {
        Sample::new(values.to_vec()).unwrap()
    }

    // ========================================================================
    // Shapiro-Wilk
    // ========================================================================

    #[test]
    fn test_symmetric_data_is_normal() {
        let data = sample(&[-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5]);
        let check = normality_check(&data, 0.05).unwrap();
        assert!(check.statistic > 0.95);
        assert!(check.p_value > 0.9);
        assert!(check.satisfied);
        assert_eq!(check.kind, AssumptionKind::Normality);
    }

    #[test]
    fn test_heavily_skewed_data_is_not_normal() {
        let data = sample(&[1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 5.0, 10.0, 20.0, 50.0]);
        let check = normality_check(&data, 0.05).unwrap();
        assert!(check.statistic < 0.7);
        assert!(check.p_value < 0.001);
        assert!(!check.satisfied);
    }

    #[test]
    fn test_small_sample_with_outlier_is_not_normal() {
        let data = sample(&[1.0, 1.1, 1.2, 1.3, 100.0]);
        let check = normality_check(&data, 0.05).unwrap();
        assert!(!check.satisfied);
    }

    #[test]
    fn test_shapiro_wilk_n3_exact() {
        // W = 0.5 * 9 / (14/3) = 27/28
        let (w, p) = shapiro_wilk(&sample(&[1.0, 2.0, 4.0])).unwrap();
        assert!((w - 27.0 / 28.0).abs() < 1e-12);
        assert!((p - 0.636_887).abs() < 1e-5);
    }

    #[test]
    fn test_shapiro_wilk_requires_three_observations() {
        let err = shapiro_wilk(&sample(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(
            err,
            AbTestError::InsufficientData {
                required: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_shapiro_wilk_constant_sample_is_degenerate() {
        let err = shapiro_wilk(&sample(&[4.0, 4.0, 4.0, 4.0])).unwrap_err();
        assert!(matches!(err, AbTestError::DegenerateSample { .. }));
    }

    #[test]
    fn test_shapiro_wilk_is_location_scale_invariant() {
        let base = [3.1, 4.7, 2.2, 5.9, 4.4, 3.8, 6.1, 2.9, 4.0, 5.2, 3.3, 4.9, 4.1];
        let shifted: Vec<f64> = base.iter().map(|x| x * 10.0 + 100.0).collect();
        let (w1, p1) = shapiro_wilk(&sample(&base)).unwrap();
        let (w2, p2) = shapiro_wilk(&sample(&shifted)).unwrap();
        assert!((w1 - w2).abs() < 1e-9);
        assert!((p1 - p2).abs() < 1e-9);
    }

    #[test]
    fn test_evenly_spaced_twenty_is_normal() {
        let data: Vec<f64> = (1..=20).map(f64::from).collect();
        let check = normality_check(&sample(&data), 0.05).unwrap();
        assert!(check.satisfied);
        assert!(check.statistic > 0.9 && check.statistic <= 1.0);
    }

    #[test]
    fn test_coefficients_are_normalized() {
        for n in [4, 5, 6, 11, 12, 50] {
            let a = sw_coefficients(n).unwrap();
            // Full antisymmetric vector has unit length
            let sum_sq = 2.0 * a.iter().map(|v| v * v).sum::<f64>();
            assert!((sum_sq - 1.0).abs() < 1e-9, "n = {n}: {sum_sq}");
            assert!(a.iter().all(|&v| v > 0.0));
        }
    }

    #[test]
    fn test_shapiro_wilk_above_5000_still_computes() {
        let n = SHAPIRO_WILK_MAX_N + 1;
        let normal = standard_normal().unwrap();
        let values: Vec<f64> = (0..n)
            .map(|i| normal.inverse_cdf((i as f64 + 0.5) / n as f64))
            .collect();

        let check = normality_check(&sample(&values), 0.05).unwrap();

        assert!(check.statistic > 0.99 && check.statistic <= 1.0);
        assert!(check.p_value.is_finite());
        assert!(check.satisfied);
    }

    #[test]
    fn test_poly_horner() {
        // 1 + 2x + 3x^2 at x = 2
        assert_eq!(poly(&[1.0, 2.0, 3.0], 2.0), 17.0);
    }

    // ========================================================================
    // Levene
    // ========================================================================

    #[test]
    fn test_levene_detects_variance_difference() {
        let narrow: Vec<f64> = (-10..=10).map(|i| f64::from(i) * 0.1).collect();
        let wide: Vec<f64> = (-10..=10).map(f64::from).collect();
        let check = homogeneity_check(&sample(&narrow), &sample(&wide), 0.05).unwrap();
        assert!(!check.satisfied);
        assert!(check.p_value < 1e-6);
        assert_eq!(check.kind, AssumptionKind::Homogeneity);
    }

    #[test]
    fn test_levene_equal_spread_is_homogeneous() {
        let control = sample(&[10.0, 12.0, 11.0, 13.0, 12.0, 10.0, 14.0, 11.0]);
        let test = sample(&[15.0, 16.0, 14.0, 17.0, 15.0, 16.0, 18.0, 15.0]);
        let check = homogeneity_check(&control, &test, 0.05).unwrap();
        assert!((check.statistic - 1.0 / 9.0).abs() < 1e-12);
        assert!(check.satisfied);
    }

    #[test]
    fn test_levene_known_value() {
        let g1 = sample(&[4.9, 5.0, 5.0, 5.1, 5.0]);
        let g2 = sample(&[0.0, 3.0, 5.0, 7.0, 10.0]);
        let (f, p) = levene(&[&g1, &g2]).unwrap();
        assert!((f - 8.098_66).abs() < 1e-4);
        assert!((p - 0.021_62).abs() < 1e-4);
    }

    #[test]
    fn test_levene_requires_two_groups() {
        let g = sample(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            levene(&[&g]),
            Err(AbTestError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_levene_requires_two_observations_per_group() {
        let g1 = sample(&[1.0]);
        let g2 = sample(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            levene(&[&g1, &g2]),
            Err(AbTestError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_levene_constant_groups_are_degenerate() {
        let g1 = sample(&[1.0, 1.0, 1.0]);
        let g2 = sample(&[5.0, 5.0, 5.0]);
        assert!(matches!(
            levene(&[&g1, &g2]),
            Err(AbTestError::DegenerateSample { .. })
        ));
    }
}
