//! End-to-end tests: CSV files on disk through analysis and rendering

use std::io::Write;
use std::path::PathBuf;

use abtest::cli::handlers::{handle_check, handle_means, handle_ratios};
use abtest::loader::DEFAULT_COLUMN;
use abtest::{AbTestError, AnalysisConfig, OutputFormat, SelectionPolicy};
use tempfile::TempDir;

const CONTROL: [f64; 8] = [10.0, 12.0, 11.0, 13.0, 12.0, 10.0, 14.0, 11.0];
const TEST: [f64; 8] = [15.0, 16.0, 14.0, 17.0, 15.0, 16.0, 18.0, 15.0];

/// Write a CSV with `Impression,Click,Purchase` columns
fn write_group(dir: &TempDir, name: &str, purchases: &[f64]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "Impression,Click,Purchase").unwrap();
    for (i, purchase) in purchases.iter().enumerate() {
        writeln!(file, "{},{},{purchase}", 1000 + i, 50 + i).unwrap();
    }
    path
}

fn json_config() -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.format.output = OutputFormat::Json;
    config
}

// ============================================================================
// Means
// ============================================================================

#[test]
fn test_means_from_csv_rejects_equal_means() {
    let dir = TempDir::new().unwrap();
    let control = write_group(&dir, "control.csv", &CONTROL);
    let test = write_group(&dir, "test.csv", &TEST);

    let out = handle_means(&control, &test, DEFAULT_COLUMN, &AnalysisConfig::default()).unwrap();

    assert!(out.contains("Normality is satisfied"));
    assert!(out.contains("Homogeneity is satisfied"));
    assert!(out.contains("Test name = Two Sample T-test is applied H0 is REJECTED"));
    assert!(out.contains("significant difference between the means"));
}

#[test]
fn test_means_json_report() {
    let dir = TempDir::new().unwrap();
    let control = write_group(&dir, "control.csv", &CONTROL);
    let test = write_group(&dir, "test.csv", &TEST);

    let out = handle_means(&control, &test, DEFAULT_COLUMN, &json_config()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(json["result"]["test_name"], "Two Sample T-test");
    assert_eq!(json["result"]["reject_null"], true);
    assert_eq!(json["control_summary"]["n"], 8);
    assert_eq!(json["control_normality"]["satisfied"], true);
    assert!(json["result"]["p_value"].as_f64().unwrap() < 0.001);
}

#[test]
fn test_means_with_missing_cells() {
    let dir = TempDir::new().unwrap();
    let control = write_group(&dir, "control.csv", &CONTROL);
    let path = dir.path().join("test.csv");
    let mut body = String::from("Impression,Click,Purchase\n");
    for (i, v) in TEST.iter().enumerate() {
        body.push_str(&format!("{i},{i},{v}\n"));
    }
    body.push_str("9,9,\n10,10,NA\n");
    std::fs::write(&path, body).unwrap();

    let out = handle_means(&control, &path, DEFAULT_COLUMN, &json_config()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["test_summary"]["n"], 8);
}

#[test]
fn test_unequal_variances_follow_policy() {
    let dir = TempDir::new().unwrap();
    let narrow: Vec<f64> = (-10..=10).map(|i| 100.0 + f64::from(i) * 0.1).collect();
    let wide: Vec<f64> = (-10..=10).map(|i| 100.0 + f64::from(i)).collect();
    let control = write_group(&dir, "control.csv", &narrow);
    let test = write_group(&dir, "test.csv", &wide);

    let intended = handle_means(&control, &test, DEFAULT_COLUMN, &AnalysisConfig::default()).unwrap();
    assert!(intended.contains("Homogeneity is NOT satisfied"));
    assert!(intended.contains("Test name = Welch T-test"));
    assert!(intended.contains("H0 is NOT REJECTED"));

    let legacy = AnalysisConfig {
        policy: SelectionPolicy::Legacy,
        ..AnalysisConfig::default()
    };
    let out = handle_means(&control, &test, DEFAULT_COLUMN, &legacy).unwrap();
    assert!(out.contains("Test name = Mann-Whitney U"));
}

#[test]
fn test_unknown_column_is_reported() {
    let dir = TempDir::new().unwrap();
    let control = write_group(&dir, "control.csv", &CONTROL);
    let test = write_group(&dir, "test.csv", &TEST);

    let err = handle_means(&control, &test, "Revenue", &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AbTestError::InvalidInput { .. }));
    assert!(err.to_string().contains("Revenue"));
}

#[test]
fn test_too_small_group_fails() {
    let dir = TempDir::new().unwrap();
    let control = write_group(&dir, "control.csv", &[1.0, 2.0]);
    let test = write_group(&dir, "test.csv", &TEST);

    let err = handle_means(&control, &test, DEFAULT_COLUMN, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AbTestError::InsufficientData { required: 3, actual: 2, .. }));
}

// ============================================================================
// Ratios
// ============================================================================

#[test]
fn test_identical_ratios_not_rejected() {
    let out = handle_ratios(&[50, 50], &[100, 100], None, &AnalysisConfig::default()).unwrap();
    assert!(out.starts_with("Test name = Proportions z-test is applied H0 is NOT REJECTED"));
    assert!(out.contains("Test Stat = 0.0000, p-value = 1.0000"));
}

#[test]
fn test_different_ratios_rejected() {
    let out = handle_ratios(&[30, 50], &[100, 100], None, &json_config()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["reject_null"], true);
    let z = json["statistic"].as_f64().unwrap();
    assert!((z + 2.886_751).abs() < 1e-5);
}

#[test]
fn test_three_groups_rejected() {
    let err = handle_ratios(&[1, 2, 3], &[10, 10, 10], None, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AbTestError::InvalidInput { .. }));
}

// ============================================================================
// Check
// ============================================================================

#[test]
fn test_check_single_file() {
    let dir = TempDir::new().unwrap();
    let input = write_group(&dir, "control.csv", &CONTROL);

    let out = handle_check(&input, DEFAULT_COLUMN, &AnalysisConfig::default()).unwrap();
    assert!(out.starts_with("Test Stat = "));
    assert!(out.ends_with("Normality is satisfied"));
}
