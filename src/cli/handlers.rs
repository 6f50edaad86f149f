//! Argument definitions and command handlers
//!
//! Handlers return the rendered report instead of printing it, so they can
//! be exercised in tests without capturing stdout.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::analysis::{analyze_means, analyze_ratios, SelectionPolicy};
use crate::assumptions::normality_check;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::loader::{load_column, DEFAULT_COLUMN};
use crate::report::{
    render_assumption_report, render_means_report, render_ratio_report, OutputFormat,
};
use crate::stats::Alternative;

/// abtest - classical A/B test analysis
///
/// Checks normality and variance homogeneity, picks a suitable two-sample
/// test and reports whether the groups differ significantly.
#[derive(Parser, Debug)]
#[command(name = "abtest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare group means with automatic test selection
    ///
    /// Examples:
    ///   abtest means --control control.csv --test test.csv
    ///   abtest means --control c.csv --test t.csv --column Revenue --policy legacy
    Means {
        /// CSV file holding the control group
        #[arg(long, value_name = "CSV")]
        control: PathBuf,

        /// CSV file holding the test group
        #[arg(long, value_name = "CSV")]
        test: PathBuf,

        /// Column to read from both files
        #[arg(long, default_value = DEFAULT_COLUMN)]
        column: String,

        /// Configuration overrides
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Compare conversion rates with a proportions z-test
    ///
    /// Examples:
    ///   abtest ratios --successes 300,250 --observations 1000,1100
    ///   abtest ratios --successes 40 --observations 100 --value 0.5
    Ratios {
        /// Success counts, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        successes: Vec<u64>,

        /// Observation counts, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        observations: Vec<u64>,

        /// Null difference (two groups) or null proportion (one group)
        #[arg(long)]
        value: Option<f64>,

        /// Configuration overrides
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Run the normality check on a single sample
    Check {
        /// CSV file holding the sample
        #[arg(long, value_name = "CSV")]
        input: PathBuf,

        /// Column to read
        #[arg(long, default_value = DEFAULT_COLUMN)]
        column: String,

        /// Configuration overrides
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Per-run overrides of the loaded configuration
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Significance level
    #[arg(short, long)]
    pub alpha: Option<f64>,

    /// Test selection policy: intended or legacy
    #[arg(long)]
    pub policy: Option<SelectionPolicy>,

    /// Alternative hypothesis: two-sided, less or greater
    #[arg(long)]
    pub alternative: Option<Alternative>,

    /// Output format: text or json
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Decimals for statistics and p-values
    #[arg(long)]
    pub precision: Option<usize>,
}

impl Overrides {
    /// Apply the flags that were given and re-validate
    pub fn apply(&self, mut config: AnalysisConfig) -> Result<AnalysisConfig> {
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(alternative) = self.alternative {
            config.alternative = alternative;
        }
        if let Some(output) = self.format {
            config.format.output = output;
        }
        if let Some(precision) = self.precision {
            config.format.precision = precision;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Load both groups, run the means pipeline and render it
pub fn handle_means(
    control: &Path,
    test: &Path,
    column: &str,
    config: &AnalysisConfig,
) -> Result<String> {
    let control = load_column(control, column)?;
    let test = load_column(test, column)?;
    let report = analyze_means(&control, &test, config)?;
    render_means_report(&report, &config.format)
}

/// Run the proportions z-test and render it
pub fn handle_ratios(
    successes: &[u64],
    observations: &[u64],
    value: Option<f64>,
    config: &AnalysisConfig,
) -> Result<String> {
    let result = analyze_ratios(successes, observations, value, config)?;
    render_ratio_report(&result, &config.format)
}

/// Run a normality check on one file and render it
pub fn handle_check(input: &Path, column: &str, config: &AnalysisConfig) -> Result<String> {
    let sample = load_column(input, column)?;
    let check = normality_check(&sample, config.alpha)?;
    render_assumption_report(&check, &config.format)
}
