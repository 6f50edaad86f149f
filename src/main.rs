//! abtest CLI - classical A/B test analysis
//!
//! # Commands
//!
//! - `means` - Compare group means (assumption checks + automatic test selection)
//! - `ratios` - Compare conversion rates with a proportions z-test
//! - `check` - Normality check on a single sample

use std::process::ExitCode;

use abtest::cli::{init_tracing, run, Cli};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    run(cli)
}
