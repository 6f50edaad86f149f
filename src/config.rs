//! Layered analysis configuration
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults (alpha = 0.05, intended selection, two-sided)
//! 2. An optional TOML file
//! 3. Environment variables with the `ABTEST_` prefix; `__` separates
//!    nested keys, e.g. `ABTEST_FORMAT__PRECISION=6`
//!
//! Command-line flags are applied on top by the CLI.
//!
//! ```toml
//! alpha = 0.01
//! policy = "legacy"
//! alternative = "two-sided"
//!
//! [format]
//! precision = 5
//! output = "json"
//! ```

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::analysis::SelectionPolicy;
use crate::error::{AbTestError, Result};
use crate::report::{FormatConfig, MAX_PRECISION};
use crate::stats::Alternative;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ABTEST_";

/// Default significance level
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Configuration for experiment analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Significance level for every decision
    pub alpha: f64,
    /// Test selection policy for means
    pub policy: SelectionPolicy,
    /// Alternative hypothesis for the final test
    pub alternative: Alternative,
    /// Report formatting
    pub format: FormatConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            policy: SelectionPolicy::default(),
            alternative: Alternative::default(),
            format: FormatConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Provider chain: defaults, then `path` (if any), then environment
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`AbTestError::Config`] if `path` does not exist, a source
    /// cannot be parsed, or the resulting values are out of range.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(AbTestError::Config(format!(
                    "config file {} not found",
                    path.display()
                )));
            }
        }
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`AbTestError::Config`] if alpha is outside (0, 1) or the
    /// precision exceeds [`MAX_PRECISION`].
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AbTestError::Config(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.format.precision > MAX_PRECISION {
            return Err(AbTestError::Config(format!(
                "precision must be at most {MAX_PRECISION}, got {}",
                self.format.precision
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::OutputFormat;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.policy, SelectionPolicy::Intended);
        assert_eq!(config.alternative, Alternative::TwoSided);
        assert_eq!(config.format.precision, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_sources_gives_defaults() {
        Jail::expect_with(|_jail| {
            let config = AnalysisConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config, AnalysisConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "abtest.toml",
                r#"
                alpha = 0.01
                policy = "legacy"
                alternative = "greater"

                [format]
                precision = 6
                output = "json"
                "#,
            )?;
            let config =
                AnalysisConfig::load(Some(Path::new("abtest.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.alpha, 0.01);
            assert_eq!(config.policy, SelectionPolicy::Legacy);
            assert_eq!(config.alternative, Alternative::Greater);
            assert_eq!(config.format.precision, 6);
            assert_eq!(config.format.output, OutputFormat::Json);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("abtest.toml", "alpha = 0.01")?;
            jail.set_env("ABTEST_ALPHA", "0.1");
            jail.set_env("ABTEST_FORMAT__PRECISION", "2");
            let config =
                AnalysisConfig::load(Some(Path::new("abtest.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.alpha, 0.1);
            assert_eq!(config.format.precision, 2);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_is_an_error() {
        Jail::expect_with(|_jail| {
            let err = AnalysisConfig::load(Some(Path::new("nope.toml"))).unwrap_err();
            assert!(matches!(err, AbTestError::Config(_)));
            Ok(())
        });
    }

    #[test]
    fn test_out_of_range_alpha_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("ABTEST_ALPHA", "1.5");
            let err = AnalysisConfig::load(None).unwrap_err();
            assert!(err.to_string().contains("alpha"));
            Ok(())
        });
    }

    #[test]
    fn test_excess_precision_is_rejected() {
        let config = AnalysisConfig {
            format: FormatConfig {
                precision: 20,
                ..FormatConfig::default()
            },
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
