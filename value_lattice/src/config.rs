//! Analysis configuration.
//!
//! Every knob that used to be a process-wide constant (the value-set cap, the
//! range overflow mode) lives here and is passed explicitly into each analysis.
//! Configuration can be built in code, parsed from TOML, or overridden from the
//! environment.
//!
//! ```toml
//! max_values = 10
//! ignore_overflow = false
//! max_argument_combinations = 1000
//! ```

use crate::lattice::range::OverflowMode;
use crate::lattice::widening::{
    DEFAULT_MAX_ARGUMENT_COMBINATIONS, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_VALUES,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;

/// Error loading or validating an [`AnalysisConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Knobs for one value analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Largest value set kept exactly; bigger sets collapse to `Unknown`.
    pub max_values: usize,
    /// Clip overflowing range bounds instead of widening to `EVERYTHING`.
    pub ignore_overflow: bool,
    /// Largest cartesian product of argument values evaluated per node.
    pub max_argument_combinations: usize,
    /// Treat non-literal string operands of `+` as possibly null.
    pub assume_nullable_strings: bool,
    /// Loop iterations before the analysis gives up on a fixed point.
    pub max_iterations: usize,
    /// Loop iterations before ranges are widened (`max_values + 1` when unset).
    pub widening_threshold: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_values: DEFAULT_MAX_VALUES,
            ignore_overflow: false,
            max_argument_combinations: DEFAULT_MAX_ARGUMENT_COMBINATIONS,
            assume_nullable_strings: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            widening_threshold: None,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Default configuration with `VALUE_LATTICE_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(max) = usize_from_env("VALUE_LATTICE_MAX_VALUES") {
            if max > 0 {
                config.max_values = max;
            }
        }
        if let Ok(val) = env::var("VALUE_LATTICE_IGNORE_OVERFLOW") {
            config.ignore_overflow = matches!(val.trim(), "1" | "true" | "yes");
        }
        config
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_values == 0 {
            return Err(ConfigError::Invalid(
                "max_values must be at least 1".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Overflow behavior for range arithmetic.
    pub fn overflow_mode(&self) -> OverflowMode {
        if self.ignore_overflow {
            OverflowMode::Ignore
        } else {
            OverflowMode::Wrap
        }
    }

    /// Loop iteration at which ranges start being widened.
    pub fn widening_threshold(&self) -> usize {
        self.widening_threshold.unwrap_or(self.max_values + 1)
    }
}

fn usize_from_env(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|val| val.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.max_values, 10);
        assert!(!config.ignore_overflow);
        assert_eq!(config.overflow_mode(), OverflowMode::Wrap);
        assert_eq!(config.widening_threshold(), 11);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str("ignore_overflow = true").unwrap();
        assert!(config.ignore_overflow);
        assert_eq!(config.max_values, 10);
        assert_eq!(config.overflow_mode(), OverflowMode::Ignore);
    }

    #[test]
    fn test_zero_cap_rejected() {
        let err = AnalysisConfig::from_toml_str("max_values = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = AnalysisConfig::from_toml_str("max_values = \"ten\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
