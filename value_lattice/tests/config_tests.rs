//! Loading analysis configuration from TOML files.

use std::io::Write;

use pretty_assertions::assert_eq;
use value_lattice::{AnalysisConfig, ConfigError, OverflowMode};

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_partial_file_keeps_defaults() {
    let file = write_config("max_values = 4\nignore_overflow = true\n");
    let config = AnalysisConfig::load(file.path()).unwrap();
    assert_eq!(config.max_values, 4);
    assert_eq!(config.overflow_mode(), OverflowMode::Ignore);
    assert_eq!(
        config.max_argument_combinations,
        AnalysisConfig::default().max_argument_combinations
    );
}

#[test]
fn test_widening_threshold_defaults_to_cap() {
    let file = write_config("max_values = 4\n");
    let config = AnalysisConfig::load(file.path()).unwrap();
    assert_eq!(config.widening_threshold(), 5);
}

#[test]
fn test_zero_cap_rejected() {
    let file = write_config("max_values = 0\n");
    assert!(matches!(
        AnalysisConfig::load(file.path()),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_malformed_file_rejected() {
    let file = write_config("max_values = \"ten\"\n");
    assert!(matches!(
        AnalysisConfig::load(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(matches!(
        AnalysisConfig::load(&missing),
        Err(ConfigError::Io(_))
    ));
}
