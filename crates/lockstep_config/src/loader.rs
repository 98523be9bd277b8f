//! Suite file loading and validation.

use crate::error::ConfigError;
use crate::types::SuiteConfig;
use lockstep_models::{GoalSet, COMPASS_ALPHABET, KONAMI_ALPHABET};
use lockstep_sim::SimTime;
use std::path::Path;

/// Name of the suite file looked up in a directory.
pub const CONFIG_FILE_NAME: &str = "lockstep.toml";

/// Loads and validates `lockstep.toml` from a directory.
///
/// A directory without a suite file yields the stock configuration.
pub fn load_config(dir: &Path) -> Result<SuiteConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(SuiteConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads and validates a suite file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<SuiteConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a suite file from a string.
pub fn load_config_from_str(content: &str) -> Result<SuiteConfig, ConfigError> {
    let config: SuiteConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks run settings and every parameter set.
fn validate_config(config: &SuiteConfig) -> Result<(), ConfigError> {
    let run = &config.run;
    let period = run.clock_period;
    if period < SimTime::from_ps(4) || period.ps % 2 != 0 {
        return Err(ConfigError::ValidationError(format!(
            "run.clock_period must be an even number of picoseconds, at least 4 ps (got {period})"
        )));
    }
    if run.clk_to_q.ps == 0 || run.clk_to_q.ps * 2 >= period.ps {
        return Err(ConfigError::ValidationError(format!(
            "run.clk_to_q must be positive and below half the clock period (got {})",
            run.clk_to_q
        )));
    }
    if run.reset_cycles == 0 {
        return Err(ConfigError::ValidationError(
            "run.reset_cycles must be at least 1".to_string(),
        ));
    }
    if run.time_limit == SimTime::zero() {
        return Err(ConfigError::ValidationError(
            "run.time_limit must be positive".to_string(),
        ));
    }

    for (i, counter) in config.counter.iter().enumerate() {
        counter
            .params()
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("counter[{i}]: {e}")))?;
    }
    for (i, shift) in config.shift.iter().enumerate() {
        shift
            .params()
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("shift[{i}]: {e}")))?;
    }
    let debounce = config
        .debounce
        .params()
        .map_err(|e| ConfigError::ValidationError(format!("debounce: {e}")))?;
    for params in &debounce {
        if period.checked_mul(params.max_delay()).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "debounce: min_delay {} overflows simulated time at a {period} clock",
                params.min_delay
            )));
        }
    }
    GoalSet::new(&config.compass.goals, COMPASS_ALPHABET)
        .map_err(|e| ConfigError::ValidationError(format!("compass: {e}")))?;
    GoalSet::new(&config.konami.goals, KONAMI_ALPHABET)
        .map_err(|e| ConfigError::ValidationError(format!("konami: {e}")))?;
    Ok(())
}
