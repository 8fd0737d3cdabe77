//! Configuration loading

use crate::config::validation::validate_config;
use crate::config::Config;
use crate::ConfigResult;
use std::path::Path;

/// Loads and validates a TOML configuration file
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}
