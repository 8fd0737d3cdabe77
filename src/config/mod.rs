//! Configuration module
//!
//! Handles loading, parsing, and validating TOML configuration files.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{Config, EngineSettings, SessionConfig, StorageConfig};
pub use validation::validate_config;

/// Minimal valid configuration for tests across the crate
#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        session: SessionConfig {
            cookie: "SUB=test".to_string(),
            user_agent: "TestAgent/1.0".to_string(),
        },
        engine: EngineSettings::default(),
        storage: StorageConfig {
            database_path: "./test.db".to_string(),
        },
    }
}
