//! Configuration validation
//!
//! A malformed configuration is a process error: it propagates immediately
//! and terminates the run before any network or storage work starts.

use crate::config::Config;
use crate::{ConfigError, ConfigResult};

/// Validates a parsed configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    if config.session.cookie.trim().is_empty() {
        return Err(ConfigError::Validation(
            "session.cookie must not be empty".to_string(),
        ));
    }

    if config.engine.concurrency_limit == 0 {
        return Err(ConfigError::Validation(
            "engine.concurrency-limit must be at least 1".to_string(),
        ));
    }

    if config.engine.max_failed_times == 0 {
        return Err(ConfigError::Validation(
            "engine.max-failed-times must be at least 1".to_string(),
        ));
    }

    if config.engine.retry_attempts == 0 {
        return Err(ConfigError::Validation(
            "engine.retry-attempts must be at least 1".to_string(),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storage.database-path must not be empty".to_string(),
        ));
    }

    Ok(())
}
