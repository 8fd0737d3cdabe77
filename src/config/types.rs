//! Configuration types
//!
//! Loaded from a TOML file with kebab-case keys. The session section is the
//! pre-supplied credential set: the engine consumes a ready cookie and never
//! acquires or refreshes one.

use serde::Deserialize;

/// Main configuration structure for Weibo-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub session: SessionConfig,
    #[serde(default)]
    pub engine: EngineSettings,
    pub storage: StorageConfig,
}

/// Ready-made session credentials attached to every request
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Cookie header value for an authenticated session
    pub cookie: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Engine behavior knobs
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Maximum simultaneously in-flight fetches under concurrent mode
    #[serde(rename = "concurrency-limit", default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Consecutive empty/rejected fetches tolerated before a thread walk
    /// is abandoned
    #[serde(rename = "max-failed-times", default = "default_max_failed_times")]
    pub max_failed_times: u32,

    /// Attempts per fetch; only timeouts are retried
    #[serde(rename = "retry-attempts", default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency_limit(),
            max_failed_times: default_max_failed_times(),
            retry_attempts: default_retry_attempts(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite document store
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_concurrency_limit() -> usize {
    100
}

fn default_max_failed_times() -> u32 {
    20
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}
