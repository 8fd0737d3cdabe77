//! Weibo-Harvest: a fetch-and-persist engine for Weibo search, detail, and
//! comment-thread data.
//!
//! The crate walks three kinds of remote resource (search-result pages,
//! detail pages, and cursor-paginated comment threads), normalizes every
//! response into typed records, and persists each logical item exactly once
//! into a document store.

pub mod config;
pub mod engine;
pub mod parse;
pub mod records;
pub mod storage;
pub mod strategies;

use thiserror::Error;

/// Main error type for Weibo-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Retries exhausted for {url}")]
    RetriesExhausted { url: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Request for {url} cannot be replayed")]
    RequestNotReplayable { url: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response error: {0}")]
    Response(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// True for the transient failure class that the retry policy may replay.
    pub fn is_timeout(&self) -> bool {
        matches!(self, HarvestError::Timeout { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Weibo-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::{FetchEngine, FetchStrategy, RunMode, WorkUnit};
pub use records::{DocId, RecordFrom, TypedRecord};
pub use storage::{RecordSink, SqliteDocStore};
