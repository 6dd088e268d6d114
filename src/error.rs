//! Custom error types for the signal engine
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use std::path::PathBuf;

use thiserror::Error;

use crate::signals::types::Direction;

/// Errors raised while creating or managing signals
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Invalid symbol '{symbol}' (expected ASCII letters and digits, e.g. BTCUSDT)")]
    InvalidSymbol { symbol: String },

    #[error("Invalid {field}: {value} (must be a finite positive number)")]
    InvalidPrice { field: &'static str, value: f64 },

    #[error("{direction} levels out of order: {reason}")]
    InconsistentLevels { direction: Direction, reason: String },

    #[error("Monitoring engine is not running")]
    EngineUnavailable,
}

/// Market data feed errors (stream + snapshot)
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

/// Durable signal storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<String> for ConfigError {
    fn from(err: String) -> Self {
        ConfigError::Invalid(err)
    }
}

impl From<&str> for ConfigError {
    fn from(err: &str) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}
