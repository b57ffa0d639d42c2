//! Core error types for classbell-core.
//!
//! Only storage and configuration problems surface as errors. Malformed
//! schedule content is logged and mapped to a fallback value by the
//! resolver, so [`ValidationError`] mostly travels inside log lines.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for classbell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Schedule document storage errors
    #[error("Schedule store error: {0}")]
    Store(#[from] StoreError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key is not part of the configuration schema
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Schedule document storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No document with that name
    #[error("Schedule '{0}' not found")]
    NotFound(String),

    /// Name would escape the store directory or is reserved
    #[error("Invalid schedule name '{0}'")]
    InvalidName(String),

    /// Reading the document failed
    #[error("Failed to read schedule '{name}': {source}")]
    ReadFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing the document failed
    #[error("Failed to write schedule '{name}': {source}")]
    WriteFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid JSON or has the wrong shape
    #[error("Failed to parse schedule '{name}': {source}")]
    ParseFailed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Problems with individual schedule entries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Part entry is not `[hour, minute]` or `[hour, minute, kind]`
    #[error("Malformed part entry '{id}': {message}")]
    MalformedPart { id: String, message: String },

    /// Segment id is not `a<digits>` or `f<digits>`
    #[error("Malformed segment id '{0}'")]
    MalformedSegment(String),

    /// Segment duration is not a non-negative whole number of minutes
    #[error("Invalid duration for segment '{id}': {value}")]
    InvalidDuration { id: String, value: String },

    /// Weekday outside 0..=6
    #[error("Weekday {0} out of range (expected 0..=6)")]
    InvalidWeekday(i64),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
