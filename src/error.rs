// SPDX-License-Identifier: Apache-2.0

//! Error types for the fantail crate.

use thiserror::Error;

/// Boxed error returned by consumer callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while tailing files
#[derive(Error, Debug)]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while reading or writing a snapshot
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Consumer callback rejected a line
    #[error("Consumer error: {0}")]
    Consumer(#[source] BoxError),
}

/// Result type alias for fantail operations
pub type Result<T> = std::result::Result<T, Error>;
