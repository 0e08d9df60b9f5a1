//! Error types for douyin-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (classification, API, transfer, etc.)
//! - Contextual information (offending URL, destination path, status code)
//! - `#[from]` conversions for the transport, database and serialization
//!   errors produced by the underlying crates
//!
//! Retryability classification lives in [`crate::retry`], next to the code
//! that consumes it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for douyin-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for douyin-dl
///
/// Each variant carries the context needed to diagnose the failure. Failures
/// are contained at the smallest unit that owns them (asset, item, page,
/// link) and converted to statistics by the orchestrator; only programming
/// errors should escalate past it.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "rate.max_per_second")
        key: Option<String>,
    },

    /// No content type or ID could be derived from an input link.
    ///
    /// Terminal for that link; never retried.
    #[error("could not extract a content ID from URL: {url}")]
    Classification {
        /// The link that failed to classify
        url: String,
    },

    /// Transport-level HTTP failure (connect, timeout, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote endpoint answered, but not usably: non-200 status,
    /// an empty body, or a payload that failed to parse.
    #[error("unexpected response{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    UnexpectedResponse {
        /// HTTP status code, when one was received
        status: Option<u16>,
        /// What was wrong with the response
        message: String,
    },

    /// Well-formed API response carrying a non-zero business status code
    #[error("API error {code}: {message}")]
    Api {
        /// The platform's `status_code` field
        code: i64,
        /// The platform's `status_msg` field, if present
        message: String,
    },

    /// Media transfer failure
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The run was cancelled by the embedder
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors produced by the file acquisition engine
#[derive(Debug, Error)]
pub enum TransferError {
    /// Every candidate URL for an asset was tried and none produced a 200
    #[error("all {candidates} source(s) failed for {}", dest.display())]
    AllSourcesFailed {
        /// Destination path the asset was meant to land at
        dest: PathBuf,
        /// Number of candidate URLs attempted
        candidates: usize,
    },

    /// The item's metadata contained no usable URL for a required asset
    #[error("no playable source in item {id}")]
    NoPlayableSource {
        /// Platform item ID
        id: String,
    },
}
