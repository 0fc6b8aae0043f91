//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the screening engine, covering record
//! validation, query parameters, storage, and index consistency.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from storage, indexing, and query components
//! - **Output**: Structured error types with context for callers and logs
//! - **Error Categories**: Validation, Query, Index, Storage, Configuration
//!
//! ## Key Features
//! - One public error enum shared by every component
//! - Automatic conversion from storage and serialization errors
//! - Stable category labels for logging and metrics
//! - Lookup misses are `Ok(None)` / empty collections, never an error
//!
//! ## Usage
//! ```rust
//! use restricted_party_screen::errors::{Result, ScreenError};
//!
//! fn reject_blank_name() -> Result<()> {
//!     Err(ScreenError::Validation {
//!         field: "name".to_string(),
//!         reason: "name must not be empty".to_string(),
//!     })
//! }
//! ```

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, ScreenError>;

/// Error types for the screening engine
#[derive(Debug, Error)]
pub enum ScreenError {
    /// A record failed validation and was not stored
    #[error("Validation failed for field '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// A query parameter was malformed and has no safe default
    #[error("Invalid query parameter '{parameter}': {reason}")]
    Query { parameter: String, reason: String },

    /// The full-text index could not be kept consistent with the record
    /// store; the write is rolled back as a whole
    #[error("Index consistency failure for record '{id}': {reason}")]
    IndexConsistency { id: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Database errors
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Record encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors (country profile files)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScreenError {
    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            ScreenError::Validation { .. } => "validation",
            ScreenError::Query { .. } => "query",
            ScreenError::IndexConsistency { .. } => "index",
            ScreenError::Config { .. } => "configuration",
            ScreenError::Storage(_) | ScreenError::Serialization(_) | ScreenError::Io(_) => {
                "storage"
            }
            ScreenError::Json(_) => "serialization",
        }
    }

    /// Whether the error indicates the engine can no longer be trusted to
    /// answer searches correctly and should alert rather than retry
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScreenError::IndexConsistency { .. } | ScreenError::Storage(_)
        )
    }
}

/// Build a [`ScreenError::Validation`] from a field name and reason
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $reason:expr) => {
        $crate::errors::ScreenError::Validation {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
}
