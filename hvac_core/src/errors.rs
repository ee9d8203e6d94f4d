//! # Error Types
//!
//! Structured error types for hvac_core. Missing measurements are *not*
//! errors (they evaluate to "not evaluated"); these variants cover structural
//! problems, persistence failures and document rendering.
//!
//! ## Example
//!
//! ```rust
//! use hvac_core::errors::{HvacError, HvacResult};
//!
//! fn validate_height(height_m: f64) -> HvacResult<()> {
//!     if height_m < 0.0 {
//!         return Err(HvacError::invalid_input(
//!             "height",
//!             height_m.to_string(),
//!             "Height cannot be negative",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for hvac_core operations
pub type HvacResult<T> = Result<T, HvacError>;

/// Structured error type for engine, store and export operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum HvacError {
    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A test-type key that is not one of the eight known test types
    #[error("Unknown test type: '{key}'")]
    UnknownTestKey { key: String },

    /// A record or instance was written for a test the room has not selected
    #[error("Test '{key}' is not selected for room '{room}'")]
    TestNotSelected { room: String, key: String },

    /// No instance exists at the given position
    #[error("Room '{room}' has no instance {index} of test '{key}'")]
    InstanceNotFound {
        room: String,
        key: String,
        index: usize,
    },

    /// No report with the given id in the store
    #[error("Report not found: {id}")]
    ReportNotFound { id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Store is locked by another process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON/CSV serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Document rendering failed (Typst compile or PDF export)
    #[error("Render failed: {stage} - {reason}")]
    RenderFailed { stage: String, reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl HvacError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        HvacError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnknownTestKey error
    pub fn unknown_test_key(key: impl Into<String>) -> Self {
        HvacError::UnknownTestKey { key: key.into() }
    }

    /// Create a TestNotSelected error
    pub fn test_not_selected(room: impl Into<String>, key: impl Into<String>) -> Self {
        HvacError::TestNotSelected {
            room: room.into(),
            key: key.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        HvacError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(
        path: impl Into<String>,
        locked_by: impl Into<String>,
        locked_at: impl Into<String>,
    ) -> Self {
        HvacError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a RenderFailed error
    pub fn render_failed(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        HvacError::RenderFailed {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, HvacError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            HvacError::InvalidInput { .. } => "INVALID_INPUT",
            HvacError::UnknownTestKey { .. } => "UNKNOWN_TEST_KEY",
            HvacError::TestNotSelected { .. } => "TEST_NOT_SELECTED",
            HvacError::InstanceNotFound { .. } => "INSTANCE_NOT_FOUND",
            HvacError::ReportNotFound { .. } => "REPORT_NOT_FOUND",
            HvacError::FileError { .. } => "FILE_ERROR",
            HvacError::FileLocked { .. } => "FILE_LOCKED",
            HvacError::SerializationError { .. } => "SERIALIZATION_ERROR",
            HvacError::VersionMismatch { .. } => "VERSION_MISMATCH",
            HvacError::RenderFailed { .. } => "RENDER_FAILED",
            HvacError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for HvacError {
    fn from(e: serde_json::Error) -> Self {
        HvacError::SerializationError {
            reason: e.to_string(),
        }
    }
}
