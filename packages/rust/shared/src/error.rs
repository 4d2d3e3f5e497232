//! Error types for Docflow.
//!
//! Library crates use [`DocflowError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Docflow operations.
#[derive(Debug, thiserror::Error)]
pub enum DocflowError {
    /// Configuration loading or validation error (including a missing
    /// API credential at client construction).
    #[error("config error: {message}")]
    Config { message: String },

    /// Text-generation backend error (HTTP status, transport, or an
    /// unexpected response shape).
    #[error("generation error: {0}")]
    Generation(String),

    /// Version-control subprocess error (spawn failure or non-zero exit).
    #[error("git error: {0}")]
    Git(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A step precondition or data validation failure (missing context
    /// key, absent section marker, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocflowError>;

impl DocflowError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
