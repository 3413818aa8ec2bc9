//! Error types for treesum
//!
//! This module defines the error kinds that can surface while digesting files,
//! walking trees, reading and writing manifests, and appending to log targets.
//! None of them is fatal to a run: callers log the failure and carry on with
//! the next file, line, target or argument.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the treesum library
pub type Result<T> = std::result::Result<T, TreesumError>;

/// Main error type for all treesum operations
#[derive(Debug, Error)]
pub enum TreesumError {
    /// A command-line source path does not exist
    #[error("Source does not exist: {path:?}")]
    SourceNotFound {
        /// The path as given by the caller
        path: PathBuf,
    },

    /// A file could not be opened or read while digesting or parsing it
    #[error("Failed to read {path:?}: {source}")]
    ReadFailure {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A log or report target could not be appended to
    #[error("Failed to write {path:?}: {source}")]
    WriteFailure {
        /// Target that rejected the write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A manifest line could not be split into digest and path
    #[error("Malformed manifest line {line}: {reason} ({content:?})")]
    ParseFailure {
        /// 1-based line number within the manifest
        line: usize,
        /// The offending line, as read
        content: String,
        /// What was wrong with it
        reason: String,
    },

    /// I/O errors outside of the categories above
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Errors while rendering JSON summaries
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl TreesumError {
    /// Create a read failure for `path`
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TreesumError::ReadFailure {
            path: path.into(),
            source,
        }
    }

    /// Create a write failure for `path`
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TreesumError::WriteFailure {
            path: path.into(),
            source,
        }
    }

    /// Create a parse failure for a manifest line
    pub fn parse(line: usize, content: impl Into<String>, reason: impl Into<String>) -> Self {
        TreesumError::ParseFailure {
            line,
            content: content.into(),
            reason: reason.into(),
        }
    }

    /// Check if processing can continue past this error
    ///
    /// Everything that concerns a single file, line, target or argument is
    /// recoverable. Configuration errors are not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TreesumError::InvalidConfiguration(_))
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            TreesumError::SourceNotFound { path } => {
                format!("Source does not exist: {}. Check the path and try again.", path.display())
            }
            TreesumError::ReadFailure { path, .. } => {
                format!(
                    "Could not read {}. Check that the file exists and is readable.",
                    path.display()
                )
            }
            TreesumError::WriteFailure { path, .. } => {
                format!(
                    "Could not write {}. The file may be locked by another process or the disk may be full.",
                    path.display()
                )
            }
            _ => self.to_string(),
        }
    }
}
