//! Error types for persister operations
//!
//! This module defines the error conditions that can occur while reading
//! from or writing to a job's durable key-value store.

use std::path::PathBuf;

/// Error types for persister operations
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The backing job directory could not be created or validated
    #[error("could not prepare job directory '{}': {source}", .path.display())]
    JobDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key does not map to a storage location under the job directory
    #[error("invalid storage key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// Reading or writing the stored value failed
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// `remove` was called for a key with no stored value
    #[error("no stored value for key '{key}'")]
    Missing { key: String },

    /// A text-encoded value could not be decoded
    #[error("stored value for key '{key}' is not valid UTF-8")]
    Utf8 { key: String },
}

/// Convenience alias for persister results
pub type PersistResult<T> = Result<T, PersistError>;
