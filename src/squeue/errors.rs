//! Error types for scheduler queue operations

use std::path::PathBuf;

/// Error types for scheduler queue operations
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Reading or writing the queue files failed
    #[error("queue I/O failed at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A queued item could not be serialized
    #[error("could not encode queued item: {0}")]
    Encode(#[source] serde_json::Error),

    /// A stored frame could not be deserialized
    #[error("could not decode queued item: {0}")]
    Decode(#[source] serde_json::Error),

    /// The on-disk frame structure is inconsistent
    #[error("queue data at '{}' is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: &'static str },

    /// The serialized item does not fit in one frame
    #[error("queued item of {size} bytes exceeds the frame size limit")]
    ItemTooLarge { size: usize },
}
