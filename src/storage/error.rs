//! Storage-specific error types.
//!
//! All store operations return [`StorageError`] on failure. Probe outcomes are
//! never storage errors; they are persisted as ordinary rows.

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database operation failed (sqlx error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The writer task is gone or no longer accepting commands.
    #[error("failed to send command to writer actor")]
    ChannelSend,

    /// Internal error (e.g., task join failure, lost acknowledgement).
    #[error("internal error: {0}")]
    Internal(String),

    /// A stored row could not be decoded (e.g., unknown error kind).
    #[error("invalid data: {0}")]
    InvalidData(String),
}
