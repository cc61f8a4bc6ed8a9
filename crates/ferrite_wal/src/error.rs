//! Error types for the write-ahead log.

use std::io;
use thiserror::Error;

/// Result type for log operations.
pub type WalResult<T> = Result<T, WalError>;

/// Errors that can occur during log operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// The log is corrupt.
    ///
    /// Returned for malformed entry framing, inconsistent marker files
    /// found on open, or an I/O failure while cleaning up after a committed
    /// truncation. Once a live log reports this it stays corrupt until it
    /// is closed and reopened; reopening replays the marker files and
    /// restores a consistent state.
    #[error("log corrupt")]
    Corrupt,

    /// The operation was attempted after the log was closed.
    #[error("log closed")]
    Closed,

    /// The requested entry offset is outside the current log bounds.
    #[error("entry not found")]
    NotFound,

    /// A truncation offset is outside the valid range.
    #[error("offset out of range")]
    OutOfRange,

    /// An I/O error surfaced from the filesystem.
    ///
    /// I/O errors are not sticky; the log remains usable if the underlying
    /// condition clears.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
