//! Error types for Filebox.

use thiserror::Error;

/// Common error type for Filebox.
#[derive(Error, Debug)]
pub enum FileboxError {
    /// No file was supplied in the request.
    #[error("no file provided")]
    MissingInput,

    /// A single file exceeds the allowed size.
    #[error("file too large (max {limit} bytes)")]
    FileTooLarge {
        /// Limit that was exceeded, in bytes.
        limit: u64,
    },

    /// The request body as a whole exceeds the transport limit.
    #[error("request body too large (max {limit} bytes)")]
    PayloadTooLarge {
        /// Limit that was exceeded, in bytes.
        limit: u64,
    },

    /// Stored file not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Stored name is malformed or resolves outside the upload directory.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// Writing an upload to disk failed.
    #[error("failed to write file: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// Removing a stored file failed.
    #[error("failed to delete file: {0}")]
    DeleteFailed(#[source] std::io::Error),

    /// Reading the upload directory failed.
    #[error("failed to read upload directory: {0}")]
    DirectoryReadFailed(#[source] std::io::Error),

    /// Reading the incoming upload stream failed.
    #[error("failed to read upload: {0}")]
    ReadFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for Filebox operations.
pub type Result<T> = std::result::Result<T, FileboxError>;
