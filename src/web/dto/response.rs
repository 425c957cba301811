//! Response DTOs for Web API.

use serde::Serialize;

use crate::datetime::to_rfc3339;
use crate::file::{FileEntry, StorageStatus, StoredFile};

/// Plain message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Create a new message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A saved file in upload responses.
#[derive(Debug, Serialize)]
pub struct UploadedFile {
    /// Stored name, used in download/delete URLs.
    pub filename: String,
    /// Name supplied by the client.
    pub original: String,
    /// Size in bytes.
    pub size: u64,
    /// Path on the server.
    pub path: String,
}

impl From<StoredFile> for UploadedFile {
    fn from(file: StoredFile) -> Self {
        Self {
            filename: file.stored_name,
            original: file.original_name,
            size: file.size,
            path: file.path.display().to_string(),
        }
    }
}

/// Single upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Human-readable message.
    pub message: String,
    /// Saved file.
    #[serde(flatten)]
    pub file: UploadedFile,
}

/// Batch upload response.
#[derive(Debug, Serialize)]
pub struct BatchUploadResponse {
    /// Human-readable message.
    pub message: String,
    /// Saved files.
    pub files: Vec<UploadedFile>,
    /// Number of files that were not saved.
    pub skipped: usize,
}

/// File information in listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Entry name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time (RFC3339).
    pub mod_time: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl FileInfo {
    /// Build from a listing entry, formatting times in `timezone`.
    pub fn from_entry(entry: &FileEntry, timezone: &str) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.size,
            mod_time: to_rfc3339(&entry.modified, timezone),
            is_dir: entry.is_dir,
        }
    }
}

/// File listing response.
#[derive(Debug, Serialize)]
pub struct FileListResponse {
    /// Number of listed entries.
    pub count: usize,
    /// Listed entries.
    pub files: Vec<FileInfo>,
    /// Number of entries that could not be read.
    pub skipped: usize,
}

/// Storage status response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Number of stored files.
    pub files_count: usize,
    /// Total size in bytes.
    pub total_size: u64,
    /// Total size in whole megabytes.
    #[serde(rename = "totalSizeMB")]
    pub total_size_mb: u64,
    /// Upload directory.
    pub upload_dir: String,
    /// Current server time (RFC3339).
    pub server_time: String,
    /// Number of entries that could not be read.
    pub skipped: usize,
}

impl StatusResponse {
    /// Build from a status snapshot, formatting times in `timezone`.
    pub fn from_status(status: StorageStatus, timezone: &str) -> Self {
        Self {
            files_count: status.file_count,
            total_size: status.total_size_bytes,
            total_size_mb: status.total_size_mb,
            upload_dir: status.directory,
            server_time: to_rfc3339(&status.server_time, timezone),
            skipped: status.skipped,
        }
    }
}
