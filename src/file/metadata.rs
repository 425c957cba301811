//! File metadata types returned by the storage manager.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// A file saved by the storage manager.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Generated on-disk filename.
    pub stored_name: String,
    /// Filename as supplied by the client.
    pub original_name: String,
    /// File size in bytes.
    pub size: u64,
    /// Full path inside the upload directory.
    pub path: PathBuf,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// One row of a directory listing.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Entry name inside the upload directory.
    pub name: String,
    /// Size reported by the filesystem.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// Whether the entry is a subdirectory.
    pub is_dir: bool,
}

/// Result of listing the upload directory.
#[derive(Debug, Clone, Default)]
pub struct FileListing {
    /// Entries in filesystem enumeration order.
    pub entries: Vec<FileEntry>,
    /// Entries left out because their metadata could not be read.
    pub skipped: usize,
    /// Whether the directory itself could not be read.
    pub scan_failed: bool,
}

impl FileListing {
    /// Empty listing for an unreadable directory.
    pub fn unavailable() -> Self {
        Self {
            scan_failed: true,
            ..Self::default()
        }
    }

    /// Whether `name` is part of the listing.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }
}

/// Aggregate storage statistics.
#[derive(Debug, Clone)]
pub struct StorageStatus {
    /// Number of regular files.
    pub file_count: usize,
    /// Sum of regular file sizes in bytes.
    pub total_size_bytes: u64,
    /// `total_size_bytes` in whole mebibytes (truncated).
    pub total_size_mb: u64,
    /// Upload directory path.
    pub directory: String,
    /// Time the status was taken.
    pub server_time: DateTime<Utc>,
    /// Entries left out because their metadata could not be read.
    pub skipped: usize,
    /// Whether the directory itself could not be read.
    pub scan_failed: bool,
}

/// An upload left out of a batch.
#[derive(Debug, Clone)]
pub struct SkippedUpload {
    /// Filename as supplied by the client.
    pub original_name: String,
    /// Why the file was not saved.
    pub reason: String,
}

/// Outcome of a batch upload.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Files that were saved, in submission order.
    pub saved: Vec<StoredFile>,
    /// Files that were skipped.
    pub skipped: Vec<SkippedUpload>,
}
