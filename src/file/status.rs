//! Aggregate storage statistics.

use chrono::Utc;

use super::metadata::{FileListing, StorageStatus};
use super::storage::StorageManager;

impl StorageManager {
    /// Summarize the upload directory.
    ///
    /// Only regular files are counted and summed; subdirectories are left
    /// out. Never fails: an unreadable directory yields zero totals with
    /// `scan_failed` set.
    pub async fn status(&self) -> StorageStatus {
        let listing = match self.scan().await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(error = %e, "Status scan failed");
                FileListing::unavailable()
            }
        };

        let (file_count, total_size_bytes) = listing
            .entries
            .iter()
            .filter(|e| !e.is_dir)
            .fold((0usize, 0u64), |(count, total), e| (count + 1, total + e.size));

        StorageStatus {
            file_count,
            total_size_bytes,
            total_size_mb: total_size_bytes >> 20,
            directory: self.root().display().to_string(),
            server_time: Utc::now(),
            skipped: listing.skipped,
            scan_failed: listing.scan_failed,
        }
    }
}
