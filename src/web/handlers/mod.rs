//! API handlers and shared state.

pub mod file;
pub mod status;

pub use file::*;
pub use status::*;

use crate::config::StorageConfig;
use crate::file::{StorageManager, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_FILE_SIZE};

/// Allowance for multipart framing (boundaries, part headers) on top of the
/// single-file limit, so a file of exactly the limit still fits the request.
pub const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Upload size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Maximum size of one file, in bytes.
    pub max_file_bytes: u64,
    /// Maximum size of a whole batch request, in bytes.
    pub max_batch_bytes: u64,
}

impl UploadLimits {
    /// Build limits from the storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            max_file_bytes: config.max_file_bytes(),
            max_batch_bytes: config.max_batch_bytes(),
        }
    }

    /// Request body limit for single uploads.
    pub fn single_request_bytes(&self) -> u64 {
        self.max_file_bytes.saturating_add(MULTIPART_OVERHEAD)
    }

    /// Request body limit for batch uploads.
    pub fn batch_request_bytes(&self) -> u64 {
        self.max_batch_bytes
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_SIZE,
            max_batch_bytes: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// Application state shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Storage manager for the upload directory.
    pub storage: StorageManager,
    /// Upload size limits.
    pub limits: UploadLimits,
    /// Timezone used for timestamps in responses.
    pub timezone: String,
}

impl AppState {
    /// Create a new application state with default limits.
    pub fn new(storage: StorageManager) -> Self {
        Self {
            storage,
            limits: UploadLimits::default(),
            timezone: "UTC".to_string(),
        }
    }

    /// Set upload limits.
    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the response timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_limits_from_config() {
        let config = StorageConfig {
            upload_dir: "x".to_string(),
            max_file_size_mb: 2,
            max_batch_size_mb: 8,
        };
        let limits = UploadLimits::from_config(&config);

        assert_eq!(limits.max_file_bytes, 2 * 1024 * 1024);
        assert_eq!(limits.max_batch_bytes, 8 * 1024 * 1024);
        assert_eq!(limits.single_request_bytes(), 2 * 1024 * 1024 + MULTIPART_OVERHEAD);
        assert_eq!(limits.batch_request_bytes(), 8 * 1024 * 1024);
    }

    #[test]
    fn test_single_request_limit_saturates() {
        let limits = UploadLimits {
            max_file_bytes: u64::MAX,
            max_batch_bytes: u64::MAX,
        };
        assert_eq!(limits.single_request_bytes(), u64::MAX);
    }

    #[test]
    fn test_upload_limits_default() {
        let limits = UploadLimits::default();
        assert_eq!(limits.max_file_bytes, 10 << 20);
        assert_eq!(limits.max_batch_bytes, 50 << 20);
    }
}
