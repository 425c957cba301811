//! File management module for Filebox.
//!
//! This module provides the storage side of the service:
//! - Unique stored-name generation and name validation
//! - Size-limited streaming uploads, single and batch (with rollback)
//! - Download in attachment or inline mode
//! - Directory listing and aggregate status

mod batch;
mod delivery;
mod metadata;
mod naming;
mod status;
mod storage;
mod upload;

pub use batch::{BatchUpload, IncomingFile};
pub use delivery::{content_disposition_header, content_type_for, DeliveryMode, Download, OCTET_STREAM};
pub use metadata::{BatchOutcome, FileEntry, FileListing, SkippedUpload, StorageStatus, StoredFile};
pub use naming::{generate_stored_name, sanitize_original_name, validate_stored_name};
pub use storage::StorageManager;
pub use upload::PendingUpload;

/// Default maximum size of a single file (10MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default maximum size of a batch upload request (50MB).
pub const DEFAULT_MAX_BATCH_SIZE: u64 = 50 * 1024 * 1024;
