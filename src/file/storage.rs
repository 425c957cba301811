//! File storage for Filebox.
//!
//! [`StorageManager`] owns one upload directory and performs every
//! file-level operation on it. It keeps no state besides the directory path;
//! concurrent requests only share the filesystem.

use std::fs as std_fs;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::batch::{BatchUpload, IncomingFile};
use super::delivery::{response_headers_for, DeliveryMode, Download};
use super::metadata::{BatchOutcome, FileEntry, FileListing, StoredFile};
use super::naming::validate_stored_name;
use super::upload::PendingUpload;
use crate::datetime::from_system_time;
use crate::{FileboxError, Result};

/// Read buffer size used when copying upload content.
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Map a failed read of upload content.
///
/// Readers over a request body may carry a [`FileboxError`] inside the
/// `io::Error` (for example a body limit overrun); it is passed through.
fn read_error(err: io::Error) -> FileboxError {
    let message = err.to_string();
    match err.into_inner().map(|inner| inner.downcast::<FileboxError>()) {
        Some(Ok(inner)) => *inner,
        _ => FileboxError::ReadFailed(message),
    }
}

/// Storage manager for a single upload directory.
///
/// ```text
/// {root}/
/// ├── 1718000000000000000_1a2b3c4d_report.pdf
/// ├── 1718000000000000001_5e6f7a8b_photo.png
/// └── .1718000000000000002_9c0d1e2f_movie.mp4.part   (upload in progress)
/// ```
#[derive(Debug, Clone)]
pub struct StorageManager {
    /// Canonical upload directory.
    root: PathBuf,
}

impl StorageManager {
    /// Create a new StorageManager for the given directory.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std_fs::create_dir_all(&root)?;
        let root = std_fs::canonicalize(&root)?;

        Ok(Self { root })
    }

    /// Get the upload directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a streaming upload.
    ///
    /// Fails with [`FileboxError::FileTooLarge`] before creating anything when
    /// `declared_size` already exceeds `max_bytes`.
    pub async fn begin_upload(
        &self,
        original_name: &str,
        declared_size: Option<u64>,
        max_bytes: u64,
    ) -> Result<PendingUpload> {
        if declared_size.is_some_and(|size| size > max_bytes) {
            return Err(FileboxError::FileTooLarge { limit: max_bytes });
        }

        PendingUpload::create(&self.root, original_name, max_bytes).await
    }

    /// Save a complete upload read from `content`.
    pub async fn save_upload<R>(
        &self,
        original_name: &str,
        declared_size: Option<u64>,
        mut content: R,
        max_bytes: u64,
    ) -> Result<StoredFile>
    where
        R: AsyncRead + Unpin,
    {
        let mut upload = self
            .begin_upload(original_name, declared_size, max_bytes)
            .await?;
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];

        loop {
            let n = content.read(&mut buf).await.map_err(read_error)?;
            if n == 0 {
                break;
            }
            upload.write_chunk(&buf[..n]).await?;
        }

        upload.finish().await
    }

    /// Start a batch upload with a per-file limit.
    pub fn begin_batch(&self, per_file_max: u64) -> BatchUpload<'_> {
        BatchUpload::new(self, per_file_max)
    }

    /// Save several uploads, skipping those over `per_file_max` or failing to write.
    ///
    /// Any other error removes the files already saved by this call.
    pub async fn save_multiple<R>(
        &self,
        files: Vec<IncomingFile<R>>,
        per_file_max: u64,
    ) -> Result<BatchOutcome>
    where
        R: AsyncRead + Unpin,
    {
        let mut batch = self.begin_batch(per_file_max);

        for file in files {
            if let Err(e) = batch.add(file).await {
                batch.rollback().await;
                return Err(e);
            }
        }

        Ok(batch.commit())
    }

    /// Delete a stored file.
    ///
    /// Only the directory entry itself is removed: a symlink is unlinked,
    /// not its target. Subdirectories are not stored files and report
    /// `NotFound`.
    pub async fn delete_file(&self, stored_name: &str) -> Result<()> {
        self.resolve(stored_name).await?;
        let path = self.root.join(stored_name);
        let not_found = || FileboxError::NotFound(format!("File: {stored_name}"));

        match fs::symlink_metadata(&path).await {
            Ok(m) if m.is_dir() => return Err(not_found()),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(FileboxError::DeleteFailed(e)),
        }

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(stored_name, "Deleted file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(FileboxError::DeleteFailed(e)),
        }
    }

    /// Open a stored file for download in the given mode.
    pub async fn open_for_download(&self, stored_name: &str, mode: DeliveryMode) -> Result<Download> {
        let path = self.resolve(stored_name).await?;
        let not_found = || FileboxError::NotFound(format!("File: {stored_name}"));

        let metadata = match fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(not_found());
        }

        let file = match fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let (content_type, disposition) = response_headers_for(stored_name, mode);

        Ok(Download {
            file,
            stored_name: stored_name.to_string(),
            size: metadata.len(),
            content_type,
            disposition,
        })
    }

    /// List the upload directory.
    ///
    /// A directory read failure is logged and reported as an empty listing
    /// with `scan_failed` set.
    pub async fn list_files(&self) -> FileListing {
        match self.scan().await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(error = %e, "Listing upload directory failed");
                FileListing::unavailable()
            }
        }
    }

    /// Read every visible entry of the upload directory.
    ///
    /// Hidden entries (in-progress uploads) are ignored; entries whose
    /// metadata cannot be read are counted in `skipped`.
    pub(super) async fn scan(&self) -> Result<FileListing> {
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(FileboxError::DirectoryReadFailed)?;
        let mut listing = FileListing::default();

        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "Directory enumeration stopped early");
                    listing.skipped += 1;
                    break;
                }
            };

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                listing.skipped += 1;
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(name = %name, error = %e, "Skipping unreadable entry");
                    listing.skipped += 1;
                    continue;
                }
            };
            let Ok(modified) = metadata.modified() else {
                listing.skipped += 1;
                continue;
            };

            listing.entries.push(FileEntry {
                name,
                size: metadata.len(),
                modified: from_system_time(modified),
                is_dir: metadata.is_dir(),
            });
        }

        Ok(listing)
    }

    /// Resolve a client-supplied stored name to a path inside the upload directory.
    ///
    /// The name must be a single visible path component, and the canonical
    /// path (after following symlinks) must stay under the root.
    pub async fn resolve(&self, stored_name: &str) -> Result<PathBuf> {
        validate_stored_name(stored_name)?;

        let path = self.root.join(stored_name);
        let canonical = match fs::canonicalize(&path).await {
            Ok(p) => p,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FileboxError::NotFound(format!("File: {stored_name}")));
            }
            Err(e) => return Err(e.into()),
        };

        if !canonical.starts_with(&self.root) {
            tracing::warn!(stored_name, "Rejected path outside upload directory");
            return Err(FileboxError::InvalidName(stored_name.to_string()));
        }

        Ok(canonical)
    }
}
