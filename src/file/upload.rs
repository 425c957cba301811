//! Streaming uploads.
//!
//! An upload is written to a hidden `.{stored_name}.part` file next to its
//! final location and renamed into place by [`PendingUpload::finish`], so
//! listings never observe a partially written file.

use std::io;
use std::mem;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::metadata::StoredFile;
use super::naming::generate_stored_name;
use crate::datetime::from_system_time;
use crate::{FileboxError, Result};

/// An upload in progress.
///
/// Dropping it without calling [`finish`](Self::finish) removes the
/// temporary file.
#[derive(Debug)]
pub struct PendingUpload {
    file: Option<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    stored_name: String,
    original_name: String,
    written: u64,
    max_bytes: u64,
    committed: bool,
}

impl PendingUpload {
    pub(super) async fn create(dir: &Path, original_name: &str, max_bytes: u64) -> Result<Self> {
        let stored_name = generate_stored_name(original_name);
        let temp_path = dir.join(format!(".{stored_name}.part"));
        let final_path = dir.join(&stored_name);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await
            .map_err(FileboxError::WriteFailed)?;

        Ok(Self {
            file: Some(file),
            temp_path,
            final_path,
            stored_name,
            original_name: original_name.to_string(),
            written: 0,
            max_bytes,
            committed: false,
        })
    }

    /// Stored name the file will have once finished.
    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Append a chunk, enforcing the size limit.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let total = self.written + chunk.len() as u64;
        if total > self.max_bytes {
            return Err(FileboxError::FileTooLarge {
                limit: self.max_bytes,
            });
        }

        let file = self.file.as_mut().ok_or_else(|| {
            FileboxError::WriteFailed(io::Error::new(io::ErrorKind::Other, "upload closed"))
        })?;
        file.write_all(chunk)
            .await
            .map_err(FileboxError::WriteFailed)?;

        self.written = total;
        Ok(())
    }

    /// Flush the data and move the file to its final name.
    pub async fn finish(mut self) -> Result<StoredFile> {
        let mut file = self.file.take().ok_or_else(|| {
            FileboxError::WriteFailed(io::Error::new(io::ErrorKind::Other, "upload closed"))
        })?;
        file.flush().await.map_err(FileboxError::WriteFailed)?;
        file.sync_all().await.map_err(FileboxError::WriteFailed)?;
        drop(file);

        fs::rename(&self.temp_path, &self.final_path)
            .await
            .map_err(FileboxError::WriteFailed)?;
        self.committed = true;

        let modified = fs::metadata(&self.final_path)
            .await
            .and_then(|m| m.modified())
            .map(from_system_time)
            .unwrap_or_else(|_| Utc::now());

        tracing::info!(
            stored_name = %self.stored_name,
            size = self.written,
            "Stored upload"
        );

        Ok(StoredFile {
            stored_name: mem::take(&mut self.stored_name),
            original_name: mem::take(&mut self.original_name),
            size: self.written,
            path: mem::take(&mut self.final_path),
            modified,
        })
    }

    /// Discard the upload and its temporary file.
    pub async fn abort(mut self) {
        self.file.take();
        if let Err(e) = fs::remove_file(&self.temp_path).await {
            tracing::warn!(path = %self.temp_path.display(), error = %e, "Failed to remove partial upload");
        }
        self.committed = true;
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}
