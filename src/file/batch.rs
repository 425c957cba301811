//! Batch uploads.
//!
//! Files of a batch are saved one at a time as they arrive. Until
//! [`BatchUpload::commit`] is called they are provisional: rolling the batch
//! back, or dropping it, removes every file it saved.

use std::mem;

use tokio::fs;
use tokio::io::AsyncRead;

use super::metadata::{BatchOutcome, SkippedUpload, StoredFile};
use super::storage::StorageManager;
use crate::{FileboxError, Result};

/// A file of a batch upload, as handed to the storage manager.
#[derive(Debug)]
pub struct IncomingFile<R> {
    /// Filename as supplied by the client.
    pub original_name: String,
    /// Size announced by the client, if any.
    pub declared_size: Option<u64>,
    /// File content.
    pub content: R,
}

impl<R: AsyncRead + Unpin> IncomingFile<R> {
    /// Create an incoming file without a declared size.
    pub fn new(original_name: impl Into<String>, content: R) -> Self {
        Self {
            original_name: original_name.into(),
            declared_size: None,
            content,
        }
    }

    /// Set the declared size.
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }
}

/// A batch upload in progress.
#[derive(Debug)]
pub struct BatchUpload<'a> {
    storage: &'a StorageManager,
    per_file_max: u64,
    received: usize,
    outcome: BatchOutcome,
    committed: bool,
}

impl<'a> BatchUpload<'a> {
    pub(super) fn new(storage: &'a StorageManager, per_file_max: u64) -> Self {
        Self {
            storage,
            per_file_max,
            received: 0,
            outcome: BatchOutcome::default(),
            committed: false,
        }
    }

    /// Number of files handed to [`add`](Self::add) so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Save one file of the batch.
    ///
    /// Oversized and unwritable files are recorded as skipped. Any other
    /// error is returned and leaves the batch open for [`rollback`](Self::rollback).
    pub async fn add<R>(&mut self, file: IncomingFile<R>) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        self.received += 1;

        let IncomingFile {
            original_name,
            declared_size,
            content,
        } = file;
        let result = self
            .storage
            .save_upload(&original_name, declared_size, content, self.per_file_max)
            .await;

        self.outcome.absorb(&original_name, result)
    }

    /// Keep the saved files and return the outcome.
    pub fn commit(mut self) -> BatchOutcome {
        self.committed = true;
        let outcome = mem::take(&mut self.outcome);

        tracing::info!(
            saved = outcome.saved.len(),
            skipped = outcome.skipped.len(),
            "Batch upload finished"
        );
        outcome
    }

    /// Remove every file saved by this batch.
    pub async fn rollback(mut self) {
        self.committed = true;
        let saved = mem::take(&mut self.outcome.saved);

        for file in &saved {
            if let Err(e) = fs::remove_file(&file.path).await {
                tracing::warn!(stored_name = %file.stored_name, error = %e, "Failed to roll back batch file");
            }
        }
        tracing::info!(removed = saved.len(), "Batch upload rolled back");
    }
}

impl Drop for BatchUpload<'_> {
    fn drop(&mut self) {
        if !self.committed {
            for file in &self.outcome.saved {
                let _ = std::fs::remove_file(&file.path);
            }
        }
    }
}

impl BatchOutcome {
    /// Record the result of one batch file.
    ///
    /// Oversized and unwritable files become skipped entries; any other
    /// error means the batch input itself is broken and is returned.
    pub fn absorb(&mut self, original_name: &str, result: Result<StoredFile>) -> Result<()> {
        match result {
            Ok(file) => {
                self.saved.push(file);
                Ok(())
            }
            Err(e @ (FileboxError::FileTooLarge { .. } | FileboxError::WriteFailed(_))) => {
                tracing::debug!(original_name, reason = %e, "Skipping batch file");
                self.skipped.push(SkippedUpload {
                    original_name: original_name.to_string(),
                    reason: e.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, StorageManager) {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::new(temp_dir.path()).unwrap();
        (temp_dir, storage)
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    /// Reader that fails after yielding nothing, like a cut-off request body.
    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<io::Result<()>> {
            std::task::Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset",
            )))
        }
    }

    #[test]
    fn test_absorb_skips_oversized() {
        let mut outcome = BatchOutcome::default();
        outcome
            .absorb("big.bin", Err(FileboxError::FileTooLarge { limit: 10 }))
            .unwrap();

        assert!(outcome.saved.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].original_name, "big.bin");
    }

    #[test]
    fn test_absorb_propagates_read_failure() {
        let mut outcome = BatchOutcome::default();
        let result = outcome.absorb("a.txt", Err(FileboxError::ReadFailed("eof".to_string())));

        assert!(matches!(result, Err(FileboxError::ReadFailed(_))));
        assert!(outcome.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_commit_keeps_files() {
        let (temp_dir, storage) = setup_storage();
        let mut batch = storage.begin_batch(100);

        batch.add(IncomingFile::new("a.txt", &b"aaa"[..])).await.unwrap();
        batch
            .add(IncomingFile::new("big.bin", &[0u8; 200][..]))
            .await
            .unwrap();
        assert_eq!(batch.received(), 2);

        let outcome = batch.commit();
        assert_eq!(outcome.saved.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(entries(temp_dir.path()), 1);
    }

    #[tokio::test]
    async fn test_rollback_removes_saved_files() {
        let (temp_dir, storage) = setup_storage();
        let mut batch = storage.begin_batch(100);

        batch.add(IncomingFile::new("a.txt", &b"aaa"[..])).await.unwrap();
        batch.add(IncomingFile::new("b.txt", &b"bbb"[..])).await.unwrap();
        let result = batch.add(IncomingFile::new("c.txt", BrokenReader)).await;
        assert!(matches!(result, Err(FileboxError::ReadFailed(_))));

        batch.rollback().await;
        assert_eq!(entries(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_drop_without_commit_removes_files() {
        let (temp_dir, storage) = setup_storage();
        let mut batch = storage.begin_batch(100);

        batch.add(IncomingFile::new("a.txt", &b"aaa"[..])).await.unwrap();
        assert_eq!(entries(temp_dir.path()), 1);

        drop(batch);
        assert_eq!(entries(temp_dir.path()), 0);
    }
}
