//! Chunked upload of large files as a single atomic multipart transaction.
//!
//! The file is split into fixed-size parts, each uploaded under one
//! transaction and tracked by its completion tag. The transaction either
//! finalizes with a complete, gap-free, ascending part sequence or is
//! explicitly aborted — readers never observe a partial object.

use crate::models::multipart::UploadTransaction;
use crate::services::store::{ObjectStoreClient, StoreError};
use bytes::Bytes;
use serde::Serialize;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::{fs::File, io::AsyncReadExt};
use tracing::{debug, warn};

/// 5 MiB, the store's documented minimum size for non-final parts.
pub const DEFAULT_PART_SIZE: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("refusing to upload an empty file")]
    EmptyFile,
    #[error("failed to read part {part_number}: {source}")]
    Read {
        part_number: i32,
        #[source]
        source: io::Error,
    },
    #[error("failed to open upload transaction: {source}")]
    Start {
        #[source]
        source: StoreError,
    },
    #[error("failed to upload part {part_number}: {source}")]
    Part {
        part_number: i32,
        #[source]
        source: StoreError,
    },
    #[error("failed to finalize upload: {source}")]
    Finalize {
        #[source]
        source: StoreError,
    },
    #[error("upload cancelled")]
    Cancelled,
    #[error("abort failed after upload error ({original}): {abort_source}")]
    AbortFailed {
        original: Box<UploadError>,
        #[source]
        abort_source: StoreError,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Identity of a successfully committed upload.
#[derive(Serialize, Clone, Debug)]
pub struct UploadOutcome {
    pub key: String,
    pub etag: Option<String>,
    pub parts: usize,
    pub total_bytes: u64,
}

/// Uploads one file per call against an injected store client.
///
/// Parts are uploaded sequentially with ascending part numbers; the store
/// indexes parts by number, so ordering of arrival is not load-bearing,
/// but finalize is only issued once every part has a recorded tag.
pub struct ChunkedUploader<'a> {
    store: &'a dyn ObjectStoreClient,
    part_size: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> ChunkedUploader<'a> {
    pub fn new(store: &'a dyn ObjectStoreClient) -> Self {
        Self {
            store,
            part_size: DEFAULT_PART_SIZE,
            cancel: None,
        }
    }

    /// Override the part size. Must be non-zero; sizes below the store's
    /// minimum will be rejected by the store at finalize time.
    pub fn with_part_size(mut self, part_size: u64) -> Self {
        debug_assert!(part_size > 0, "part size must be non-zero");
        self.part_size = part_size;
        self
    }

    /// Install a cancellation flag, checked between parts. When it flips,
    /// the in-flight transaction is aborted before returning.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Number of parts a file of `file_size` bytes splits into.
    pub fn part_count(file_size: u64, part_size: u64) -> u64 {
        file_size.div_ceil(part_size)
    }

    /// Upload `path` to `key` as one atomic multipart transaction.
    ///
    /// Empty files are rejected before any transaction is opened. On any
    /// failure past that point the transaction is aborted; an abort failure
    /// is reported alongside the original error, never instead of it.
    pub async fn upload_file(&self, key: &str, path: &Path) -> UploadResult<UploadOutcome> {
        let mut file = File::open(path).await?;
        let file_size = file.metadata().await?.len();
        if file_size == 0 {
            return Err(UploadError::EmptyFile);
        }

        let transaction_id = self
            .store
            .start_multipart_upload(key)
            .await
            .map_err(|source| UploadError::Start { source })?;
        let mut txn = UploadTransaction::new(key, transaction_id);
        debug!(
            bucket = %self.store.bucket(),
            key,
            transaction = %txn.transaction_id,
            parts = Self::part_count(file_size, self.part_size),
            "opened multipart transaction"
        );

        if let Err(err) = self.upload_parts(&mut file, file_size, &mut txn).await {
            return Err(self.abort_after(&txn, err).await);
        }

        match self
            .store
            .complete_multipart_upload(key, &txn.transaction_id, txn.parts())
            .await
        {
            Ok(completed) => {
                debug!(
                    key,
                    etag = ?completed.etag,
                    location = ?completed.location,
                    "finalized multipart transaction"
                );
                Ok(UploadOutcome {
                    key: completed.key,
                    etag: completed.etag,
                    parts: txn.part_count(),
                    total_bytes: file_size,
                })
            }
            Err(source) => Err(self.abort_after(&txn, UploadError::Finalize { source }).await),
        }
    }

    async fn upload_parts(
        &self,
        file: &mut File,
        file_size: u64,
        txn: &mut UploadTransaction,
    ) -> UploadResult<()> {
        let part_count = Self::part_count(file_size, self.part_size);
        let mut buf = vec![0u8; self.part_size as usize];

        for index in 0..part_count {
            if self.is_cancelled() {
                return Err(UploadError::Cancelled);
            }

            let part_number = (index + 1) as i32;
            let remaining = file_size - index * self.part_size;
            let len = remaining.min(self.part_size) as usize;

            file.read_exact(&mut buf[..len])
                .await
                .map_err(|source| UploadError::Read {
                    part_number,
                    source,
                })?;

            let body = Bytes::copy_from_slice(&buf[..len]);
            let tag = self
                .store
                .upload_part(&txn.key, &txn.transaction_id, part_number, body)
                .await
                .map_err(|source| UploadError::Part {
                    part_number,
                    source,
                })?;
            txn.record_part(part_number, tag);
            debug!(key = %txn.key, "uploaded part {part_number}/{part_count} ({len} bytes)");
        }

        Ok(())
    }

    async fn abort_after(&self, txn: &UploadTransaction, original: UploadError) -> UploadError {
        match self
            .store
            .abort_multipart_upload(&txn.key, &txn.transaction_id)
            .await
        {
            Ok(()) => {
                debug!(key = %txn.key, transaction = %txn.transaction_id, "aborted multipart transaction");
                original
            }
            Err(abort_source) => {
                warn!(
                    key = %txn.key,
                    transaction = %txn.transaction_id,
                    "abort failed, transaction may be dangling store-side: {abort_source}"
                );
                UploadError::AbortFailed {
                    original: Box::new(original),
                    abort_source,
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}
