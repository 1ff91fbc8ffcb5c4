//! Abstract object-store capability consumed by the upload and retention
//! workflows.
//!
//! The trait is bucket-scoped and deliberately narrow: multipart transaction
//! operations, versioned listing and deletion, and plain object put/get.
//! Workflows receive it by reference instead of reaching for a shared client,
//! so tests can substitute an in-memory store.

use crate::models::{multipart::PartRecord, version::VersionEntry};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Store-level failures, normalized away from the SDK's error shapes.
///
/// Raw remote-API errors never cross this boundary unformatted.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request timed out")]
    Timeout,
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("no such key `{0}`")]
    NoSuchKey(String),
    #[error("no such upload transaction `{0}`")]
    NoSuchUpload(String),
    #[error("{0}")]
    Api(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One page of a versioned listing.
///
/// Continuation is a marker pair: feeding `next_key_marker` and
/// `next_version_id_marker` back into the next call resumes the listing
/// while `is_truncated` holds. Within one key the store returns versions
/// most-recent-first; callers must not reorder them.
#[derive(Clone, Debug, Default)]
pub struct VersionPage {
    pub versions: Vec<VersionEntry>,
    pub delete_markers: Vec<VersionEntry>,
    pub next_key_marker: Option<String>,
    pub next_version_id_marker: Option<String>,
    pub is_truncated: bool,
}

/// Identity of an object produced by a finalized multipart transaction.
#[derive(Clone, Debug)]
pub struct CompletedObject {
    pub key: String,
    pub etag: Option<String>,
    pub location: Option<String>,
}

/// Identity of an object written by a single-request put.
#[derive(Clone, Debug)]
pub struct PutOutcome {
    pub key: String,
    pub etag: Option<String>,
}

/// The narrow store capability the core workflows are written against.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Name of the bucket this client is scoped to.
    fn bucket(&self) -> &str;

    /// Open a multipart transaction for `key`, returning its opaque id.
    async fn start_multipart_upload(&self, key: &str) -> StoreResult<String>;

    /// Upload one part, returning the completion tag the store issued for it.
    async fn upload_part(
        &self,
        key: &str,
        transaction_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> StoreResult<String>;

    /// Finalize a transaction with the full ordered part list. The store
    /// validates tag/part correspondence; a mismatch fails the finalize.
    async fn complete_multipart_upload(
        &self,
        key: &str,
        transaction_id: &str,
        parts: &[PartRecord],
    ) -> StoreResult<CompletedObject>;

    /// Release every uploaded part of an unfinished transaction.
    async fn abort_multipart_upload(&self, key: &str, transaction_id: &str) -> StoreResult<()>;

    /// Fetch one page of versions and delete markers, resuming from the
    /// given continuation markers.
    async fn list_versions(
        &self,
        prefix: Option<&str>,
        key_marker: Option<&str>,
        version_id_marker: Option<&str>,
    ) -> StoreResult<VersionPage>;

    /// Permanently delete a single version of a key.
    async fn delete_version(&self, key: &str, version_id: &str) -> StoreResult<()>;

    /// Read the payload of a specific version.
    async fn get_object_version(&self, key: &str, version_id: &str) -> StoreResult<Bytes>;

    /// Write an object in a single request, becoming its current version.
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StoreResult<PutOutcome>;
}
