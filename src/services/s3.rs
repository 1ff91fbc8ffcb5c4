//! `ObjectStoreClient` backed by the AWS S3 SDK, pinned to one bucket.

use crate::models::{multipart::PartRecord, object::ObjectSummary, version::VersionEntry};
use crate::services::store::{
    CompletedObject, ObjectStoreClient, PutOutcome, StoreError, StoreResult, VersionPage,
};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    error::{ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::{CompletedMultipartUpload, CompletedPart},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

/// S3 client scoped to a single bucket.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// List current objects under an optional prefix, following the
    /// continuation token chain to the end.
    pub async fn list_objects(&self, prefix: Option<&str>) -> StoreResult<Vec<ObjectSummary>> {
        let mut summaries = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(prefix) = prefix {
                request = request.prefix(prefix);
            }
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|err| map_sdk_error("list_objects_v2", err))?;

            summaries.extend(response.contents().iter().map(|obj| ObjectSummary {
                key: obj.key().unwrap_or_default().to_string(),
                size_bytes: obj.size().unwrap_or(0),
                last_modified: obj.last_modified().and_then(to_utc),
                etag: obj.e_tag().map(str::to_string),
            }));

            if !response.is_truncated().unwrap_or(false) {
                break;
            }
            continuation_token = response.next_continuation_token().map(str::to_string);
        }

        Ok(summaries)
    }

    /// Delete the current version of an object (in a versioned bucket this
    /// writes a delete marker).
    pub async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error("delete_object", err))?;
        debug!(bucket = %self.bucket, key, "deleted object");
        Ok(())
    }
}

#[async_trait]
impl ObjectStoreClient for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn start_multipart_upload(&self, key: &str) -> StoreResult<String> {
        let response = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error("create_multipart_upload", err))?;

        response
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| StoreError::Api("create_multipart_upload: missing upload id".into()))
    }

    async fn upload_part(
        &self,
        key: &str,
        transaction_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> StoreResult<String> {
        let response = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(transaction_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| map_sdk_error("upload_part", err))?;

        response
            .e_tag()
            .map(str::to_string)
            .ok_or_else(|| StoreError::Api(format!("upload_part {part_number}: missing etag")))
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        transaction_id: &str,
        parts: &[PartRecord],
    ) -> StoreResult<CompletedObject> {
        let completed_parts: Vec<CompletedPart> = parts
            .iter()
            .map(|part| {
                CompletedPart::builder()
                    .part_number(part.part_number)
                    .e_tag(&part.completion_tag)
                    .build()
            })
            .collect();

        let response = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(transaction_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed_parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|err| map_sdk_error("complete_multipart_upload", err))?;

        Ok(CompletedObject {
            key: key.to_string(),
            etag: response.e_tag().map(str::to_string),
            location: response.location().map(str::to_string),
        })
    }

    async fn abort_multipart_upload(&self, key: &str, transaction_id: &str) -> StoreResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(transaction_id)
            .send()
            .await
            .map_err(|err| map_sdk_error("abort_multipart_upload", err))?;
        Ok(())
    }

    async fn list_versions(
        &self,
        prefix: Option<&str>,
        key_marker: Option<&str>,
        version_id_marker: Option<&str>,
    ) -> StoreResult<VersionPage> {
        let mut request = self.client.list_object_versions().bucket(&self.bucket);
        if let Some(prefix) = prefix {
            request = request.prefix(prefix);
        }
        if let Some(marker) = key_marker {
            request = request.key_marker(marker);
        }
        if let Some(marker) = version_id_marker {
            request = request.version_id_marker(marker);
        }

        let response = request
            .send()
            .await
            .map_err(|err| map_sdk_error("list_object_versions", err))?;

        let versions = response
            .versions()
            .iter()
            .map(|version| VersionEntry {
                key: version.key().unwrap_or_default().to_string(),
                version_id: version.version_id().unwrap_or_default().to_string(),
                last_modified: version.last_modified().and_then(to_utc),
                is_delete_marker: false,
                is_latest: version.is_latest().unwrap_or(false),
                size_bytes: version.size(),
            })
            .collect();

        let delete_markers = response
            .delete_markers()
            .iter()
            .map(|marker| VersionEntry {
                key: marker.key().unwrap_or_default().to_string(),
                version_id: marker.version_id().unwrap_or_default().to_string(),
                last_modified: marker.last_modified().and_then(to_utc),
                is_delete_marker: true,
                is_latest: marker.is_latest().unwrap_or(false),
                size_bytes: None,
            })
            .collect();

        Ok(VersionPage {
            versions,
            delete_markers,
            next_key_marker: response.next_key_marker().map(str::to_string),
            next_version_id_marker: response.next_version_id_marker().map(str::to_string),
            is_truncated: response.is_truncated().unwrap_or(false),
        })
    }

    async fn delete_version(&self, key: &str, version_id: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .version_id(version_id)
            .send()
            .await
            .map_err(|err| map_sdk_error("delete_object", err))?;
        Ok(())
    }

    async fn get_object_version(&self, key: &str, version_id: &str) -> StoreResult<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .version_id(version_id)
            .send()
            .await
            .map_err(|err| map_sdk_error("get_object", err))?;

        let aggregated = response
            .body
            .collect()
            .await
            .map_err(|err| StoreError::Api(format!("get_object: reading body: {err}")))?;
        Ok(aggregated.into_bytes())
    }

    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StoreResult<PutOutcome> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        let response = request
            .send()
            .await
            .map_err(|err| map_sdk_error("put_object", err))?;

        Ok(PutOutcome {
            key: key.to_string(),
            etag: response.e_tag().map(str::to_string),
        })
    }
}

/// Convert an SDK timestamp into `chrono` UTC.
pub(crate) fn to_utc(ts: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

/// Normalize an SDK error into the store taxonomy.
///
/// Timeouts stay retryable at the SDK layer (retry policy is configured on
/// the client); everything else is classified by the service error code.
pub(crate) fn map_sdk_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata,
{
    if matches!(err, SdkError::TimeoutError(_)) {
        return StoreError::Timeout;
    }

    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| "unexpected response".to_string());

    match err.code() {
        Some("AccessDenied") => StoreError::AccessDenied(message),
        Some("NoSuchKey") | Some("NoSuchVersion") => StoreError::NoSuchKey(message),
        Some("NoSuchUpload") => StoreError::NoSuchUpload(message),
        Some(code) => StoreError::Api(format!("{operation}: {message} ({code})")),
        None => StoreError::Api(format!("{operation}: {message}")),
    }
}
