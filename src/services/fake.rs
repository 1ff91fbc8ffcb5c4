//! In-memory `ObjectStoreClient` with scripted failures, for workflow tests.

use crate::models::multipart::PartRecord;
use crate::services::store::{
    CompletedObject, ObjectStoreClient, PutOutcome, StoreError, StoreResult, VersionPage,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeState {
    next_transaction: u32,
    /// `(key, transaction_id)` per started transaction.
    pub started: Vec<(String, String)>,
    /// `(transaction_id, part_number, byte_len)` per uploaded part.
    pub parts: Vec<(String, i32, usize)>,
    /// `(transaction_id, parts)` per finalize call.
    pub completed: Vec<(String, Vec<PartRecord>)>,
    /// Transaction ids that were aborted.
    pub aborted: Vec<String>,
    /// Current objects written via `put_object`.
    pub objects: HashMap<String, Bytes>,
    /// Payloads served by `get_object_version`, keyed by `(key, version_id)`.
    pub version_bodies: HashMap<(String, String), Bytes>,
    /// Listing pages served in order, one per `list_versions` call.
    pub pages: Vec<VersionPage>,
    /// `(key_marker, version_id_marker)` passed to each `list_versions` call.
    pub list_calls: Vec<(Option<String>, Option<String>)>,
    /// `(key, version_id)` per successful `delete_version` call.
    pub deleted: Vec<(String, String)>,

    pub fail_start: bool,
    pub fail_part: Option<i32>,
    pub fail_finalize: bool,
    pub fail_abort: bool,
    /// Fail the nth (0-based) `list_versions` call.
    pub fail_list_at: Option<usize>,
    /// Version ids whose deletion fails.
    pub fail_delete_versions: HashSet<String>,
}

#[derive(Default)]
pub struct FakeStore {
    pub state: Mutex<FakeState>,
}

#[async_trait]
impl ObjectStoreClient for FakeStore {
    fn bucket(&self) -> &str {
        "test-bucket"
    }

    async fn start_multipart_upload(&self, key: &str) -> StoreResult<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_start {
            return Err(StoreError::Api("scripted start failure".into()));
        }
        state.next_transaction += 1;
        let id = format!("txn-{}", state.next_transaction);
        state.started.push((key.to_string(), id.clone()));
        Ok(id)
    }

    async fn upload_part(
        &self,
        _key: &str,
        transaction_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> StoreResult<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_part == Some(part_number) {
            return Err(StoreError::Api(format!(
                "scripted failure on part {part_number}"
            )));
        }
        state
            .parts
            .push((transaction_id.to_string(), part_number, body.len()));
        Ok(format!("\"etag-{part_number}\""))
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        transaction_id: &str,
        parts: &[PartRecord],
    ) -> StoreResult<CompletedObject> {
        let mut state = self.state.lock().unwrap();
        if state.fail_finalize {
            return Err(StoreError::Api("scripted finalize failure".into()));
        }
        state
            .completed
            .push((transaction_id.to_string(), parts.to_vec()));
        Ok(CompletedObject {
            key: key.to_string(),
            etag: Some("\"etag-final\"".into()),
            location: None,
        })
    }

    async fn abort_multipart_upload(&self, _key: &str, transaction_id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_abort {
            return Err(StoreError::Api("scripted abort failure".into()));
        }
        state.aborted.push(transaction_id.to_string());
        Ok(())
    }

    async fn list_versions(
        &self,
        _prefix: Option<&str>,
        key_marker: Option<&str>,
        version_id_marker: Option<&str>,
    ) -> StoreResult<VersionPage> {
        let mut state = self.state.lock().unwrap();
        let call_index = state.list_calls.len();
        state.list_calls.push((
            key_marker.map(str::to_string),
            version_id_marker.map(str::to_string),
        ));
        if state.fail_list_at == Some(call_index) {
            return Err(StoreError::Api("scripted listing failure".into()));
        }
        Ok(state.pages.get(call_index).cloned().unwrap_or_default())
    }

    async fn delete_version(&self, key: &str, version_id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_delete_versions.contains(version_id) {
            return Err(StoreError::Api(format!(
                "scripted delete failure for {version_id}"
            )));
        }
        state
            .deleted
            .push((key.to_string(), version_id.to_string()));
        Ok(())
    }

    async fn get_object_version(&self, key: &str, version_id: &str) -> StoreResult<Bytes> {
        let state = self.state.lock().unwrap();
        state
            .version_bodies
            .get(&(key.to_string(), version_id.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NoSuchKey(key.to_string()))
    }

    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        _content_type: Option<&str>,
    ) -> StoreResult<PutOutcome> {
        let mut state = self.state.lock().unwrap();
        state.objects.insert(key.to_string(), body);
        Ok(PutOutcome {
            key: key.to_string(),
            etag: Some("\"etag-put\"".into()),
        })
    }
}
