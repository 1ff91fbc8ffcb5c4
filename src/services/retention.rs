//! Age-based retention sweep over a versioned bucket, plus version
//! inspection and previous-version restore.
//!
//! The sweep paginates the full version listing with the store's
//! `(key_marker, version_id_marker)` continuation pair and deletes every
//! version and delete marker strictly older than the cutoff. Individual
//! delete failures are logged and skipped; a listing failure aborts the
//! sweep with the partial count.

use crate::models::version::{SweepReport, VersionEntry};
use crate::services::store::{ObjectStoreClient, PutOutcome, StoreError};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, warn};

/// Months are flat 30-day windows, so the cutoff is calendar-approximate.
pub const DAYS_PER_MONTH: i64 = 30;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("version enumeration failed after {deleted_so_far} deletions: {source}")]
    Enumeration {
        deleted_so_far: u64,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("object `{0}` has no versions")]
    NoVersions(String),
    #[error("object `{0}` has no previous version to restore")]
    NoPreviousVersion(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Sweeps versions older than a fixed cutoff out of a versioned bucket.
pub struct RetentionSweeper<'a> {
    store: &'a dyn ObjectStoreClient,
    cutoff: DateTime<Utc>,
}

impl<'a> RetentionSweeper<'a> {
    pub fn new(store: &'a dyn ObjectStoreClient, cutoff: DateTime<Utc>) -> Self {
        Self { store, cutoff }
    }

    /// Build a sweeper whose cutoff lies `months` 30-day months before
    /// `now`. The clock is injected so sweeps are reproducible under test.
    pub fn with_horizon(store: &'a dyn ObjectStoreClient, months: u32, now: DateTime<Utc>) -> Self {
        Self::new(store, now - Duration::days(DAYS_PER_MONTH * i64::from(months)))
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Delete every version and delete marker under `prefix` whose
    /// `last_modified` lies strictly before the cutoff.
    ///
    /// Returns the aggregate report; a deleted count of zero is a valid
    /// "nothing expired" outcome, distinct from an enumeration failure.
    pub async fn sweep(&self, prefix: Option<&str>) -> Result<SweepReport, SweepError> {
        let mut report = SweepReport::default();
        let mut key_marker: Option<String> = None;
        let mut version_id_marker: Option<String> = None;

        loop {
            let page = self
                .store
                .list_versions(prefix, key_marker.as_deref(), version_id_marker.as_deref())
                .await
                .map_err(|source| SweepError::Enumeration {
                    deleted_so_far: report.deleted,
                    source,
                })?;
            report.pages += 1;

            for entry in page.versions.iter().chain(page.delete_markers.iter()) {
                self.sweep_entry(entry, &mut report).await;
            }

            if !page.is_truncated {
                break;
            }
            if page.next_key_marker.is_none() && page.next_version_id_marker.is_none() {
                warn!("truncated version listing without continuation markers, stopping");
                break;
            }
            key_marker = page.next_key_marker;
            version_id_marker = page.next_version_id_marker;
        }

        debug!(
            bucket = %self.store.bucket(),
            cutoff = %self.cutoff,
            deleted = report.deleted,
            retained = report.retained,
            failed = report.failed,
            "retention sweep finished"
        );
        Ok(report)
    }

    async fn sweep_entry(&self, entry: &VersionEntry, report: &mut SweepReport) {
        let expired = entry
            .last_modified
            .is_some_and(|modified| modified < self.cutoff);
        if !expired {
            report.retained += 1;
            return;
        }

        match self.store.delete_version(&entry.key, &entry.version_id).await {
            Ok(()) => {
                report.deleted += 1;
                debug!(
                    key = %entry.key,
                    version = %entry.version_id,
                    delete_marker = entry.is_delete_marker,
                    "deleted expired version"
                );
            }
            Err(err) => {
                report.failed += 1;
                warn!(
                    key = %entry.key,
                    version = %entry.version_id,
                    "failed to delete expired version, continuing: {err}"
                );
            }
        }
    }
}

/// Collect every version entry for exactly `key`, preserving the store's
/// most-recent-first order within the key. Real versions come first,
/// then delete markers.
pub async fn collect_versions(
    store: &dyn ObjectStoreClient,
    key: &str,
) -> Result<Vec<VersionEntry>, StoreError> {
    let mut versions = Vec::new();
    let mut markers = Vec::new();
    let mut key_marker: Option<String> = None;
    let mut version_id_marker: Option<String> = None;

    loop {
        let page = store
            .list_versions(Some(key), key_marker.as_deref(), version_id_marker.as_deref())
            .await?;

        versions.extend(page.versions.into_iter().filter(|entry| entry.key == key));
        markers.extend(
            page.delete_markers
                .into_iter()
                .filter(|entry| entry.key == key),
        );

        if !page.is_truncated {
            break;
        }
        key_marker = page.next_key_marker;
        version_id_marker = page.next_version_id_marker;
    }

    versions.extend(markers);
    Ok(versions)
}

/// Re-upload the second-most-recent real version of `key` as its new
/// current version.
///
/// Relies on the store returning versions most-recent-first; the listing
/// order is never rearranged here.
pub async fn restore_previous_version(
    store: &dyn ObjectStoreClient,
    key: &str,
) -> Result<PutOutcome, RestoreError> {
    let entries = collect_versions(store, key).await?;
    let real_versions: Vec<&VersionEntry> = entries
        .iter()
        .filter(|entry| !entry.is_delete_marker)
        .collect();

    if real_versions.is_empty() {
        return Err(RestoreError::NoVersions(key.to_string()));
    }
    let previous = real_versions
        .get(1)
        .ok_or_else(|| RestoreError::NoPreviousVersion(key.to_string()))?;

    let body = store.get_object_version(key, &previous.version_id).await?;
    debug!(
        key,
        version = %previous.version_id,
        bytes = body.len(),
        "restoring previous version as current"
    );
    Ok(store.put_object(key, body, None).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake::FakeStore;
    use crate::services::store::VersionPage;
    use bytes::Bytes;
    use chrono::TimeZone;

    fn entry(key: &str, version_id: &str, modified: DateTime<Utc>) -> VersionEntry {
        VersionEntry {
            key: key.to_string(),
            version_id: version_id.to_string(),
            last_modified: Some(modified),
            is_delete_marker: false,
            is_latest: false,
            size_bytes: Some(1),
        }
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn six_month_horizon_is_180_days() {
        let store = FakeStore::default();
        let sweeper = RetentionSweeper::with_horizon(&store, 6, at(2024, 6, 1));
        assert_eq!(sweeper.cutoff(), at(2023, 12, 4));
    }

    #[tokio::test]
    async fn deletes_only_entries_strictly_before_cutoff() {
        let store = FakeStore::default();
        {
            let mut state = store.state.lock().unwrap();
            state.pages = vec![VersionPage {
                versions: vec![
                    entry("a.txt", "v-old", at(2023, 11, 1)),
                    entry("a.txt", "v-new", at(2024, 1, 1)),
                ],
                ..Default::default()
            }];
        }

        let report = RetentionSweeper::with_horizon(&store, 6, at(2024, 6, 1))
            .sweep(None)
            .await
            .expect("sweep succeeds");

        assert_eq!(report, SweepReport { deleted: 1, retained: 1, failed: 0, pages: 1 });
        let state = store.state.lock().unwrap();
        assert_eq!(state.deleted, vec![("a.txt".to_string(), "v-old".to_string())]);
    }

    #[tokio::test]
    async fn entry_exactly_at_cutoff_is_retained() {
        let store = FakeStore::default();
        let cutoff = at(2023, 12, 4);
        store.state.lock().unwrap().pages = vec![VersionPage {
            versions: vec![entry("a.txt", "v-edge", cutoff)],
            ..Default::default()
        }];

        let report = RetentionSweeper::new(&store, cutoff)
            .sweep(None)
            .await
            .expect("sweep succeeds");

        assert_eq!(report.deleted, 0);
        assert_eq!(report.retained, 1);
        assert!(store.state.lock().unwrap().deleted.is_empty());
    }

    #[tokio::test]
    async fn follows_continuation_markers_across_pages() {
        let store = FakeStore::default();
        let old = at(2020, 1, 1);
        {
            let mut state = store.state.lock().unwrap();
            state.pages = vec![
                VersionPage {
                    versions: vec![entry("a", "v1", old), entry("a", "v2", old)],
                    next_key_marker: Some("a".into()),
                    next_version_id_marker: Some("v2".into()),
                    is_truncated: true,
                    ..Default::default()
                },
                VersionPage {
                    versions: vec![entry("b", "v3", old), entry("b", "v4", old)],
                    next_key_marker: Some("b".into()),
                    next_version_id_marker: Some("v4".into()),
                    is_truncated: true,
                    ..Default::default()
                },
                VersionPage {
                    versions: vec![entry("c", "v5", old), entry("c", "v6", old)],
                    ..Default::default()
                },
            ];
        }

        let report = RetentionSweeper::with_horizon(&store, 6, at(2024, 6, 1))
            .sweep(None)
            .await
            .expect("sweep succeeds");

        assert_eq!(report.deleted, 6);
        assert_eq!(report.pages, 3);

        let state = store.state.lock().unwrap();
        assert_eq!(state.deleted.len(), 6);
        assert_eq!(state.list_calls.len(), 3);
        assert_eq!(state.list_calls[0], (None, None));
        assert_eq!(state.list_calls[1], (Some("a".into()), Some("v2".into())));
        assert_eq!(state.list_calls[2], (Some("b".into()), Some("v4".into())));
    }

    #[tokio::test]
    async fn rerun_with_nothing_expired_deletes_nothing() {
        let store = FakeStore::default();
        store.state.lock().unwrap().pages = vec![VersionPage {
            versions: vec![entry("a.txt", "v-new", at(2024, 5, 30))],
            ..Default::default()
        }];

        let report = RetentionSweeper::with_horizon(&store, 6, at(2024, 6, 1))
            .sweep(None)
            .await
            .expect("sweep succeeds");

        assert_eq!(report.deleted, 0);
        assert!(store.state.lock().unwrap().deleted.is_empty());
    }

    #[tokio::test]
    async fn expired_delete_markers_are_swept_too() {
        let store = FakeStore::default();
        let mut marker = entry("a.txt", "v-tombstone", at(2020, 1, 1));
        marker.is_delete_marker = true;
        marker.size_bytes = None;
        store.state.lock().unwrap().pages = vec![VersionPage {
            delete_markers: vec![marker],
            ..Default::default()
        }];

        let report = RetentionSweeper::with_horizon(&store, 6, at(2024, 6, 1))
            .sweep(None)
            .await
            .expect("sweep succeeds");

        assert_eq!(report.deleted, 1);
    }

    #[tokio::test]
    async fn per_entry_delete_failure_does_not_stop_the_sweep() {
        let store = FakeStore::default();
        let old = at(2020, 1, 1);
        {
            let mut state = store.state.lock().unwrap();
            state.pages = vec![VersionPage {
                versions: vec![entry("a", "v-bad", old), entry("a", "v-good", old)],
                ..Default::default()
            }];
            state.fail_delete_versions.insert("v-bad".to_string());
        }

        let report = RetentionSweeper::with_horizon(&store, 6, at(2024, 6, 1))
            .sweep(None)
            .await
            .expect("sweep succeeds");

        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn enumeration_failure_surfaces_partial_count() {
        let store = FakeStore::default();
        let old = at(2020, 1, 1);
        {
            let mut state = store.state.lock().unwrap();
            state.pages = vec![VersionPage {
                versions: vec![entry("a", "v1", old), entry("a", "v2", old)],
                next_key_marker: Some("a".into()),
                next_version_id_marker: Some("v2".into()),
                is_truncated: true,
                ..Default::default()
            }];
            state.fail_list_at = Some(1);
        }

        let err = RetentionSweeper::with_horizon(&store, 6, at(2024, 6, 1))
            .sweep(None)
            .await
            .expect_err("second page fails");

        match err {
            SweepError::Enumeration { deleted_so_far, .. } => assert_eq!(deleted_so_far, 2),
        }
    }

    #[tokio::test]
    async fn restore_uses_second_most_recent_version() {
        let store = FakeStore::default();
        {
            let mut state = store.state.lock().unwrap();
            state.pages = vec![VersionPage {
                versions: vec![
                    entry("doc.txt", "v-current", at(2024, 5, 1)),
                    entry("doc.txt", "v-previous", at(2024, 4, 1)),
                    entry("doc.txt", "v-ancient", at(2024, 3, 1)),
                ],
                ..Default::default()
            }];
            state
                .version_bodies
                .insert(("doc.txt".into(), "v-previous".into()), Bytes::from_static(b"previous"));
        }

        let outcome = restore_previous_version(&store, "doc.txt")
            .await
            .expect("restore succeeds");

        assert_eq!(outcome.key, "doc.txt");
        let state = store.state.lock().unwrap();
        assert_eq!(
            state.objects.get("doc.txt"),
            Some(&Bytes::from_static(b"previous"))
        );
    }

    #[tokio::test]
    async fn restore_without_previous_version_fails() {
        let store = FakeStore::default();
        store.state.lock().unwrap().pages = vec![VersionPage {
            versions: vec![entry("doc.txt", "v-only", at(2024, 5, 1))],
            ..Default::default()
        }];

        let err = restore_previous_version(&store, "doc.txt")
            .await
            .expect_err("nothing to restore");
        assert!(matches!(err, RestoreError::NoPreviousVersion(_)));
    }

    #[tokio::test]
    async fn collect_versions_ignores_longer_keys_sharing_the_prefix() {
        let store = FakeStore::default();
        store.state.lock().unwrap().pages = vec![VersionPage {
            versions: vec![
                entry("doc", "v1", at(2024, 5, 1)),
                entry("doc.bak", "v2", at(2024, 5, 1)),
            ],
            ..Default::default()
        }];

        let entries = collect_versions(&store, "doc").await.expect("listing succeeds");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].version_id, "v1");
    }
}
