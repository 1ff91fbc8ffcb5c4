//! Object versions and retention sweep reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One historical version of an object in a versioned bucket.
///
/// Entries are immutable once read from a listing page; the sweep workflow
/// only observes them and optionally issues a delete-by-version call.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VersionEntry {
    /// Object key this version belongs to.
    pub key: String,

    /// Opaque per-version token.
    pub version_id: String,

    /// When this version was written. Entries without a timestamp are
    /// never considered expired.
    pub last_modified: Option<DateTime<Utc>>,

    /// Distinguishes tombstone entries from real payload versions.
    pub is_delete_marker: bool,

    /// Whether the store reports this entry as the current version.
    pub is_latest: bool,

    /// Payload size in bytes; absent for delete markers.
    pub size_bytes: Option<i64>,
}

/// Aggregate outcome of a retention sweep.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Versions and delete markers removed.
    pub deleted: u64,

    /// Entries younger than the cutoff, left untouched.
    pub retained: u64,

    /// Delete calls that failed; the sweep continues past them.
    pub failed: u64,

    /// Listing pages visited.
    pub pages: u32,
}
