//! Listing summaries for buckets and the objects they contain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of an object listing.
///
/// Summaries carry metadata only, never the payload bytes.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ObjectSummary {
    /// Object key (path-like identifier within the bucket).
    pub key: String,

    /// Size in bytes.
    pub size_bytes: i64,

    /// Timestamp of the last modification, when the store reports one.
    pub last_modified: Option<DateTime<Utc>>,

    /// Checksum reported by the store.
    pub etag: Option<String>,
}

/// One entry of a bucket listing.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BucketSummary {
    /// Globally unique bucket name.
    pub name: String,

    /// When the bucket was created.
    pub created_at: Option<DateTime<Utc>>,
}
