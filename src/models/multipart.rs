//! Represents multipart upload transactions and their parts.

use serde::{Deserialize, Serialize};

/// A single successfully uploaded part of a multipart transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PartRecord {
    /// Part number (1-based, strictly ascending within a transaction).
    pub part_number: i32,

    /// Opaque completion tag returned by the store for this part,
    /// required at finalize time.
    pub completion_tag: String,
}

/// An in-flight multipart upload transaction.
///
/// Created when a large-file upload begins and destroyed by exactly one of
/// finalize or abort. The transaction never outlives the upload call that
/// created it; there is no persisted state across process invocations.
#[derive(Clone, Debug)]
pub struct UploadTransaction {
    /// Destination object key.
    pub key: String,

    /// Opaque transaction token issued by the store, owned exclusively
    /// by the upload workflow for the transaction's lifetime.
    pub transaction_id: String,

    parts: Vec<PartRecord>,
}

impl UploadTransaction {
    pub fn new(key: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            transaction_id: transaction_id.into(),
            parts: Vec::new(),
        }
    }

    /// Append a completed part. Part numbers must arrive in strictly
    /// ascending order; the upload workflow generates them that way.
    pub fn record_part(&mut self, part_number: i32, completion_tag: String) {
        debug_assert!(
            self.parts
                .last()
                .is_none_or(|last| last.part_number < part_number),
            "part numbers must be strictly ascending"
        );
        self.parts.push(PartRecord {
            part_number,
            completion_tag,
        });
    }

    pub fn parts(&self) -> &[PartRecord] {
        &self.parts
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_parts_in_order() {
        let mut txn = UploadTransaction::new("photos/big.bin", "txn-1");
        txn.record_part(1, "\"etag-1\"".into());
        txn.record_part(2, "\"etag-2\"".into());

        assert_eq!(txn.part_count(), 2);
        assert_eq!(txn.parts()[0].part_number, 1);
        assert_eq!(txn.parts()[1].completion_tag, "\"etag-2\"");
    }
}
