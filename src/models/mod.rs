//! Core data models for bucket and object operations.
//!
//! These entities describe multipart transactions, object versions, and
//! listing summaries independently of the store SDK. They serialize
//! naturally as JSON via `serde` for machine-readable command output.

pub mod multipart;
pub mod object;
pub mod version;
