//! Service layer: the abstract store capability, its S3 implementation,
//! the two core workflows (chunked upload, retention sweep), and bucket
//! administration glue.

pub mod admin;
pub mod retention;
pub mod s3;
pub mod store;
pub mod upload;

#[cfg(test)]
pub mod fake;
