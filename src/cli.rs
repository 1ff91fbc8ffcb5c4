//! Command-line surface for all bucket and object operations.
//!
//! ## Structure
//! - **`bucket`** — management: create, delete, list, existence probe,
//!   versioning status, policies, lifecycle rules, encryption, website.
//! - **`object`** — data path: list, upload (single-request, multipart,
//!   type-routed, URL fetch), delete, version inspection, previous-version
//!   restore.
//! - **`sweep`** — retention sweep over a versioned bucket.

use crate::config::GlobalArgs;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "s3ops",
    version,
    about = "Manage S3 buckets and objects: uploads, versioning, retention"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bucket management operations
    #[command(subcommand)]
    Bucket(BucketCommand),

    /// Object operations within a bucket
    #[command(subcommand)]
    Object(ObjectCommand),

    /// Delete versions and delete markers older than the retention horizon
    Sweep {
        /// Bucket to sweep
        bucket: String,

        /// Restrict the sweep to keys under this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Retention horizon in months (30-day months)
        #[arg(long, default_value_t = 6)]
        months: u32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BucketCommand {
    /// List all buckets
    List,

    /// Create a bucket
    Create {
        name: String,

        /// Region to create the bucket in
        #[arg(long)]
        region: String,

        /// Skip the pre-flight existence check
        #[arg(long)]
        no_exists_check: bool,
    },

    /// Delete a bucket
    Delete { name: String },

    /// Check whether a bucket exists
    Exists { name: String },

    /// Report the bucket's versioning status
    Versioning { name: String },

    /// Read or assign bucket policies
    #[command(subcommand)]
    Policy(PolicyCommand),

    /// Manage lifecycle expiration rules
    #[command(subcommand)]
    Lifecycle(LifecycleCommand),

    /// Manage default server-side encryption
    #[command(subcommand)]
    Encryption(EncryptionCommand),

    /// Configure static-website hosting and print the site URL
    Website {
        name: String,

        /// Index document suffix
        #[arg(long, default_value = "index.html")]
        index: String,

        /// Error document key
        #[arg(long, default_value = "error.html")]
        error_doc: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Print the current bucket policy document
    Read { name: String },

    /// Attach one of the canned policies
    Assign {
        name: String,

        #[arg(long, value_enum)]
        kind: PolicyKindArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PolicyKindArg {
    /// Anonymous read of every object
    PublicRead,
    /// Anonymous read/write/delete on the bucket and its objects
    FullAccess,
}

#[derive(Subcommand, Debug)]
pub enum LifecycleCommand {
    /// Install an expire-after-N-days rule for the whole bucket
    Set {
        name: String,

        /// Days until objects expire
        #[arg(long, default_value_t = 120)]
        days: i32,
    },

    /// Print the current lifecycle rules
    Get { name: String },
}

#[derive(Subcommand, Debug)]
pub enum EncryptionCommand {
    /// Enable AES-256 default encryption
    Set { name: String },

    /// Print the configured default encryption algorithms
    Get { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ObjectCommand {
    /// List objects, optionally under a prefix
    List {
        bucket: String,

        #[arg(long)]
        prefix: Option<String>,
    },

    /// Upload a small file in a single request
    Upload {
        bucket: String,

        /// Local file to upload
        #[arg(long)]
        file: PathBuf,

        /// Destination key (defaults to the file name)
        #[arg(long)]
        key: Option<String>,
    },

    /// Upload a large file as an atomic multipart transaction
    UploadLarge {
        bucket: String,

        /// Local file to upload
        #[arg(long)]
        file: PathBuf,

        /// Destination key (defaults to the file name)
        #[arg(long)]
        key: Option<String>,

        /// Part size in MiB (5 is the store's minimum for non-final parts)
        #[arg(long, default_value_t = 5)]
        part_size_mib: u64,
    },

    /// Upload a file into a category folder derived from its extension
    UploadByType {
        bucket: String,

        /// Local file to upload
        #[arg(long)]
        file: PathBuf,
    },

    /// Download a URL and upload the payload under a generated key
    Fetch {
        bucket: String,

        /// Source URL
        #[arg(long)]
        url: String,

        /// Also keep a local copy of the downloaded file
        #[arg(long)]
        keep_local: bool,
    },

    /// Delete the current version of an object
    Delete { bucket: String, key: String },

    /// List every version of one object
    Versions { bucket: String, key: String },

    /// Re-upload the previous version of an object as its current version
    RestorePrevious { bucket: String, key: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_well_formed() {
        Cli::command().debug_assert();
    }
}
