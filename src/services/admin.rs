//! Bucket-level management operations: creation, deletion, policies,
//! lifecycle rules, encryption, and static-website configuration.
//!
//! These are thin pass-throughs to the store's management API, kept apart
//! from the bucket-scoped `ObjectStoreClient` capability that the upload
//! and retention workflows consume.

use crate::models::object::BucketSummary;
use crate::services::s3::{map_sdk_error, to_utc};
use crate::services::store::{StoreError, StoreResult};
use aws_sdk_s3::{
    Client,
    types::{
        BucketLifecycleConfiguration, BucketLocationConstraint, BucketVersioningStatus,
        CreateBucketConfiguration, ErrorDocument, ExpirationStatus, IndexDocument,
        LifecycleExpiration, LifecycleRule, LifecycleRuleFilter, ServerSideEncryption,
        ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration,
        ServerSideEncryptionRule, WebsiteConfiguration,
    },
};
use serde_json::json;
use tracing::debug;

/// A lifecycle rule reduced to the fields the CLI reports.
#[derive(Clone, Debug)]
pub struct LifecycleRuleView {
    pub id: Option<String>,
    pub expiration_days: Option<i32>,
    pub status: String,
}

/// Canned bucket policies, mirroring the two documents the tool assigns.
#[derive(Clone, Copy, Debug)]
pub enum PolicyKind {
    /// Anonymous `s3:GetObject` on every key.
    PublicRead,
    /// Anonymous get/put/delete on the bucket and every key.
    FullAccess,
}

pub fn policy_document(kind: PolicyKind, bucket: &str) -> serde_json::Value {
    match kind {
        PolicyKind::PublicRead => json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "PublicReadGetObject",
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{bucket}/*"),
            }],
        }),
        PolicyKind::FullAccess => json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": "*",
                "Action": [
                    "s3:PutObject", "s3:PutObjectAcl", "s3:GetObject",
                    "s3:GetObjectAcl", "s3:DeleteObject"
                ],
                "Resource": [
                    format!("arn:aws:s3:::{bucket}"),
                    format!("arn:aws:s3:::{bucket}/*"),
                ],
            }],
        }),
    }
}

/// Static-website URL for a bucket, matching the store's regional forms.
pub fn website_url(bucket: &str, region: &str) -> String {
    if region == "us-east-1" {
        format!("http://{bucket}.s3-website-{region}.amazonaws.com")
    } else {
        format!("http://{bucket}.s3-website.{region}.amazonaws.com")
    }
}

/// Bucket management over the shared SDK client.
#[derive(Clone)]
pub struct BucketAdmin {
    client: Client,
}

impl BucketAdmin {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn list_buckets(&self) -> StoreResult<Vec<BucketSummary>> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|err| map_sdk_error("list_buckets", err))?;

        Ok(response
            .buckets()
            .iter()
            .map(|bucket| BucketSummary {
                name: bucket.name().unwrap_or_default().to_string(),
                created_at: bucket.creation_date().and_then(to_utc),
            })
            .collect())
    }

    /// Create a bucket in `region`. The store rejects an explicit location
    /// constraint for us-east-1, so it is omitted there.
    pub async fn create_bucket(&self, name: &str, region: &str) -> StoreResult<()> {
        let mut request = self.client.create_bucket().bucket(name);
        if region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|err| map_sdk_error("create_bucket", err))?;
        debug!(bucket = name, region, "created bucket");
        Ok(())
    }

    pub async fn delete_bucket(&self, name: &str) -> StoreResult<()> {
        self.client
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(|err| map_sdk_error("delete_bucket", err))?;
        debug!(bucket = name, "deleted bucket");
        Ok(())
    }

    pub async fn bucket_exists(&self, name: &str) -> StoreResult<bool> {
        match self.client.head_bucket().bucket(name).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(map_sdk_error("head_bucket", err)),
        }
    }

    /// Versioning status as the store reports it; `None` when versioning
    /// has never been enabled.
    pub async fn versioning_status(&self, name: &str) -> StoreResult<Option<BucketVersioningStatus>> {
        let response = self
            .client
            .get_bucket_versioning()
            .bucket(name)
            .send()
            .await
            .map_err(|err| map_sdk_error("get_bucket_versioning", err))?;
        Ok(response.status().cloned())
    }

    pub async fn read_policy(&self, name: &str) -> StoreResult<Option<String>> {
        let response = self
            .client
            .get_bucket_policy()
            .bucket(name)
            .send()
            .await
            .map_err(|err| map_sdk_error("get_bucket_policy", err))?;
        Ok(response.policy().map(str::to_string))
    }

    pub async fn assign_policy(&self, name: &str, kind: PolicyKind) -> StoreResult<()> {
        let document = policy_document(kind, name).to_string();
        self.client
            .put_bucket_policy()
            .bucket(name)
            .policy(document)
            .send()
            .await
            .map_err(|err| map_sdk_error("put_bucket_policy", err))?;
        debug!(bucket = name, ?kind, "assigned bucket policy");
        Ok(())
    }

    /// Install a single expire-after-`days` lifecycle rule covering the
    /// whole bucket.
    pub async fn set_lifecycle_expiration(&self, name: &str, days: i32) -> StoreResult<()> {
        let rule = LifecycleRule::builder()
            .id(format!("expire-after-{days}-days"))
            .status(ExpirationStatus::Enabled)
            .filter(LifecycleRuleFilter::builder().prefix("").build())
            .expiration(LifecycleExpiration::builder().days(days).build())
            .build()
            .map_err(|err| StoreError::Api(format!("building lifecycle rule: {err}")))?;
        let configuration = BucketLifecycleConfiguration::builder()
            .rules(rule)
            .build()
            .map_err(|err| StoreError::Api(format!("building lifecycle configuration: {err}")))?;

        self.client
            .put_bucket_lifecycle_configuration()
            .bucket(name)
            .lifecycle_configuration(configuration)
            .send()
            .await
            .map_err(|err| map_sdk_error("put_bucket_lifecycle_configuration", err))?;
        debug!(bucket = name, days, "set lifecycle expiration");
        Ok(())
    }

    pub async fn lifecycle_rules(&self, name: &str) -> StoreResult<Vec<LifecycleRuleView>> {
        let response = self
            .client
            .get_bucket_lifecycle_configuration()
            .bucket(name)
            .send()
            .await
            .map_err(|err| map_sdk_error("get_bucket_lifecycle_configuration", err))?;

        Ok(response
            .rules()
            .iter()
            .map(|rule| LifecycleRuleView {
                id: rule.id().map(str::to_string),
                expiration_days: rule.expiration().and_then(|exp| exp.days()),
                status: rule.status().as_str().to_string(),
            })
            .collect())
    }

    /// Enable AES-256 server-side encryption by default.
    pub async fn set_encryption(&self, name: &str) -> StoreResult<()> {
        let by_default = ServerSideEncryptionByDefault::builder()
            .sse_algorithm(ServerSideEncryption::Aes256)
            .build()
            .map_err(|err| StoreError::Api(format!("building encryption default: {err}")))?;
        let configuration = ServerSideEncryptionConfiguration::builder()
            .rules(
                ServerSideEncryptionRule::builder()
                    .apply_server_side_encryption_by_default(by_default)
                    .build(),
            )
            .build()
            .map_err(|err| StoreError::Api(format!("building encryption configuration: {err}")))?;

        self.client
            .put_bucket_encryption()
            .bucket(name)
            .server_side_encryption_configuration(configuration)
            .send()
            .await
            .map_err(|err| map_sdk_error("put_bucket_encryption", err))?;
        debug!(bucket = name, "enabled AES-256 default encryption");
        Ok(())
    }

    pub async fn encryption_algorithms(&self, name: &str) -> StoreResult<Vec<String>> {
        let response = self
            .client
            .get_bucket_encryption()
            .bucket(name)
            .send()
            .await
            .map_err(|err| map_sdk_error("get_bucket_encryption", err))?;

        Ok(response
            .server_side_encryption_configuration()
            .map(|configuration| {
                configuration
                    .rules()
                    .iter()
                    .filter_map(|rule| rule.apply_server_side_encryption_by_default())
                    .map(|by_default| by_default.sse_algorithm().as_str().to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Configure static-website hosting: lift the public-access block,
    /// install index/error documents, and attach a public-read policy.
    pub async fn configure_website(
        &self,
        name: &str,
        index: &str,
        error_doc: &str,
    ) -> StoreResult<()> {
        self.client
            .delete_public_access_block()
            .bucket(name)
            .send()
            .await
            .map_err(|err| map_sdk_error("delete_public_access_block", err))?;

        let index_document = IndexDocument::builder()
            .suffix(index)
            .build()
            .map_err(|err| StoreError::Api(format!("building index document: {err}")))?;
        let error_document = ErrorDocument::builder()
            .key(error_doc)
            .build()
            .map_err(|err| StoreError::Api(format!("building error document: {err}")))?;

        self.client
            .put_bucket_website()
            .bucket(name)
            .website_configuration(
                WebsiteConfiguration::builder()
                    .index_document(index_document)
                    .error_document(error_document)
                    .build(),
            )
            .send()
            .await
            .map_err(|err| map_sdk_error("put_bucket_website", err))?;

        self.assign_policy(name, PolicyKind::PublicRead).await?;
        debug!(bucket = name, index, error_doc, "configured website hosting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_read_policy_targets_every_key() {
        let document = policy_document(PolicyKind::PublicRead, "my-bucket");
        assert_eq!(
            document["Statement"][0]["Resource"],
            "arn:aws:s3:::my-bucket/*"
        );
        assert_eq!(document["Statement"][0]["Action"], "s3:GetObject");
    }

    #[test]
    fn full_access_policy_covers_bucket_and_keys() {
        let document = policy_document(PolicyKind::FullAccess, "my-bucket");
        let resources = document["Statement"][0]["Resource"]
            .as_array()
            .expect("resource list");
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0], "arn:aws:s3:::my-bucket");
    }

    #[test]
    fn website_url_uses_dashed_form_only_for_us_east_1() {
        assert_eq!(
            website_url("site", "us-east-1"),
            "http://site.s3-website-us-east-1.amazonaws.com"
        );
        assert_eq!(
            website_url("site", "eu-west-1"),
            "http://site.s3-website.eu-west-1.amazonaws.com"
        );
    }
}
