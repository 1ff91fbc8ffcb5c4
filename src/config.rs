//! Centralized application configuration.
//! Combines environment variables and CLI arguments, and builds the shared
//! SDK client from the result.

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, retry::RetryConfig, timeout::TimeoutConfig};
use aws_sdk_s3::Client;
use clap::Args;
use std::{env, time::Duration};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Connection options shared by every subcommand.
///
/// Credentials are never handled here; they come from the ambient
/// provider chain (environment, profile, instance role).
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Region to operate in (overrides AWS_REGION)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Custom endpoint URL, e.g. a MinIO instance (overrides AWS_ENDPOINT_URL)
    #[arg(long, global = true)]
    pub endpoint_url: Option<String>,

    /// Per-operation timeout in seconds (overrides S3OPS_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Maximum attempts per operation, including retries (overrides S3OPS_MAX_ATTEMPTS)
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,
}

/// Resolved configuration after merging CLI arguments over the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl AppConfig {
    /// Merge CLI arguments over environment variables.
    pub fn from_env_and_args(args: &GlobalArgs) -> Result<Self> {
        let env_region = env::var("AWS_REGION").ok();
        let env_endpoint = env::var("AWS_ENDPOINT_URL").ok();
        let env_timeout = match env::var("S3OPS_TIMEOUT_SECS") {
            Ok(value) => Some(
                value
                    .parse::<u64>()
                    .with_context(|| format!("parsing S3OPS_TIMEOUT_SECS value `{}`", value))?,
            ),
            Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(err).context("reading S3OPS_TIMEOUT_SECS"),
        };
        let env_attempts = match env::var("S3OPS_MAX_ATTEMPTS") {
            Ok(value) => Some(
                value
                    .parse::<u32>()
                    .with_context(|| format!("parsing S3OPS_MAX_ATTEMPTS value `{}`", value))?,
            ),
            Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(err).context("reading S3OPS_MAX_ATTEMPTS"),
        };

        Ok(Self {
            region: args.region.clone().or(env_region),
            endpoint_url: args.endpoint_url.clone().or(env_endpoint),
            timeout_secs: args
                .timeout_secs
                .or(env_timeout)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            max_attempts: args
                .max_attempts
                .or(env_attempts)
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
        })
    }

    /// Build the shared S3 client with the configured region, endpoint,
    /// timeouts, and retry attempts.
    pub async fn connect(&self) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(self.timeout_secs))
                    .build(),
            )
            .retry_config(RetryConfig::standard().with_max_attempts(self.max_attempts));

        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let sdk_config = loader.load().await;
        if self.endpoint_url.is_some() {
            // Path-style addressing for MinIO and other S3-compatible stores.
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        } else {
            Client::new(&sdk_config)
        }
    }
}
