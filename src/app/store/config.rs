//! S3 client configuration and building logic
//!
//! Credentials are always taken from the ambient AWS environment (variables,
//! profile files, instance metadata). Everything else can be overridden here.

use std::time::Duration;

use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use serde::{Deserialize, Serialize};

use crate::constants::store;

/// Configuration for the S3 client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Region override; the SDK region chain is used when unset
    pub region: Option<String>,
    /// Custom endpoint (S3-compatible services, local test servers)
    pub endpoint_url: Option<String>,
    /// Use path-style addressing instead of virtual-hosted buckets
    pub force_path_style: bool,
    /// Timeout for a whole GetObject, body included
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,
    /// Connection establishment timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// SDK attempt limit per request; the SDK default when unset
    pub max_attempts: Option<u32>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            force_path_style: false,
            operation_timeout: store::DEFAULT_OPERATION_TIMEOUT,
            connect_timeout: store::DEFAULT_CONNECT_TIMEOUT,
            max_attempts: None,
        }
    }
}

impl StoreConfig {
    /// Builds the S3 client with the specified configuration
    pub async fn build_s3_client(&self) -> aws_sdk_s3::Client {
        let region = RegionProviderChain::first_try(self.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(store::FALLBACK_REGION));

        let timeouts = TimeoutConfig::builder()
            .operation_timeout(self.operation_timeout)
            .connect_timeout(self.connect_timeout)
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .timeout_config(timeouts);

        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        if let Some(attempts) = self.max_attempts {
            loader = loader.retry_config(RetryConfig::standard().with_max_attempts(attempts));
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(self.force_path_style)
            .build();

        aws_sdk_s3::Client::from_conf(s3_config)
    }
}
