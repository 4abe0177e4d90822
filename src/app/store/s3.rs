//! AWS S3 backed object store

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::GetObjectError;
use tracing::debug;

use super::{ObjectStore, StoreConfig};
use crate::app::location::ObjectLocation;
use crate::errors::{StoreError, StoreResult};

/// Object store reading from Amazon S3 or an S3-compatible service
#[derive(Debug, Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    /// Creates a store with a client built from `config`
    pub async fn new(config: &StoreConfig) -> Self {
        let client = config.build_s3_client().await;
        tracing::info!(
            region = ?client.config().region(),
            endpoint = ?config.endpoint_url,
            "Created S3 object store"
        );
        Self { client }
    }

    /// Wraps an already configured client
    pub fn with_client(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn fetch_into(&self, location: &ObjectLocation, buf: &mut Vec<u8>) -> StoreResult<usize> {
        let mut output = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(GetObjectError::NoSuchKey(_)) => StoreError::NotFound {
                    location: location.to_string(),
                },
                _ => StoreError::Request {
                    location: location.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                },
            })?;

        if let Some(len) = output.content_length().filter(|len| *len > 0) {
            buf.reserve(usize::try_from(len).unwrap_or(0));
        }

        let start = buf.len();
        while let Some(bytes) = output
            .body
            .try_next()
            .await
            .map_err(|e| StoreError::Body {
                location: location.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?
        {
            buf.extend_from_slice(&bytes);
        }

        let fetched = buf.len() - start;
        debug!("Fetched {} bytes from {}", fetched, location);
        Ok(fetched)
    }
}
