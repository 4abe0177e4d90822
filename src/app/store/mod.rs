//! Object store access
//!
//! The pipeline only needs one operation from a blob store: download the whole
//! object into a caller-supplied buffer. This module defines that seam and
//! its implementations:
//! - `config`: S3 client configuration and building
//! - `s3`: the AWS S3 backed store
//! - `memory`: an in-memory store for tests and offline runs

use async_trait::async_trait;

use crate::app::location::ObjectLocation;
use crate::errors::StoreResult;

pub mod config;
pub mod memory;
pub mod s3;

pub use config::StoreConfig;
pub use memory::MemoryStore;
pub use s3::S3Store;

/// A blob store the fetchers download from
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Append the full contents of the object at `location` to `buf`
    ///
    /// Returns the number of bytes appended. On error `buf` may hold a partial
    /// body; the caller discards it.
    async fn fetch_into(&self, location: &ObjectLocation, buf: &mut Vec<u8>) -> StoreResult<usize>;
}
