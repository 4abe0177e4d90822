//! In-memory object store
//!
//! Holds objects in a map keyed by location. Used by the test suite and
//! handy for exercising the pipeline without network access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::ObjectStore;
use crate::app::location::ObjectLocation;
use crate::errors::{StoreError, StoreResult};

/// Object store backed by a map of in-memory objects
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<ObjectLocation, Bytes>>,
    fetches: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` at `bucket/key`, replacing any previous object
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        let mut objects = self.objects.write().unwrap_or_else(|e| e.into_inner());
        objects.insert(ObjectLocation::new(bucket, key), data.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with_object(self, bucket: &str, key: &str, data: impl Into<Bytes>) -> Self {
        self.insert(bucket, key, data);
        self
    }

    /// Number of objects held
    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fetch attempts served, successful or not
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn fetch_into(&self, location: &ObjectLocation, buf: &mut Vec<u8>) -> StoreResult<usize> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let data = self
            .objects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(location)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                location: location.to_string(),
            })?;

        buf.extend_from_slice(&data);
        Ok(data.len())
    }
}
