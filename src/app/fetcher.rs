//! Fetch stage: object names in, downloaded objects out
//!
//! Each fetcher is an async task pulling names from the shared names channel.
//! A name is resolved, the object is downloaded into a pooled buffer, and the
//! buffer is sent on to the scanners together with the name. Failures are
//! published on the error channel and the name is skipped; the buffer goes
//! back to the pool when the failed fetch drops it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::location::Resolver;
use crate::app::pool::{BufferPool, PooledBuf};
use crate::app::store::ObjectStore;
use crate::errors::PipelineError;

/// A downloaded object on its way to a scanner
#[derive(Debug)]
pub struct FetchedObject {
    /// The name as given on input, used for compression detection and messages
    pub name: String,
    /// Object contents, exactly the bytes written by the store
    pub data: PooledBuf,
}

/// Per-fetcher tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStats {
    /// Objects downloaded and passed downstream
    pub objects: u64,
    /// Bytes downloaded
    pub bytes: u64,
    /// Names that failed to resolve or fetch
    pub failures: u64,
}

impl FetchStats {
    pub fn merge(&mut self, other: &FetchStats) {
        self.objects += other.objects;
        self.bytes += other.bytes;
        self.failures += other.failures;
    }
}

/// A single fetch worker
pub struct Fetcher {
    id: usize,
    store: Arc<dyn ObjectStore>,
    resolver: Arc<Resolver>,
    pool: BufferPool,
    names: flume::Receiver<String>,
    objects: flume::Sender<FetchedObject>,
    errors: flume::Sender<PipelineError>,
    stats: FetchStats,
}

impl Fetcher {
    pub fn new(
        id: usize,
        store: Arc<dyn ObjectStore>,
        resolver: Arc<Resolver>,
        pool: BufferPool,
        names: flume::Receiver<String>,
        objects: flume::Sender<FetchedObject>,
        errors: flume::Sender<PipelineError>,
    ) -> Self {
        Self {
            id,
            store,
            resolver,
            pool,
            names,
            objects,
            errors,
            stats: FetchStats::default(),
        }
    }

    /// Fetch until the names channel is closed and drained
    pub async fn run(mut self) -> FetchStats {
        debug!("Fetcher {} starting", self.id);

        while let Ok(name) = self.names.recv_async().await {
            match self.fetch(name).await {
                Ok(Some(object)) => {
                    if self.objects.send_async(object).await.is_err() {
                        // scanners are gone; nothing downstream can use more work
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    self.stats.failures += 1;
                    self.publish(e).await;
                }
            }
        }

        info!(
            "Fetcher {} done: {} objects, {} bytes, {} failures",
            self.id, self.stats.objects, self.stats.bytes, self.stats.failures
        );
        self.stats
    }

    /// Resolve and download one object
    async fn fetch(&mut self, name: String) -> Result<Option<FetchedObject>, PipelineError> {
        if name.is_empty() {
            return Ok(None);
        }

        let location = self.resolver.resolve(&name)?;
        let mut data = self.pool.acquire();
        let fetched = self.store.fetch_into(&location, &mut data).await?;

        debug!("Fetcher {} got {} ({} bytes)", self.id, name, fetched);
        self.stats.objects += 1;
        self.stats.bytes += fetched as u64;
        Ok(Some(FetchedObject { name, data }))
    }

    async fn publish(&self, error: PipelineError) {
        debug!("Fetcher {} error: {}", self.id, error);
        let _ = self.errors.send_async(error).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::store::MemoryStore;
    use crate::errors::{NameError, StoreError};

    fn spawn_fetcher(
        store: MemoryStore,
        resolver: Resolver,
        pool: &BufferPool,
    ) -> (
        flume::Sender<String>,
        flume::Receiver<FetchedObject>,
        flume::Receiver<PipelineError>,
        tokio::task::JoinHandle<FetchStats>,
    ) {
        let (names_tx, names_rx) = flume::bounded(4);
        let (objects_tx, objects_rx) = flume::bounded(4);
        let (errors_tx, errors_rx) = flume::bounded(4);
        let fetcher = Fetcher::new(
            0,
            Arc::new(store),
            Arc::new(resolver),
            pool.clone(),
            names_rx,
            objects_tx,
            errors_tx,
        );
        let handle = tokio::spawn(fetcher.run());
        (names_tx, objects_rx, errors_rx, handle)
    }

    #[tokio::test]
    async fn test_fetches_absolute_and_relative_names() {
        let store = MemoryStore::new()
            .with_object("b", "a.txt", "abs\n")
            .with_object("default", "pre/rel.txt", "rel\n");
        let pool = BufferPool::new(4, 16);
        let (names, objects, _errors, handle) =
            spawn_fetcher(store, Resolver::with_default("default", "pre/"), &pool);

        names.send_async("s3://b/a.txt".to_string()).await.unwrap();
        names.send_async("rel.txt".to_string()).await.unwrap();
        drop(names);

        let first = objects.recv_async().await.unwrap();
        assert_eq!(first.name, "s3://b/a.txt");
        assert_eq!(&first.data[..], b"abs\n");

        let second = objects.recv_async().await.unwrap();
        assert_eq!(second.name, "rel.txt");
        assert_eq!(&second.data[..], b"rel\n");

        let stats = handle.await.unwrap();
        assert_eq!(stats.objects, 2);
        assert_eq!(stats.bytes, 8);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test]
    async fn test_failures_are_published_and_buffers_recycled() {
        let pool = BufferPool::new(4, 16);
        let (names, objects, errors, handle) =
            spawn_fetcher(MemoryStore::new(), Resolver::with_default("b", ""), &pool);

        names.send_async("s3:///x".to_string()).await.unwrap();
        names.send_async("s3://bucket".to_string()).await.unwrap();
        names.send_async("missing.txt".to_string()).await.unwrap();
        drop(names);

        let stats = handle.await.unwrap();
        assert_eq!(stats.failures, 3);
        assert!(objects.recv_async().await.is_err());

        let published: Vec<PipelineError> = errors.drain().collect();
        assert!(matches!(
            published[0],
            PipelineError::Name(NameError::MissingBucket { .. })
        ));
        assert!(matches!(
            published[1],
            PipelineError::Name(NameError::MissingKey { .. })
        ));
        assert!(matches!(
            published[2],
            PipelineError::Fetch(StoreError::NotFound { .. })
        ));

        // the failed download's buffer went straight back
        assert_eq!(pool.stats().outstanding(), 0);
        assert_eq!(pool.idle(), 1);
    }
}
