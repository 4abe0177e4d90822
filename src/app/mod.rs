//! Core application logic for s3lines
//!
//! This module contains the streaming pipeline and its stages: the buffer
//! pool, name sources and resolution, the object stores, and the fetch, scan,
//! write and error reporting workers.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use s3lines::app::{NameSource, Pipeline, PipelineConfig, S3Store, StoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(S3Store::new(&StoreConfig::default()).await);
//! let config = PipelineConfig::default()
//!     .with_concurrency(8)
//!     .with_default_prefix("s3://my-bucket/logs/");
//!
//! let pipeline = Pipeline::new(config, store)?;
//! let report = pipeline
//!     .run(NameSource::stdin(), std::io::stdout(), std::io::stderr())
//!     .await;
//! eprintln!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod error_sink;
pub mod fetcher;
pub mod location;
pub mod names;
pub mod pipeline;
pub mod pool;
pub mod scanner;
pub mod store;
pub mod writer;

// Re-export main public API
pub use fetcher::{FetchStats, FetchedObject};
pub use location::{split_object_name, ObjectLocation, Resolver};
pub use names::NameSource;
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport};
pub use pool::{BufferPool, PoolStats, PooledBuf};
pub use scanner::{is_gzipped, LineChunk, ScanStats};
pub use store::{MemoryStore, ObjectStore, S3Store, StoreConfig};
pub use writer::{write_fully, WriteStats};
