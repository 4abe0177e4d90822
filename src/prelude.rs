//! Prelude module for the s3lines library
//!
//! Re-exports the items needed to embed the pipeline with a single
//! `use s3lines::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use s3lines::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = Arc::new(S3Store::new(&StoreConfig::default()).await);
//!     let pipeline = Pipeline::new(PipelineConfig::default(), store)?;
//!
//!     let report = pipeline
//!         .run(NameSource::fixed(["s3://bucket/a.log.gz"]), std::io::stdout(), std::io::stderr())
//!         .await;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, PipelineError, Result};

// Pipeline and its collaborators
pub use crate::app::{
    BufferPool, MemoryStore, NameSource, ObjectLocation, ObjectStore, Pipeline, PipelineConfig,
    PipelineReport, Resolver, S3Store, StoreConfig,
};
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{CHUNK_LINES, DEFAULT_CONCURRENCY, MAX_CONCURRENCY};

pub use std::sync::Arc;

pub use tokio;
