//! s3lines Library
//!
//! Streams the lines of many blob-store objects through a bounded,
//! back-pressured pipeline: names are fetched concurrently, decompressed and
//! split into chunks of whole lines, and written to a single output.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
