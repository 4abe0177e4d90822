//! Application constants for s3lines
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Object naming constants
pub mod names {
    /// Scheme prefix marking an absolute `bucket/key` object name
    pub const S3_SCHEME: &str = "s3://";

    /// Separator between bucket and key, and between key segments
    pub const PATH_SEPARATOR: char = '/';

    /// Separator introducing a file extension
    pub const EXTENSION_SEPARATOR: char = '.';
}

/// Pipeline and concurrency configuration
pub mod pipeline {
    /// Default requested concurrency (`-c`)
    pub const DEFAULT_CONCURRENCY: usize = 4;

    /// Lower bound of the effective concurrency
    pub const MIN_CONCURRENCY: usize = 1;

    /// Upper bound of the effective concurrency
    pub const MAX_CONCURRENCY: usize = 16;

    /// Number of lines batched into a single output chunk
    pub const CHUNK_LINES: usize = 1000;

    /// Capacity of a buffer allocated when the pool is empty (64KB)
    pub const FRESH_BUFFER_CAPACITY: usize = 64 * 1024;

    /// Pool capacity for a given concurrency: two buffers per worker pair plus slack
    pub const fn pool_capacity(concurrency: usize) -> usize {
        2 * concurrency + 2
    }
}

/// Gzip detection constants
pub mod gzip {
    /// Leading magic bytes of a gzip member
    pub const MAGIC: [u8; 2] = [0x1f, 0x8b];

    /// Size of the smallest possible gzip header
    pub const MIN_HEADER_LEN: usize = 10;
}

/// Object store client defaults
pub mod store {
    use super::Duration;

    /// Region used when neither config nor environment provide one
    pub const FALLBACK_REGION: &str = "us-east-1";

    /// Default timeout for a whole GetObject operation, body included
    pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(300);

    /// Default connection establishment timeout
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "s3lines.toml";

    /// Directory under the user config dir
    pub const APP_CONFIG_DIR: &str = "s3lines";

    /// File name inside the user config dir
    pub const USER_CONFIG_FILE: &str = "config.toml";
}

/// Logging constants
pub mod logging {
    /// Default log level when no flag or config value is given
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}

// Re-export commonly used constants for convenience
pub use names::S3_SCHEME;
pub use pipeline::{CHUNK_LINES, DEFAULT_CONCURRENCY, MAX_CONCURRENCY};
