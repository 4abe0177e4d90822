//! Error types for s3lines
//!
//! Errors raised inside the pipeline are published on the error channel and
//! counted; they never stop the pipeline. Only configuration errors abort the
//! process before streaming starts.

use std::path::PathBuf;

use thiserror::Error;

/// Object name parsing and resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name was the empty string
    #[error("empty object name")]
    Empty,

    /// An `s3://` name with nothing, or a slash, where the bucket should be
    #[error("missing bucket in S3 URL: '{name}'")]
    MissingBucket { name: String },

    /// A bucket-only URL, which names no object
    #[error("missing object key: '{name}'")]
    MissingKey { name: String },

    /// An input line that is not valid UTF-8, shown with replacement characters
    #[error("object name is not valid UTF-8: '{name}'")]
    NotUtf8 { name: String },

    /// A relative name with no default bucket to resolve against
    #[error("no default bucket for relative object name: '{name}' (use -p s3://bucket)")]
    NoDefaultBucket { name: String },
}

/// Object store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The request for the object failed
    #[error("failed to get {location}: {message}")]
    Request { location: String, message: String },

    /// The object body could not be read to the end
    #[error("failed to read body of {location}: {message}")]
    Body { location: String, message: String },

    /// The object does not exist
    #[error("object not found: {location}")]
    NotFound { location: String },
}

/// Decompression and line scanning errors
#[derive(Error, Debug)]
pub enum ScanError {
    /// The gzip header or the start of the first block could not be decoded
    #[error("{name}: invalid gzip stream: {source}")]
    DecoderInit {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading lines failed part way through the object
    #[error("{name}: read failed: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format in {path}: {source}")]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: '{value}'. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid-value error
    pub fn invalid(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors published on the pipeline's error channel
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Name parse or resolution error
    #[error(transparent)]
    Name(#[from] NameError),

    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] StoreError),

    /// Decompression or scan error
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Writing a chunk to the output failed
    #[error("write to output failed: {0}")]
    Write(#[source] std::io::Error),

    /// Reading names from the input failed
    #[error("reading object names failed: {0}")]
    Source(#[source] std::io::Error),

    /// A pipeline worker panicked
    #[error("{stage} worker {worker_id} panicked")]
    WorkerPanic {
        stage: &'static str,
        worker_id: usize,
    },
}

impl PipelineError {
    /// Stage that raised the error, for logging and metrics
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Name(_) | PipelineError::Fetch(_) => "fetch",
            PipelineError::Scan(_) => "scan",
            PipelineError::Write(_) => "write",
            PipelineError::Source(_) => "source",
            PipelineError::WorkerPanic { stage, .. } => stage,
        }
    }
}

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Name resolution result type alias
pub type NameResult<T> = std::result::Result<T, NameError>;

/// Object store result type alias
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Scan result type alias
pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
