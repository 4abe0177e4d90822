//! Configuration for the streaming pipeline

use serde::{Deserialize, Serialize};

use crate::app::location::Resolver;
use crate::constants::pipeline;
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for the streaming pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Requested number of fetchers (and of scanners)
    pub concurrency: usize,
    /// Lines per output chunk
    pub chunk_lines: usize,
    /// Capacity of buffers allocated when the pool is empty
    pub fresh_buffer_capacity: usize,
    /// Default `s3://bucket[/prefix]` for relative object names
    pub default_prefix: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: pipeline::DEFAULT_CONCURRENCY,
            chunk_lines: pipeline::CHUNK_LINES,
            fresh_buffer_capacity: pipeline::FRESH_BUFFER_CAPACITY,
            default_prefix: None,
        }
    }
}

impl PipelineConfig {
    /// Set the requested concurrency
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the number of lines per chunk
    pub fn with_chunk_lines(mut self, chunk_lines: usize) -> Self {
        self.chunk_lines = chunk_lines;
        self
    }

    /// Set the default prefix for relative names
    pub fn with_default_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_prefix = Some(prefix.into());
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 {
            return Err(ConfigError::invalid(
                "concurrency",
                self.concurrency,
                "Concurrency must be greater than 0",
            ));
        }

        if self.chunk_lines == 0 {
            return Err(ConfigError::invalid(
                "chunk_lines",
                self.chunk_lines,
                "Chunks must hold at least one line",
            ));
        }

        if self.fresh_buffer_capacity == 0 {
            return Err(ConfigError::invalid(
                "fresh_buffer_capacity",
                self.fresh_buffer_capacity,
                "Buffer capacity must be greater than 0",
            ));
        }

        self.resolver().map(|_| ())
    }

    /// Build the name resolver for the configured default prefix
    pub fn resolver(&self) -> ConfigResult<Resolver> {
        Resolver::from_prefix_url(self.default_prefix.as_deref()).map_err(|e| {
            ConfigError::invalid(
                "default_prefix",
                self.default_prefix.as_deref().unwrap_or_default(),
                format!("Expected s3://bucket[/prefix] ({})", e),
            )
        })
    }

    /// Number of fetchers and scanners to run
    ///
    /// A known list of names raises the worker count to the list length. The
    /// result always lies in `[MIN_CONCURRENCY, MAX_CONCURRENCY]`.
    pub fn effective_concurrency(&self, known_names: Option<usize>) -> usize {
        let requested = match known_names {
            Some(names) => self.concurrency.max(names),
            None => self.concurrency,
        };
        requested.clamp(pipeline::MIN_CONCURRENCY, pipeline::MAX_CONCURRENCY)
    }
}
