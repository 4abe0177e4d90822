//! Command-line argument parsing for s3lines
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::app::NameSource;
use crate::config::AppConfig;

/// s3lines - Stream the lines of S3 objects to standard output
#[derive(Parser, Debug)]
#[command(
    name = "s3lines",
    version,
    about = "Stream the lines of many S3 objects to standard output",
    long_about = "Fetches S3 objects concurrently and writes their lines to standard output.
Gzip-compressed objects are decompressed transparently. Lines of different objects
may interleave in chunks of whole lines; lines of one object keep their order.

Object names are taken from the arguments, or read one per line from standard input
when none are given. Names are either s3://bucket/key URLs or keys relative to --prefix."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Number of concurrent object reads [default: 4]
    #[arg(short = 'c', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Default S3 prefix to read relative keys from (s3://bucket[/prefix])
    #[arg(short = 'p', long, value_name = "URL")]
    pub prefix: Option<String>,

    /// Lines per output chunk [default: 1000]
    #[arg(long, value_name = "LINES")]
    pub chunk_lines: Option<usize>,

    /// AWS region (overrides environment and config)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint URL, for S3-compatible services
    #[arg(long, value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long)]
    pub path_style: bool,

    /// Print run statistics as JSON to standard error when done
    #[arg(long)]
    pub stats: bool,

    /// Object names; read from standard input when omitted
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,
}

/// Arguments controlling logging and configuration
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long)]
    pub very_verbose: bool,

    /// Quiet mode - only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level requested by flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }

    /// Apply command-line overrides on top of loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(concurrency) = self.concurrency {
            config.pipeline.concurrency = concurrency;
        }
        if let Some(prefix) = &self.prefix {
            config.pipeline.default_prefix = Some(prefix.clone());
        }
        if let Some(chunk_lines) = self.chunk_lines {
            config.pipeline.chunk_lines = chunk_lines;
        }
        if let Some(region) = &self.region {
            config.store.region = Some(region.clone());
        }
        if let Some(endpoint) = &self.endpoint_url {
            config.store.endpoint_url = Some(endpoint.clone());
        }
        if self.path_style {
            config.store.force_path_style = true;
        }
    }

    /// Where object names come from: the arguments, or standard input
    pub fn name_source(&self) -> NameSource {
        if self.names.is_empty() {
            NameSource::stdin()
        } else {
            NameSource::fixed(self.names.iter().cloned())
        }
    }
}
