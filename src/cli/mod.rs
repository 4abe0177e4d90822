//! Command-line interface components
//!
//! This module contains CLI-specific code for s3lines: argument parsing and
//! the handler that runs the pipeline against the process's standard streams.

pub mod args;
pub mod commands;

pub use args::{Cli, GlobalArgs};
pub use commands::handle_stream;
