//! s3lines CLI application
//!
//! Streams the lines of many S3 objects to standard output, decompressing
//! gzip objects on the fly. Diagnostics and logs go to standard error.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use s3lines::cli::{handle_stream, Cli};
use s3lines::config::{AppConfig, LoggingConfig};
use s3lines::errors::Result;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(0) => {}
        Ok(errors) => {
            eprintln!("{} errors.", errors);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Main application logic; returns the number of errors during the run
async fn run() -> Result<u64> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config.logging);
    info!("s3lines v{} starting", env!("CARGO_PKG_VERSION"));

    let report = handle_stream(&cli, config).await?;
    Ok(report.errors)
}

/// Initialize logging to standard error; stdout carries only object data
fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| logging.level.clone());

    // Create environment filter; RUST_LOG directives for other targets still apply
    let mut filter = EnvFilter::from_default_env();
    match format!("s3lines={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(_) => eprintln!("Ignoring invalid log level '{}'", level),
    }

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
