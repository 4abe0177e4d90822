//! Command handler for the streaming run
//!
//! Turns parsed arguments and loaded configuration into a running pipeline
//! writing to the process's standard output and standard error.

use std::sync::Arc;

use tracing::{debug, info};

use crate::app::{Pipeline, PipelineReport, S3Store};
use crate::cli::args::Cli;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Stream every named object to standard output
///
/// Startup problems (bad configuration, an unusable prefix) are returned as
/// errors before anything is fetched. Failures during the run never abort it;
/// they are printed to standard error and counted in the returned report.
pub async fn handle_stream(cli: &Cli, mut config: AppConfig) -> Result<PipelineReport> {
    cli.apply_overrides(&mut config);
    debug!("Effective configuration: {:?}", config);

    let store = Arc::new(S3Store::new(&config.store).await);
    let pipeline = Pipeline::new(config.pipeline, store)?;

    let source = cli.name_source();
    match source.known_len() {
        Some(count) => info!("Streaming {} named objects", count),
        None => info!("Streaming objects named on standard input"),
    }

    let report = pipeline
        .run(source, std::io::stdout(), std::io::stderr())
        .await;

    if cli.stats {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| AppError::generic(format!("failed to encode statistics: {}", e)))?;
        eprintln!("{}", json);
    }

    Ok(report)
}
