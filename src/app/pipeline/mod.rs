//! Streaming pipeline orchestration
//!
//! Wires the stages together with bounded channels, runs them, and shuts them
//! down in order once the name source is exhausted.
//!
//! ```text
//! NameSource ─▶ [names] ─▶ Fetchers ─▶ [objects] ─▶ Scanners ─▶ [lines] ─▶ Writer ─▶ out
//!  (any stage) ─▶ [errors] ─▶ ErrorSink ─▶ err
//! ```
//!
//! Fetchers are async tasks; the name pump, scanners, writer and error sink
//! run on blocking threads. All four channels hold at most `N` messages, so a
//! slow stage stalls the one before it and memory stays bounded by the buffer
//! pool (`2N + 2` idle buffers) plus what the workers hold.
//!
//! # Shutdown
//!
//! A channel closes when its last sender is dropped, and receivers drain what
//! is queued before seeing the close. Each stage owns the senders for the next
//! channel, so the drain runs strictly in order: pump, fetchers, scanners,
//! writer, error sink. The orchestrator awaits each stage before the next.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use s3lines::app::{MemoryStore, NameSource, Pipeline, PipelineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new().with_object("bucket", "a.txt", "hello\n"));
//! let pipeline = Pipeline::new(PipelineConfig::default(), store)?;
//!
//! let report = pipeline
//!     .run(NameSource::fixed(["s3://bucket/a.txt"]), std::io::stdout(), std::io::stderr())
//!     .await;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod stats;

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::app::error_sink::ErrorSink;
use crate::app::fetcher::{FetchStats, Fetcher};
use crate::app::location::Resolver;
use crate::app::names::NameSource;
use crate::app::pool::BufferPool;
use crate::app::scanner::{ScanStats, Scanner};
use crate::app::store::ObjectStore;
use crate::app::writer::{OutputWriter, WriteStats};
use crate::constants::pipeline::pool_capacity;
use crate::errors::{ConfigResult, PipelineError};

pub use config::PipelineConfig;
pub use stats::PipelineReport;

/// The streaming pipeline
pub struct Pipeline {
    config: PipelineConfig,
    resolver: Arc<Resolver>,
    store: Arc<dyn ObjectStore>,
}

impl Pipeline {
    /// Create a pipeline reading from `store`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn new(config: PipelineConfig, store: Arc<dyn ObjectStore>) -> ConfigResult<Self> {
        config.validate()?;
        let resolver = Arc::new(config.resolver()?);
        Ok(Self {
            config,
            resolver,
            store,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stream every object named by `source` to `out`, reporting errors to `err`
    ///
    /// Runs until the source is exhausted and every stage has drained. Errors
    /// never stop the run; they are counted in the returned report.
    pub async fn run<W, E>(&self, source: NameSource, out: W, err: E) -> PipelineReport
    where
        W: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        let started = Instant::now();
        let concurrency = self.config.effective_concurrency(source.known_len());
        let pool = BufferPool::new(
            pool_capacity(concurrency),
            self.config.fresh_buffer_capacity,
        );
        info!(
            "Starting pipeline with {} fetchers, {} scanners, pool of {} buffers",
            concurrency,
            concurrency,
            pool.capacity()
        );

        let (names_tx, names_rx) = flume::bounded::<String>(concurrency);
        let (objects_tx, objects_rx) = flume::bounded(concurrency);
        let (lines_tx, lines_rx) = flume::bounded(concurrency);
        let (errors_tx, errors_rx) = flume::bounded::<PipelineError>(concurrency);

        let sink = tokio::task::spawn_blocking(move || ErrorSink::new(err, errors_rx).run());

        let writer = {
            let errors = errors_tx.clone();
            tokio::task::spawn_blocking(move || OutputWriter::new(out, lines_rx, errors).run())
        };

        let scanners: Vec<JoinHandle<ScanStats>> = (0..concurrency)
            .map(|id| {
                let scanner = Scanner::new(
                    id,
                    self.config.chunk_lines,
                    pool.clone(),
                    objects_rx.clone(),
                    lines_tx.clone(),
                    errors_tx.clone(),
                );
                tokio::task::spawn_blocking(move || scanner.run())
            })
            .collect();
        drop(objects_rx);
        drop(lines_tx);

        let fetchers: Vec<JoinHandle<FetchStats>> = (0..concurrency)
            .map(|id| {
                let fetcher = Fetcher::new(
                    id,
                    self.store.clone(),
                    self.resolver.clone(),
                    pool.clone(),
                    names_rx.clone(),
                    objects_tx.clone(),
                    errors_tx.clone(),
                );
                tokio::spawn(fetcher.run())
            })
            .collect();
        drop(names_rx);
        drop(objects_tx);

        let pump = {
            let errors = errors_tx.clone();
            tokio::task::spawn_blocking(move || pump_names(source, names_tx, errors))
        };

        let mut report = PipelineReport {
            concurrency,
            ..Default::default()
        };
        let mut panics = Vec::new();

        // 1. the pump closes the names channel when the source runs dry
        match pump.await {
            Ok(names) => report.names = names,
            Err(e) => panics.push(panicked("name source", 0, e)),
        }

        // 2. fetchers exit once names are drained; their exit closes the objects channel
        for (id, result) in join_all(fetchers).await.into_iter().enumerate() {
            match result {
                Ok(stats) => report.fetch.merge(&stats),
                Err(e) => panics.push(panicked("fetcher", id, e)),
            }
        }
        debug!("All fetchers stopped");

        // 3. scanners exit once objects are drained; their exit closes the lines channel
        for (id, result) in join_all(scanners).await.into_iter().enumerate() {
            match result {
                Ok(stats) => report.scan.merge(&stats),
                Err(e) => panics.push(panicked("scanner", id, e)),
            }
        }
        debug!("All scanners stopped");

        // 4. the writer exits once lines are drained
        match writer.await {
            Ok(stats) => report.write = stats,
            Err(e) => panics.push(panicked("writer", 0, e)),
        }

        // 5. dropping the last error sender lets the sink finish
        for panic in panics {
            let _ = errors_tx.send_async(panic).await;
        }
        drop(errors_tx);
        report.errors = match sink.await {
            Ok(count) => count,
            Err(e) => {
                warn!("Error sink panicked: {}", e);
                // every error is unaccounted for; make sure the run still fails
                1
            }
        };

        pool.close();
        report.pool = pool.stats();
        report.elapsed = started.elapsed();
        info!("Pipeline finished: {}", report.summary());
        report
    }
}

/// Forward non-empty names from `source` until it is exhausted. Blocking.
///
/// Bad names are reported and skipped. A failed read ends the source after
/// its error is reported. Returns the number of names forwarded.
fn pump_names(
    source: NameSource,
    names: flume::Sender<String>,
    errors: flume::Sender<PipelineError>,
) -> u64 {
    let mut forwarded = 0u64;
    for item in source {
        match item {
            Ok(name) if name.is_empty() => continue,
            Ok(name) => {
                if names.send(name).is_err() {
                    warn!("No fetchers left; dropping remaining names");
                    break;
                }
                forwarded += 1;
            }
            Err(e) => {
                debug!("Name source error: {}", e);
                let _ = errors.send(e);
            }
        }
    }
    debug!("Name source exhausted after {} names", forwarded);
    forwarded
}

fn panicked(stage: &'static str, worker_id: usize, error: JoinError) -> PipelineError {
    warn!("{} worker {} failed: {}", stage, worker_id, error);
    PipelineError::WorkerPanic { stage, worker_id }
}
