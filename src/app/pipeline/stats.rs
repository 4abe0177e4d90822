//! Pipeline run statistics
//!
//! Every stage returns its own tallies from its task; the orchestrator folds
//! them into a single report once the pipeline has drained.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::fetcher::FetchStats;
use crate::app::pool::PoolStats;
use crate::app::scanner::ScanStats;
use crate::app::writer::WriteStats;

/// Final result of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Number of fetchers (and of scanners) that ran
    pub concurrency: usize,
    /// Non-empty names forwarded to the fetchers
    pub names: u64,
    /// Aggregated fetcher statistics
    pub fetch: FetchStats,
    /// Aggregated scanner statistics
    pub scan: ScanStats,
    /// Writer statistics
    pub write: WriteStats,
    /// Errors reported by the error sink
    pub errors: u64,
    /// Buffer pool counters at shutdown
    pub pool: PoolStats,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl PipelineReport {
    /// Whether the run finished without a single reported error
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    /// Output throughput in bytes per second
    pub fn output_rate_bps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.write.bytes as f64 / secs
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} names, {} objects ({} gzip), {} lines, {} bytes out in {:.2}s with {} workers, {} errors",
            self.names,
            self.fetch.objects,
            self.scan.gzipped,
            self.scan.lines,
            self.write.bytes,
            self.elapsed.as_secs_f64(),
            self.concurrency,
            self.errors
        )
    }
}
