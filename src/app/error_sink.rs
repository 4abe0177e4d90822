//! Error reporting stage
//!
//! Drains the error channel, prints one line per error and counts them. The
//! final count decides the process exit status.

use std::io::Write;

use tracing::{debug, warn};

use crate::errors::PipelineError;

/// The error reporting worker
pub struct ErrorSink<E> {
    out: E,
    errors: flume::Receiver<PipelineError>,
}

impl<E: Write> ErrorSink<E> {
    pub fn new(out: E, errors: flume::Receiver<PipelineError>) -> Self {
        Self { out, errors }
    }

    /// Report errors until every producer has gone. Blocking.
    ///
    /// Returns the number of errors received.
    pub fn run(mut self) -> u64 {
        let mut count = 0u64;
        while let Ok(error) = self.errors.recv() {
            count += 1;
            debug!(stage = error.stage(), "pipeline error #{}", count);
            if let Err(e) = writeln!(self.out, "{}", error) {
                // stderr itself is failing; the count still decides the exit status
                warn!("Failed to report error '{}': {}", error, e);
            }
        }
        let _ = self.out.flush();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NameError;

    #[test]
    fn test_prints_one_line_per_error_and_counts() {
        let (errors_tx, errors_rx) = flume::unbounded();
        errors_tx.send(NameError::Empty.into()).unwrap();
        errors_tx
            .send(
                NameError::MissingBucket {
                    name: "s3:///x".to_string(),
                }
                .into(),
            )
            .unwrap();
        drop(errors_tx);

        let mut out = Vec::new();
        let count = ErrorSink::new(&mut out, errors_rx).run();

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "empty object name\nmissing bucket in S3 URL: 's3:///x'\n"
        );
    }

    #[test]
    fn test_no_errors_counts_zero() {
        let (errors_tx, errors_rx) = flume::unbounded::<PipelineError>();
        drop(errors_tx);
        let count = ErrorSink::new(Vec::new(), errors_rx).run();
        assert_eq!(count, 0);
    }
}
