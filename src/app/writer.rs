//! Output stage: the single writer of standard output
//!
//! Chunks arrive from any scanner in any order and are written whole, so the
//! lines of one chunk are never interleaved with another's.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::scanner::LineChunk;
use crate::errors::PipelineError;

/// Writer tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteStats {
    /// Chunks written in full
    pub chunks: u64,
    /// Bytes written, including appended newlines
    pub bytes: u64,
    /// Chunks lost to write errors
    pub failures: u64,
}

/// Write all of `data`, reissuing the unwritten suffix after short writes
///
/// `Interrupted` errors are retried; a write of zero bytes is an error.
pub fn write_fully<W: Write + ?Sized>(out: &mut W, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        match out.write(data) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "output accepted no bytes",
                ))
            }
            Ok(n) => data = &data[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// The output worker
pub struct OutputWriter<W> {
    out: W,
    lines: flume::Receiver<LineChunk>,
    errors: flume::Sender<PipelineError>,
    stats: WriteStats,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(
        out: W,
        lines: flume::Receiver<LineChunk>,
        errors: flume::Sender<PipelineError>,
    ) -> Self {
        Self {
            out,
            lines,
            errors,
            stats: WriteStats::default(),
        }
    }

    /// Write chunks until the lines channel is closed and drained. Blocking.
    pub fn run(mut self) -> WriteStats {
        debug!("Writer starting");

        while let Ok(mut chunk) = self.lines.recv() {
            if chunk.data.last().is_some_and(|b| *b != b'\n') {
                chunk.data.push(b'\n');
            }

            match write_fully(&mut self.out, &chunk.data) {
                Ok(()) => {
                    self.stats.chunks += 1;
                    self.stats.bytes += chunk.data.len() as u64;
                }
                Err(e) => {
                    self.stats.failures += 1;
                    self.publish(PipelineError::Write(e));
                }
            }
            // `chunk` drops here, returning its buffer to the pool
        }

        if let Err(e) = self.out.flush() {
            self.stats.failures += 1;
            self.publish(PipelineError::Write(e));
        }

        info!(
            "Writer done: {} chunks, {} bytes, {} failures",
            self.stats.chunks, self.stats.bytes, self.stats.failures
        );
        self.stats
    }

    fn publish(&self, error: PipelineError) {
        debug!("Writer error: {}", error);
        let _ = self.errors.send(error);
    }
}
