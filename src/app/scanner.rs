//! Scan stage: downloaded objects in, line chunks out
//!
//! Scanners run on blocking threads since decompression and line splitting
//! are CPU bound. For each object a scanner decides whether the bytes are
//! gzip compressed, splits the (decoded) contents on `\n`, and batches lines
//! into pooled chunk buffers of at most `chunk_lines` lines each. Chunks of one
//! object are sent in source order.

use std::io::{BufRead, BufReader};

use flate2::bufread::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::fetcher::FetchedObject;
use crate::app::pool::{BufferPool, PooledBuf};
use crate::constants::gzip;
use crate::constants::names::{EXTENSION_SEPARATOR, PATH_SEPARATOR};
use crate::errors::{PipelineError, ScanError, ScanResult};

/// A batch of consecutive lines from a single object
#[derive(Debug)]
pub struct LineChunk {
    pub data: PooledBuf,
}

/// Per-scanner tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Objects scanned to the end
    pub objects: u64,
    /// Objects that were gzip decoded
    pub gzipped: u64,
    /// Chunks sent to the writer
    pub chunks: u64,
    /// Lines sent to the writer
    pub lines: u64,
    /// Objects abandoned on a decode or read error
    pub failures: u64,
}

impl ScanStats {
    pub fn merge(&mut self, other: &ScanStats) {
        self.objects += other.objects;
        self.gzipped += other.gzipped;
        self.chunks += other.chunks;
        self.lines += other.lines;
        self.failures += other.failures;
    }
}

/// Whether the final path segment of `name` has an extension
///
/// True when the last `.` comes after the last `/`.
pub fn has_extension(name: &str) -> bool {
    match name.rfind(EXTENSION_SEPARATOR) {
        Some(dot) => name
            .rfind(PATH_SEPARATOR)
            .map_or(true, |slash| dot > slash),
        None => false,
    }
}

/// Whether `data` starts like a gzip stream
pub fn has_gzip_magic(data: &[u8]) -> bool {
    data.len() >= gzip::MIN_HEADER_LEN && data.starts_with(&gzip::MAGIC)
}

/// Whether an object should be gzip decoded
///
/// Both the name must carry some extension and the data must start with the
/// gzip magic. Extensionless objects are never decoded, even with the magic.
pub fn is_gzipped(name: &str, data: &[u8]) -> bool {
    has_extension(name) && has_gzip_magic(data)
}

/// Open a line reader over an object's bytes, decoding gzip when detected
///
/// The first buffer of decoded data is read eagerly, so a malformed stream
/// fails here rather than on the first line. That read parses the gzip header
/// and inflates the start of the first deflate block, so corruption in either
/// is a `DecoderInit` error. Corruption further in surfaces as `Read`.
fn open_reader<'a>(name: &str, data: &'a [u8]) -> ScanResult<(Box<dyn BufRead + 'a>, bool)> {
    if !is_gzipped(name, data) {
        return Ok((Box::new(data), false));
    }

    let mut reader = BufReader::new(MultiGzDecoder::new(data));
    reader.fill_buf().map_err(|source| ScanError::DecoderInit {
        name: name.to_string(),
        source,
    })?;
    Ok((Box::new(reader), true))
}

/// A single scan worker
pub struct Scanner {
    id: usize,
    chunk_lines: usize,
    pool: BufferPool,
    objects: flume::Receiver<FetchedObject>,
    lines: flume::Sender<LineChunk>,
    errors: flume::Sender<PipelineError>,
    stats: ScanStats,
}

impl Scanner {
    pub fn new(
        id: usize,
        chunk_lines: usize,
        pool: BufferPool,
        objects: flume::Receiver<FetchedObject>,
        lines: flume::Sender<LineChunk>,
        errors: flume::Sender<PipelineError>,
    ) -> Self {
        Self {
            id,
            chunk_lines: chunk_lines.max(1),
            pool,
            objects,
            lines,
            errors,
            stats: ScanStats::default(),
        }
    }

    /// Scan until the objects channel is closed and drained. Blocking.
    pub fn run(mut self) -> ScanStats {
        debug!("Scanner {} starting", self.id);

        while let Ok(object) = self.objects.recv() {
            match self.scan(&object) {
                Ok(true) => self.stats.objects += 1,
                Ok(false) => break,
                Err(e) => {
                    self.stats.failures += 1;
                    debug!("Scanner {} error: {}", self.id, e);
                    let _ = self.errors.send(e.into());
                }
            }
            // `object` drops here, returning its buffer to the pool
        }

        info!(
            "Scanner {} done: {} objects, {} chunks, {} lines, {} failures",
            self.id, self.stats.objects, self.stats.chunks, self.stats.lines, self.stats.failures
        );
        self.stats
    }

    /// Split one object into chunks
    ///
    /// Returns `Ok(false)` if the writer has gone away.
    fn scan(&mut self, object: &FetchedObject) -> ScanResult<bool> {
        let (mut reader, gzipped) = open_reader(&object.name, &object.data)?;
        if gzipped {
            self.stats.gzipped += 1;
        }

        let mut chunk = self.pool.acquire();
        let mut line_count = 0usize;
        loop {
            let read = reader
                .read_until(b'\n', &mut chunk)
                .map_err(|source| ScanError::Read {
                    name: object.name.clone(),
                    source,
                })?;
            if read == 0 {
                break;
            }

            line_count += 1;
            if line_count % self.chunk_lines == 0 {
                let full = std::mem::replace(&mut chunk, self.pool.acquire());
                if !self.emit(full, self.chunk_lines) {
                    return Ok(false);
                }
            }
        }

        let remainder = line_count % self.chunk_lines;
        if remainder != 0 && !self.emit(chunk, remainder) {
            return Ok(false);
        }

        debug!(
            "Scanner {} finished {} ({} lines{})",
            self.id,
            object.name,
            line_count,
            if gzipped { ", gzip" } else { "" }
        );
        Ok(true)
    }

    fn emit(&mut self, data: PooledBuf, lines: usize) -> bool {
        if self.lines.send(LineChunk { data }).is_err() {
            return false;
        }
        self.stats.chunks += 1;
        self.stats.lines += lines as u64;
        true
    }
}
