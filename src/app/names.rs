//! Sources of object names
//!
//! Names come either from the command line or, when none are given, one per
//! line from standard input. Empty names are passed through; the pipeline
//! filters them. A line that is not valid UTF-8 is an error for that name
//! only; reading carries on with the next line.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead};

use crate::errors::{NameError, PipelineError};

/// A source of object names
pub enum NameSource {
    /// A predetermined list, yielded in order
    FixedList(VecDeque<String>),
    /// Successive lines of a buffered reader, ending at EOF or the first read error
    LineStream(Box<dyn BufRead + Send>),
}

impl NameSource {
    /// Names from an explicit list
    pub fn fixed<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameSource::FixedList(names.into_iter().map(Into::into).collect())
    }

    /// Names read line by line from `reader`
    pub fn lines<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        NameSource::LineStream(Box::new(reader))
    }

    /// Names read line by line from standard input
    pub fn stdin() -> Self {
        Self::lines(io::BufReader::new(io::stdin()))
    }

    /// Number of names still to come, when known up front
    pub fn known_len(&self) -> Option<usize> {
        match self {
            NameSource::FixedList(names) => Some(names.len()),
            NameSource::LineStream(_) => None,
        }
    }

    fn next_line(reader: &mut dyn BufRead) -> Option<Result<String, PipelineError>> {
        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.ends_with(b"\n") {
                    line.pop();
                    if line.ends_with(b"\r") {
                        line.pop();
                    }
                }
                Some(String::from_utf8(line).map_err(|e| {
                    NameError::NotUtf8 {
                        name: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                    }
                    .into()
                }))
            }
            Err(e) => Some(Err(PipelineError::Source(e))),
        }
    }
}

impl Iterator for NameSource {
    type Item = Result<String, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            NameSource::FixedList(names) => names.pop_front().map(Ok),
            NameSource::LineStream(reader) => {
                let item = Self::next_line(reader.as_mut());
                if matches!(item, Some(Err(PipelineError::Source(_)))) {
                    // a failed reader yields its error once, then ends
                    *self = NameSource::FixedList(VecDeque::new());
                }
                item
            }
        }
    }
}

impl fmt::Debug for NameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameSource::FixedList(names) => f.debug_tuple("FixedList").field(names).finish(),
            NameSource::LineStream(_) => f.write_str("LineStream(..)"),
        }
    }
}
