//! Streaming ShaDa entry decoder.
//!
//! [`RecordReader`] pulls MessagePack values four at a time and yields typed
//! [`Record`]s. Running out of input anywhere inside a group ends the stream
//! quietly, since Neovim may leave a partially written final entry behind.
//! Every other codec failure is fatal and stops iteration.

use std::io::{self, BufReader, Read};

use rmpv::Value;
use tracing::debug;

use crate::record::Record;
use crate::CleanerError;

/// Values per ShaDa entry.
pub const VALUES_PER_RECORD: usize = 4;

/// Reader adapter remembering every byte handed to the codec.
struct Capture<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: Read> Read for Capture<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(out)?;
        self.buf.extend_from_slice(&out[..n]);
        Ok(n)
    }
}

/// Lazy, non-restartable sequence of records over a byte stream.
pub struct RecordReader<R> {
    source: Capture<BufReader<R>>,
    index: usize,
    finished: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            source: Capture {
                inner: BufReader::new(input),
                buf: Vec::new(),
            },
            index: 0,
            finished: false,
        }
    }

    /// Number of complete records produced so far.
    pub fn records_read(&self) -> usize {
        self.index
    }

    fn read_group(&mut self) -> Result<Option<Record>, CleanerError> {
        self.source.buf.clear();
        let mut values = Vec::with_capacity(VALUES_PER_RECORD);
        while values.len() < VALUES_PER_RECORD {
            match rmpv::decode::read_value(&mut self.source) {
                Ok(value) => values.push(value),
                Err(err) if is_end_of_input(&err) => {
                    if !values.is_empty() || !self.source.buf.is_empty() {
                        debug!(
                            record = self.index,
                            values = values.len(),
                            bytes = self.source.buf.len(),
                            "discarding truncated trailing record"
                        );
                    }
                    return Ok(None);
                }
                Err(source) => {
                    return Err(CleanerError::Decode {
                        index: self.index,
                        source,
                    })
                }
            }
        }

        let payload = values.pop().unwrap_or(Value::Nil);
        let kind = header_field(&values[0], "kind", self.index)?;
        let timestamp = header_field(&values[1], "timestamp", self.index)?;
        let length = header_field(&values[2], "length", self.index)?;
        let raw = std::mem::take(&mut self.source.buf);
        self.index += 1;
        Ok(Some(Record::decoded(kind, timestamp, length, payload, raw)))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record, CleanerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_group() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

fn header_field(value: &Value, name: &str, index: usize) -> Result<u64, CleanerError> {
    value.as_u64().ok_or_else(|| CleanerError::Malformed {
        index,
        reason: format!("{name} is not an unsigned integer: {value}"),
    })
}

fn is_end_of_input(err: &rmpv::decode::Error) -> bool {
    match err {
        rmpv::decode::Error::InvalidMarkerRead(e) | rmpv::decode::Error::InvalidDataRead(e) => {
            e.kind() == io::ErrorKind::UnexpectedEof
        }
        _ => false,
    }
}
