use std::io::{self, Write};

use tracing::warn;

use crate::record::{kind_name, Record};

/// Result of handing one record to [`write_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoded {
    /// The record's bytes were written to the output.
    Written,
    /// A field could not be encoded; nothing was written.
    Skipped,
}

/// Write one record to `out`.
///
/// Decoded records are written back from the bytes captured when they were
/// read, so the output matches the input exactly. Records built in memory are
/// encoded field by field into a scratch buffer first. If any field fails, the
/// whole record is left out and a warning is logged; a partial record is never
/// written. Errors from `out` itself are returned.
///
/// Only records made with [`Record::new`] can reach [`Encoded::Skipped`]:
/// decoded records always carry their captured bytes.
pub fn write_record<W: Write>(out: &mut W, record: &Record) -> io::Result<Encoded> {
    if let Some(raw) = record.raw() {
        out.write_all(raw)?;
        return Ok(Encoded::Written);
    }

    let mut chunk = Vec::new();
    let [kind, timestamp, length] = record.header_values();
    for field in [&kind, &timestamp, &length, record.payload()] {
        if let Err(err) = rmpv::encode::write_value(&mut chunk, field) {
            warn!(
                kind = record.kind(),
                kind_name = kind_name(record.kind()),
                timestamp = record.timestamp(),
                error = %err,
                "skipped a record that could not be encoded"
            );
            return Ok(Encoded::Skipped);
        }
    }
    out.write_all(&chunk)?;
    Ok(Encoded::Written)
}
