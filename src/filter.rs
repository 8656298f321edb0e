//! Single pass ShaDa filter.
//!
//! Records are read one at a time, checked against a [`PredicateSet`] when
//! they carry a file name, and either written through unchanged or left out.
//! Nothing is buffered beyond the record being processed.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::decoder::RecordReader;
use crate::encoder::{write_record, Encoded};
use crate::predicate::PredicateSet;
use crate::replace::StagedHistory;
use crate::CleanerError;

/// Distinct file names removed during one pass, in byte order.
pub type RemovedSet = BTreeSet<Vec<u8>>;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterSummary {
    pub removed: RemovedSet,
    /// Records written to the output.
    pub kept: usize,
    /// Records left out because a predicate matched.
    pub removed_records: usize,
    /// Records left out because they could not be encoded.
    pub skipped: usize,
}

/// Copy `input` to `output`, dropping history records whose file name matches
/// `predicates`, and return the set of names removed.
pub fn filter<R, W>(input: R, output: &mut W, predicates: &PredicateSet) -> Result<RemovedSet, CleanerError>
where
    R: Read,
    W: Write,
{
    filter_with_summary(input, output, predicates).map(|s| s.removed)
}

/// Same as [`filter`], also counting what happened to each record.
pub fn filter_with_summary<R, W>(
    input: R,
    output: &mut W,
    predicates: &PredicateSet,
) -> Result<FilterSummary, CleanerError>
where
    R: Read,
    W: Write,
{
    let mut summary = FilterSummary::default();
    let mut reader = RecordReader::new(input);

    while let Some(record) = reader.next() {
        let record = record?;
        if record.is_history_affecting() {
            let index = reader.records_read() - 1;
            let name = record.file_name().ok_or(CleanerError::MissingFileName {
                index,
                kind: record.kind(),
            })?;
            if predicates.matches(name) {
                if !summary.removed.contains(name) {
                    summary.removed.insert(name.to_vec());
                }
                summary.removed_records += 1;
                continue;
            }
        }
        match write_record(output, &record)? {
            Encoded::Written => summary.kept += 1,
            Encoded::Skipped => summary.skipped += 1,
        }
    }
    output.flush()?;

    debug!(
        kept = summary.kept,
        removed_records = summary.removed_records,
        removed_files = summary.removed.len(),
        skipped = summary.skipped,
        "filter pass complete"
    );
    Ok(summary)
}

/// Filter the history file at `original` into a new [`StagedHistory`] beside
/// it. The original is only read. On error the staged file is deleted.
pub fn stage_filtered(
    original: &Path,
    predicates: &PredicateSet,
) -> Result<(StagedHistory, FilterSummary), CleanerError> {
    stage_filtered_from(File::open(original)?, original, predicates)
}

/// [`stage_filtered`] over a history file the caller already opened.
pub fn stage_filtered_from(
    input: File,
    original: &Path,
    predicates: &PredicateSet,
) -> Result<(StagedHistory, FilterSummary), CleanerError> {
    let mut staged = StagedHistory::create(original)?;
    let summary = {
        let mut out = BufWriter::new(staged.file_mut());
        filter_with_summary(input, &mut out, predicates)?
    };
    Ok((staged, summary))
}
