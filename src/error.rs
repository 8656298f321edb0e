use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    /// The codec rejected a value inside a record group.
    #[error("decode error in record {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: rmpv::decode::Error,
    },

    /// A record group decoded, but its header fields have the wrong shape.
    #[error("malformed record {index}: {reason}")]
    Malformed { index: usize, reason: String },

    /// A history-affecting record without a file name in its payload.
    #[error("record {index} (kind {kind}) has no file name")]
    MissingFileName { index: usize, kind: u64 },

    /// Invalid user supplied regular expression.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The host editor could not be run or reported failure.
    #[error("editor error: {0}")]
    Editor(String),

    /// The fuzzy selector could not be run or reported failure.
    #[error("selector error: {0}")]
    Selector(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Installing the filtered file failed after the original was backed up.
    #[error(
        "failed to install filtered history (backup kept at '{}', filtered copy at '{}'): {source}",
        .backup.display(),
        .staged.display()
    )]
    Commit {
        backup: PathBuf,
        staged: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A previous run stopped between backup and install.
    #[error(
        "previous run was interrupted (marker '{}', backup '{}', filtered copy '{}')",
        .marker.display(),
        .backup.display(),
        .staged.display()
    )]
    Interrupted {
        marker: PathBuf,
        backup: PathBuf,
        staged: PathBuf,
        /// The history file is still in place, so the staged copy is stale.
        original_present: bool,
    },
}
