//! Remove entries from Neovim's `v:oldfiles` by rewriting its ShaDa file.
//!
//! The ShaDa file is streamed record by record through a [`PredicateSet`];
//! history records whose file name matches are dropped, everything else is
//! copied byte for byte into a [`StagedHistory`] that is then committed in
//! place of the original, keeping the previous file as `<name>.old`.

pub mod config;
pub mod decoder;
pub mod editor;
pub mod encoder;
mod error;
pub mod filter;
pub mod io_utils;
pub mod predicate;
pub mod record;
pub mod replace;

pub use config::Config;
pub use decoder::RecordReader;
pub use editor::SortOrder;
pub use encoder::{write_record, Encoded};
pub use error::CleanerError;
pub use filter::{
    filter, filter_with_summary, stage_filtered, stage_filtered_from, FilterSummary, RemovedSet,
};
pub use predicate::{Predicate, PredicateSet};
pub use record::{Record, HISTORY_KINDS};
pub use replace::{backup_path, detect_interrupted, marker_path, Committed, StagedHistory};
