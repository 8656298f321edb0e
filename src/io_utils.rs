use std::fmt;
use std::io;
use std::path::Path;

use crate::CleanerError;

#[derive(Debug)]
pub struct CliError {
    pub msg: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.msg.fmt(f)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Format a user friendly I/O error message with suggestions.
pub fn format_io_error(operation: &str, path: &Path, err: &io::Error) -> String {
    use io::ErrorKind::*;
    let suggestion = match err.kind() {
        NotFound => "Check that the file exists and the path is correct.",
        PermissionDenied => "Check permissions or run as a different user.",
        UnexpectedEof => "File appears truncated or corrupted.",
        WriteZero => "Disk may be full. Free up space and try again.",
        Other if err.raw_os_error() == Some(28) => "Disk may be full. Free up space and try again.",
        _ => "Check permissions or free up disk space.",
    };
    format!(
        "Error {} '{}': {}. {}",
        operation,
        path.display(),
        err,
        suggestion
    )
}

/// Convert an I/O error into a CLI error with context.
pub fn io_cli_error(operation: &str, path: &Path, err: io::Error) -> CliError {
    CliError {
        msg: format_io_error(operation, path, &err),
        source: Some(Box::new(err)),
    }
}

/// Simple CLI error from string.
pub fn simple_cli_error(msg: &str) -> CliError {
    CliError {
        msg: msg.to_string(),
        source: None,
    }
}

/// Convert a library error into a CLI error with a hint.
pub fn cleaner_cli_error(context: &str, err: CleanerError) -> CliError {
    CliError {
        msg: format!("{}: {}", context, cli_hint(&err)),
        source: Some(Box::new(err)),
    }
}

/// Return an actionable hint for an error variant.
pub fn cli_hint(err: &CleanerError) -> String {
    use CleanerError::*;
    match err {
        Decode { .. } | Malformed { .. } => {
            format!("{err}. The history file looks corrupted; it was left untouched.")
        }
        MissingFileName { .. } => format!("{err}. The history file was left untouched."),
        Pattern(e) => format!("{e}. Check the regular expression syntax."),
        Editor(msg) => format!("{msg}. Check that nvim is installed and on PATH, or pass --shada."),
        Selector(msg) => format!("{msg}. Check that fzf is installed and on PATH."),
        Config(msg) => format!("{msg}. Invalid configuration."),
        Io(io) => format!("{io}"),
        Commit { backup, staged, .. } => format!(
            "{err}. The original history is safe in '{}'. Move '{}' into place by hand to finish, \
             or rename the backup back to restore the previous state.",
            backup.display(),
            staged.display()
        ),
        Interrupted {
            marker,
            staged,
            original_present: true,
            ..
        } => format!(
            "{err}. The history file is still in place, so the filtered copy is out of date. \
             Delete '{}' and '{}', then run again.",
            staged.display(),
            marker.display()
        ),
        Interrupted {
            marker,
            backup,
            staged,
            original_present: false,
        } => format!(
            "{err}. The history file is missing. If '{}' exists, move it to the history path \
             to finish the previous run; otherwise restore '{}'. Remove '{}' afterwards.",
            staged.display(),
            backup.display(),
            marker.display()
        ),
    }
}
