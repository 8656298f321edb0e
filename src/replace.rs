//! Crash-safe installation of a filtered history file.
//!
//! The filtered stream is written to a [`StagedHistory`] next to the original.
//! Dropping or [abandoning](StagedHistory::abandon) it deletes the staged
//! file and leaves the original untouched. [`StagedHistory::commit`] moves the
//! original to `<name>.old` and then moves the staged file into its place.
//!
//! The two renames are atomic individually, not as a pair. While they run, a
//! `<name>.install-pending` marker records where both files are, so a run cut
//! short between them is detected by [`detect_interrupted`] instead of being
//! guessed from file names.

use std::fs::{self, File, Permissions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::{NamedTempFile, PersistError};
use tracing::{info, warn};

use crate::CleanerError;

pub const BACKUP_SUFFIX: &str = ".old";
pub const MARKER_SUFFIX: &str = ".install-pending";
const STAGED_PREFIX: &str = ".oldfiles-cleaner.";

/// `<original>.old`
pub fn backup_path(original: &Path) -> PathBuf {
    with_suffix(original, BACKUP_SUFFIX)
}

/// `<original>.install-pending`
pub fn marker_path(original: &Path) -> PathBuf {
    with_suffix(original, MARKER_SUFFIX)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Contents of the install-pending marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInstall {
    pub backup: PathBuf,
    pub staged: PathBuf,
}

/// A run that stopped after writing the marker and before removing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interrupted {
    pub marker: PathBuf,
    pub pending: PendingInstall,
    /// Whether the original is still in place, i.e. the backup rename never
    /// happened.
    pub original_present: bool,
}

impl From<Interrupted> for CleanerError {
    fn from(state: Interrupted) -> Self {
        CleanerError::Interrupted {
            marker: state.marker,
            backup: state.pending.backup,
            staged: state.pending.staged,
            original_present: state.original_present,
        }
    }
}

/// Look for evidence of an interrupted commit of `original`.
///
/// A marker whose staged file no longer exists is stale (the install went
/// through but the marker could not be removed) and is cleaned up here.
pub fn detect_interrupted(original: &Path) -> Result<Option<Interrupted>, CleanerError> {
    let marker = marker_path(original);
    let data = match fs::read(&marker) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let pending: PendingInstall = serde_json::from_slice(&data).map_err(|e| {
        CleanerError::Config(format!(
            "unreadable install marker '{}': {e}",
            marker.display()
        ))
    })?;
    if !pending.staged.exists() && original.exists() {
        info!(marker = %marker.display(), "removing stale install marker");
        fs::remove_file(&marker)?;
        return Ok(None);
    }
    Ok(Some(Interrupted {
        marker,
        original_present: original.exists(),
        pending,
    }))
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub target: PathBuf,
    pub backup: PathBuf,
}

/// Filtered history waiting to be committed or abandoned.
#[derive(Debug)]
pub struct StagedHistory {
    target: PathBuf,
    file: NamedTempFile,
}

impl StagedHistory {
    /// Create an empty staged file beside `target`, with the same permission
    /// bits as `target` from the moment it exists.
    pub fn create(target: &Path) -> Result<Self, CleanerError> {
        let perms = permission_bits(fs::metadata(target)?.permissions());
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let file = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .permissions(perms.clone())
            .tempfile_in(dir)?;
        // umask may have narrowed the creation mode
        fs::set_permissions(file.path(), perms)?;
        Ok(Self {
            target: target.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    /// Delete the staged file. The original is not touched.
    pub fn abandon(self) -> Result<(), CleanerError> {
        self.file.close()?;
        Ok(())
    }

    /// Back up the original and install the staged file in its place.
    ///
    /// Any failure before the backup rename deletes the staged file. Once the
    /// backup exists, failures keep both the backup and the staged file on
    /// disk and are reported as [`CleanerError::Commit`].
    pub fn commit(mut self) -> Result<Committed, CleanerError> {
        self.file.as_file_mut().flush()?;
        self.file.as_file().sync_all()?;

        let backup = backup_path(&self.target);
        let marker = marker_path(&self.target);
        let pending = PendingInstall {
            backup: backup.clone(),
            staged: self.file.path().to_path_buf(),
        };
        if let Err(err) = write_marker(&marker, &pending) {
            let _ = fs::remove_file(&marker);
            return Err(err);
        }

        if let Err(err) = fs::rename(&self.target, &backup) {
            let _ = fs::remove_file(&marker);
            return Err(err.into());
        }
        info!(backup = %backup.display(), "original history backed up");

        if let Err(err) = self.file.persist(&self.target) {
            return Err(keep_staged(err, backup));
        }
        info!(path = %self.target.display(), "filtered history installed");

        if let Err(err) = fs::remove_file(&marker) {
            warn!(marker = %marker.display(), error = %err, "could not remove install marker");
        }
        Ok(Committed {
            target: self.target,
            backup,
        })
    }
}

/// The install failed after the backup: leave the staged file on disk.
fn keep_staged(err: PersistError, backup: PathBuf) -> CleanerError {
    let staged = err.file.path().to_path_buf();
    if let Err(keep) = err.file.keep() {
        warn!(staged = %staged.display(), error = %keep, "could not detach staged file");
    }
    CleanerError::Commit {
        backup,
        staged,
        source: err.error,
    }
}

fn write_marker(marker: &Path, pending: &PendingInstall) -> Result<(), CleanerError> {
    let data = serde_json::to_vec_pretty(pending)
        .map_err(|e| CleanerError::Config(format!("cannot record install marker: {e}")))?;
    let mut file = File::create(marker)?;
    file.write_all(&data)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(unix)]
fn permission_bits(perms: Permissions) -> Permissions {
    use std::os::unix::fs::PermissionsExt;
    Permissions::from_mode(perms.mode() & 0o7777)
}

#[cfg(not(unix))]
fn permission_bits(perms: Permissions) -> Permissions {
    perms
}
