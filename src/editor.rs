//! Neovim and fzf invocations.
//!
//! Neovim is run headless (`-Es`) and asked to print either its state
//! directory or its `v:oldfiles` list. fzf receives the list on stdin and
//! prints the chosen lines.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use clap::ValueEnum;
use tracing::debug;

use crate::config::Config;
use crate::CleanerError;

/// History file location relative to Neovim's state directory.
pub const SHADA_RELATIVE: &str = "shada/main.shada";

const PRINT_STATE_DIR: &str = r#"lua io.stdout:write(vim.fn.stdpath("state"))"#;
const PRINT_OLDFILES: &str = r#"lua io.stdout:write(vim.fn.join(vim.v.oldfiles, "\n") .. "\n")"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortOrder {
    /// Most recent first, as Neovim keeps them.
    #[default]
    Recent,
    /// Byte-wise ascending.
    Name,
}

pub fn sort_paths(paths: &mut [Vec<u8>], order: SortOrder) {
    match order {
        SortOrder::Recent => {}
        SortOrder::Name => paths.sort(),
    }
}

/// Location of the history file: the configured path, or
/// `<stdpath("state")>/shada/main.shada` as reported by Neovim.
pub fn shada_path(cfg: &Config) -> Result<PathBuf, CleanerError> {
    if let Some(path) = &cfg.shada {
        return Ok(path.clone());
    }
    let stdout = run_nvim(cfg, &["-Es", "-c", PRINT_STATE_DIR])?;
    let dir = trim_end(&stdout);
    if dir.is_empty() {
        return Err(CleanerError::Editor(
            "nvim did not report a state directory".into(),
        ));
    }
    let path = bytes_to_path(dir).join(SHADA_RELATIVE);
    debug!(path = %path.display(), "located history file");
    Ok(path)
}

/// Neovim's `v:oldfiles` as seen when reading `shada`.
pub fn oldfiles(cfg: &Config, shada: &Path) -> Result<Vec<Vec<u8>>, CleanerError> {
    let mut cmd = Command::new(&cfg.nvim);
    cmd.args(["-Es", "-c", PRINT_OLDFILES, "-i"]).arg(shada);
    let stdout = capture(cmd, &cfg.nvim.to_string_lossy())?;
    Ok(split_lines(&stdout))
}

/// Let the user pick entries from `candidates` with `fzf -m`.
///
/// Cancelling fzf or matching nothing gives an empty selection.
pub fn select_with_fzf(cfg: &Config, candidates: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, CleanerError> {
    let name = cfg.fzf.to_string_lossy().into_owned();
    let mut child = Command::new(&cfg.fzf)
        .arg("-m")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| CleanerError::Selector(format!("failed to run {name}: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        let mut input = Vec::new();
        for path in candidates {
            input.extend_from_slice(path);
            input.push(b'\n');
        }
        match stdin.write_all(&input) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Err(e) => return Err(CleanerError::Selector(format!("writing to {name}: {e}"))),
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| CleanerError::Selector(format!("waiting for {name}: {e}")))?;
    match output.status.code() {
        Some(0) => Ok(split_lines(&output.stdout)),
        Some(1) | Some(130) => Ok(Vec::new()),
        _ => Err(CleanerError::Selector(format!("{name} exited with {}", output.status))),
    }
}

/// Paths supplied one per line on a non-interactive channel.
pub fn read_selection<R: BufRead>(mut reader: R) -> io::Result<Vec<Vec<u8>>> {
    let mut paths = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let trimmed = trim_end(&line);
        if !trimmed.is_empty() {
            paths.push(trimmed.to_vec());
        }
    }
    Ok(paths)
}

fn run_nvim(cfg: &Config, args: &[&str]) -> Result<Vec<u8>, CleanerError> {
    let mut cmd = Command::new(&cfg.nvim);
    cmd.args(args);
    capture(cmd, &cfg.nvim.to_string_lossy())
}

fn capture(mut cmd: Command, name: &str) -> Result<Vec<u8>, CleanerError> {
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| CleanerError::Editor(format!("failed to run {name}: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CleanerError::Editor(format!(
            "{name} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(output.stdout)
}

fn split_lines(data: &[u8]) -> Vec<Vec<u8>> {
    data.split(|b| *b == b'\n')
        .map(trim_end)
        .filter(|line| !line.is_empty())
        .map(<[u8]>::to_vec)
        .collect()
}

fn trim_end(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

#[cfg(unix)]
fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_lines_trimmed() {
        let input = b"/a/b  \n\n/c\r\n   \n/d";
        let paths = read_selection(&input[..]).unwrap();
        assert_eq!(paths, vec![b"/a/b".to_vec(), b"/c".to_vec(), b"/d".to_vec()]);
    }

    #[test]
    fn name_sort_is_bytewise() {
        let mut paths = vec![b"/b".to_vec(), b"/B".to_vec(), b"/a".to_vec()];
        sort_paths(&mut paths, SortOrder::Recent);
        assert_eq!(paths[0], b"/b");
        sort_paths(&mut paths, SortOrder::Name);
        assert_eq!(paths, vec![b"/B".to_vec(), b"/a".to_vec(), b"/b".to_vec()]);
    }
}
