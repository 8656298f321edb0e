use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::editor::SortOrder;

pub const ENV_NVIM: &str = "OLDFILES_CLEANER_NVIM";
pub const ENV_FZF: &str = "OLDFILES_CLEANER_FZF";
pub const ENV_SHADA: &str = "OLDFILES_CLEANER_SHADA";

/// Runtime configuration for locating the history and running helpers.
#[derive(Debug, Clone)]
pub struct Config {
    /// Neovim executable.
    pub nvim: OsString,
    /// Fuzzy selector executable.
    pub fzf: OsString,
    /// History file to edit. When unset the editor is asked for its state
    /// directory.
    pub shada: Option<PathBuf>,
    /// Order used when listing or offering history entries.
    pub sort: SortOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nvim: OsString::from("nvim"),
            fzf: OsString::from("fzf"),
            shada: None,
            sort: SortOrder::Recent,
        }
    }
}

impl Config {
    /// Defaults overridden by `OLDFILES_CLEANER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key))
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup(ENV_NVIM).filter(|v| !v.is_empty()) {
            cfg.nvim = v;
        }
        if let Some(v) = lookup(ENV_FZF).filter(|v| !v.is_empty()) {
            cfg.fzf = v;
        }
        if let Some(v) = lookup(ENV_SHADA).filter(|v| !v.is_empty()) {
            cfg.shada = Some(PathBuf::from(v));
        }
        cfg
    }
}
