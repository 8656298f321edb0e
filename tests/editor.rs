#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use oldfiles_cleaner::editor::{oldfiles, select_with_fzf, shada_path};
use oldfiles_cleaner::{CleanerError, Config};

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// One test so the helper scripts are never written while another thread forks.
#[test]
fn fake_collaborators() {
    let dir = tempfile::tempdir().unwrap();
    let nvim = script(
        dir.path(),
        "nvim",
        r#"case "$*" in
  *stdpath*) printf '%s' /fake/state ;;
  *oldfiles*) printf '/b/two\n/a/one\n' ;;
esac"#,
    );
    let broken = script(dir.path(), "broken-nvim", "echo boom >&2; exit 3");
    let pick_first = script(dir.path(), "fzf-first", "head -n 1");
    let cancel = script(dir.path(), "fzf-cancel", "cat >/dev/null; exit 130");
    let crash = script(dir.path(), "fzf-crash", "cat >/dev/null; exit 2");

    let mut cfg = Config {
        nvim: nvim.into_os_string(),
        ..Config::default()
    };
    assert_eq!(shada_path(&cfg).unwrap(), PathBuf::from("/fake/state/shada/main.shada"));

    let files = oldfiles(&cfg, Path::new("/fake/state/shada/main.shada")).unwrap();
    assert_eq!(files, vec![b"/b/two".to_vec(), b"/a/one".to_vec()]);

    cfg.shada = Some(PathBuf::from("/explicit.shada"));
    assert_eq!(shada_path(&cfg).unwrap(), PathBuf::from("/explicit.shada"));

    let broken_cfg = Config {
        nvim: broken.into_os_string(),
        ..Config::default()
    };
    match shada_path(&broken_cfg) {
        Err(CleanerError::Editor(msg)) => assert!(msg.contains("boom")),
        other => panic!("unexpected {other:?}"),
    }

    cfg.fzf = pick_first.into_os_string();
    assert_eq!(select_with_fzf(&cfg, &files).unwrap(), vec![b"/b/two".to_vec()]);
    cfg.fzf = cancel.into_os_string();
    assert!(select_with_fzf(&cfg, &files).unwrap().is_empty());
    cfg.fzf = crash.into_os_string();
    assert!(matches!(select_with_fzf(&cfg, &files), Err(CleanerError::Selector(_))));
    cfg.fzf = dir.path().join("missing-fzf").into_os_string();
    assert!(matches!(select_with_fzf(&cfg, &files), Err(CleanerError::Selector(_))));
}
