//! Removal predicates over file names.
//!
//! A [`PredicateSet`] is built once from user input and then only queried.
//! A path is removed when any predicate in the set matches it.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use regex::bytes::Regex;

use crate::CleanerError;

#[derive(Debug, Clone)]
pub enum Predicate {
    /// Matches paths that no longer exist on disk.
    Gone,
    /// Matches paths where the expression is found anywhere.
    Pattern(Regex),
    /// Matches paths that are members of an explicit selection.
    Selected(HashSet<Vec<u8>>),
}

impl Predicate {
    pub fn pattern(expr: &str) -> Result<Self, CleanerError> {
        Ok(Predicate::Pattern(Regex::new(expr)?))
    }

    pub fn selected<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Predicate::Selected(paths.into_iter().collect())
    }

    pub fn matches(&self, path: &[u8]) -> bool {
        match self {
            Predicate::Gone => is_gone(path),
            Predicate::Pattern(re) => re.is_match(path),
            Predicate::Selected(set) => set.contains(path),
        }
    }
}

/// Only a definite "not found" counts as gone. Any other error, such as a
/// permission problem on a parent directory, leaves the entry alone.
fn is_gone(path: &[u8]) -> bool {
    match std::fs::metadata(to_path(path)) {
        Ok(_) => false,
        Err(err) => err.kind() == io::ErrorKind::NotFound,
    }
}

#[cfg(unix)]
fn to_path(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn to_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// OR-combination of predicates.
#[derive(Debug, Clone, Default)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.push(predicate);
        self
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Predicate> {
        self.predicates.iter()
    }

    /// True if at least one predicate matches. An empty set never matches.
    pub fn matches(&self, path: &[u8]) -> bool {
        self.predicates.iter().any(|p| p.matches(path))
    }
}

impl FromIterator<Predicate> for PredicateSet {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_searches_anywhere() {
        let p = Predicate::pattern("tmp").unwrap();
        assert!(p.matches(b"/var/tmp/x"));
        assert!(!p.matches(b"/home/x"));
        let anchored = Predicate::pattern("a$").unwrap();
        assert!(anchored.matches(b"/tmp/a"));
        assert!(!anchored.matches(b"/tmp/ab"));
    }

    #[test]
    fn invalid_pattern_rejected() {
        assert!(matches!(Predicate::pattern("("), Err(CleanerError::Pattern(_))));
    }

    #[test]
    fn selection_is_exact() {
        let p = Predicate::selected(vec![b"/a/b".to_vec()]);
        assert!(p.matches(b"/a/b"));
        assert!(!p.matches(b"/a/b/"));
        assert!(!p.matches(b"/a"));
    }

    #[test]
    fn gone_checks_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("here");
        std::fs::write(&present, b"x").unwrap();
        let missing = dir.path().join("missing");
        let to_bytes = |p: &std::path::Path| p.to_str().unwrap().as_bytes().to_vec();
        assert!(!Predicate::Gone.matches(&to_bytes(&present)));
        assert!(Predicate::Gone.matches(&to_bytes(&missing)));
        assert!(!Predicate::Gone.matches(&to_bytes(dir.path())));
    }

    #[cfg(unix)]
    #[test]
    fn gone_ignores_errors_other_than_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"x").unwrap();
        // lookup through a regular file fails with ENOTDIR
        let child = file.join("child");
        let err = std::fs::metadata(&child).unwrap_err();
        assert_ne!(err.kind(), io::ErrorKind::NotFound);
        assert!(!Predicate::Gone.matches(child.to_str().unwrap().as_bytes()));
    }

    #[test]
    fn empty_set_matches_nothing() {
        let set = PredicateSet::new();
        assert!(set.is_empty());
        assert!(!set.matches(b""));
        assert!(!set.matches(b"/anything"));
    }

    #[test]
    fn set_is_or_of_members() {
        let set = PredicateSet::new()
            .with(Predicate::pattern("^/x").unwrap())
            .with(Predicate::selected(vec![b"/y".to_vec()]));
        assert!(set.matches(b"/x/1"));
        assert!(set.matches(b"/y"));
        assert!(!set.matches(b"/z"));
        assert_eq!(set.len(), 2);
    }
}
