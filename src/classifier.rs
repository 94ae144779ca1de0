//! Single-pass category classification.
//!
//! Directories are tried against the dev-cache table, then the bloat table.
//! A matched directory is pruned from the walk and sized as a whole, so the
//! junk table (files only) never sees anything inside it.

use crate::aggregate;
use crate::categories::{bloat::BloatMatcher, dev_cache, junk, CategoryMatch, MatchKind};
use crate::error::{Error, Result};
use crate::model::{CategoryEntry, CategorySummary, FileRecord};
use crate::utils;
use crate::walker::{CancelToken, ScanWarning, WalkEvent};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Something the walker produced that a rule can match.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    File(&'a FileRecord),
    Dir(&'a Path),
}

/// Stateless matcher over the three rule tables.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    bloat: BloatMatcher,
}

impl Classifier {
    pub fn new(extra_bloat_dirs: Vec<String>) -> Self {
        Self {
            bloat: BloatMatcher::new(extra_bloat_dirs),
        }
    }

    pub fn classify(&self, candidate: Candidate<'_>) -> Option<CategoryMatch> {
        match candidate {
            Candidate::Dir(path) => self.classify_dir(path),
            Candidate::File(record) => junk::match_file(&record.path),
        }
    }

    pub fn classify_dir(&self, path: &Path) -> Option<CategoryMatch> {
        dev_cache::match_dir(path).or_else(|| self.bloat.match_dir(path))
    }

    /// True when `path` is a directory whose whole subtree belongs to a category.
    pub fn is_subtree_match(&self, path: &Path) -> bool {
        self.classify_dir(path).is_some()
    }
}

/// All three category views produced by one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub bloat: Vec<CategorySummary>,
    pub junk: Vec<CategorySummary>,
    pub dev_caches: Vec<CategorySummary>,
}

/// Drive a classification walk to completion.
///
/// `events` must come from a walker pruned with [`Classifier::is_subtree_match`].
/// Matched directories are sized in parallel on `pool` once the walk is done.
pub fn classify_tree(
    classifier: &Classifier,
    events: impl Iterator<Item = WalkEvent>,
    min_size_bytes: u64,
    pool: &rayon::ThreadPool,
    cancel: &CancelToken,
    warnings: &mut Vec<ScanWarning>,
) -> Result<Classification> {
    let mut matched_dirs: Vec<(PathBuf, CategoryMatch)> = Vec::new();
    let mut junk_entries: Vec<CategoryEntry> = Vec::new();

    for event in events {
        match event {
            WalkEvent::Dir { path, pruned: true } => {
                if let Some(m) = classifier.classify(Candidate::Dir(&path)) {
                    matched_dirs.push((path, m));
                }
            }
            WalkEvent::Dir { .. } => {}
            WalkEvent::File(record) => {
                if record.size_bytes < min_size_bytes {
                    continue;
                }
                if let Some(m) = classifier.classify(Candidate::File(&record)) {
                    junk_entries.push(entry(m, record.path, record.size_bytes));
                }
            }
            WalkEvent::Warning(warning) => warnings.push(warning),
        }
    }
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tracing::debug!(
        dirs = matched_dirs.len(),
        junk = junk_entries.len(),
        "sizing matched directories"
    );
    let sized: Vec<(MatchKind, CategoryEntry)> = pool.install(|| {
        matched_dirs
            .into_par_iter()
            .map(|(path, m)| {
                let size = utils::dir_size(&path);
                (m.kind, entry(m, path, size))
            })
            .collect()
    });
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let (mut bloat, mut dev_caches) = (Vec::new(), Vec::new());
    for (kind, e) in sized {
        if e.size_bytes < min_size_bytes {
            continue;
        }
        match kind {
            MatchKind::DevCache => dev_caches.push(e),
            _ => bloat.push(e),
        }
    }

    Ok(Classification {
        bloat: aggregate::summarize(bloat),
        junk: aggregate::summarize(junk_entries),
        dev_caches: aggregate::summarize(dev_caches),
    })
}

fn entry(m: CategoryMatch, path: PathBuf, size_bytes: u64) -> CategoryEntry {
    CategoryEntry {
        category_id: m.category_id,
        display_name: m.display_name,
        path,
        size_bytes,
        safety: m.safety,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::Walker;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    fn run(root: &Path, min_size: u64) -> Classification {
        let classifier = Arc::new(Classifier::default());
        let prune = Arc::clone(&classifier);
        let events = Walker::new(root)
            .threads(2)
            .prune(move |p| prune.is_subtree_match(p))
            .walk();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let mut warnings = Vec::new();
        classify_tree(
            &classifier,
            events,
            min_size,
            &pool,
            &CancelToken::new(),
            &mut warnings,
        )
        .unwrap()
    }

    #[test]
    fn test_dev_cache_wins_over_bloat() {
        let classifier = Classifier::default();
        // Both tables could claim this path; the cache table is consulted first.
        let m = classifier
            .classify_dir(Path::new("/Users/me/Library/Developer/Xcode/DerivedData"))
            .unwrap();
        assert_eq!(m.kind, MatchKind::DevCache);
    }

    #[test]
    fn test_matched_subtree_hides_junk() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("node_modules/pkg/install.log"), "12345").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "123").unwrap();
        fs::write(root.join("build.log"), "ab").unwrap();

        let result = run(root, 0);
        assert_eq!(result.bloat.len(), 1);
        assert_eq!(result.bloat[0].category_id, "node_modules");
        assert_eq!(result.bloat[0].total_size, 8);

        assert_eq!(result.junk.len(), 1);
        assert_eq!(result.junk[0].entries.len(), 1);
        assert_eq!(result.junk[0].entries[0].path, root.join("build.log"));
    }

    #[test]
    fn test_nested_match_counted_once() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("node_modules/a/node_modules/b")).unwrap();
        fs::write(root.join("node_modules/a/node_modules/b/x.js"), "xx").unwrap();

        let result = run(root, 0);
        assert_eq!(result.bloat.len(), 1);
        assert_eq!(result.bloat[0].entries.len(), 1);
        assert_eq!(result.bloat[0].total_size, 2);
    }

    #[test]
    fn test_min_size_filters_entries() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("__pycache__")).unwrap();
        fs::write(root.join("__pycache__/m.pyc"), vec![0u8; 10]).unwrap();
        fs::write(root.join("small.tmp"), "t").unwrap();

        let result = run(root, 5);
        assert_eq!(result.bloat.len(), 1);
        assert!(result.junk.is_empty());
    }
}
