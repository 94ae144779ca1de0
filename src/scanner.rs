//! Scan entry points.
//!
//! Every call validates its root, walks the tree once and returns fresh,
//! caller-owned results. Nothing is cached between calls.

use crate::aggregate;
use crate::categories::duplicates;
use crate::classifier::{self, Classification, Classifier};
use crate::config::{Config, ExclusionMatcher};
use crate::error::{Error, Result};
use crate::git::{self, GitOptions};
use crate::model::{CategorySummary, DuplicateSet, FileRecord, GitRepoSummary, ScanRequest};
use crate::utils;
use crate::validator;
use crate::walker::{CancelToken, PathFilter, ScanWarning, WalkEvent, Walker};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Engine-level settings, usually derived from [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ScanSettings {
    /// Worker threads; 0 means one per CPU.
    pub threads: usize,
    pub exclusions: ExclusionMatcher,
    pub extra_bloat_dirs: Vec<String>,
    pub git: GitOptions,
}

impl From<&Config> for ScanSettings {
    fn from(config: &Config) -> Self {
        Self {
            threads: config.scan.threads,
            exclusions: config.exclusions.matcher(),
            extra_bloat_dirs: config.bloat.extra_dirs.clone(),
            git: GitOptions {
                large_blob_threshold: config.large_blob_threshold_bytes(),
            },
        }
    }
}

pub struct Scanner {
    settings: ScanSettings,
    classifier: Arc<Classifier>,
    exclusions: Arc<ExclusionMatcher>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(ScanSettings::default())
    }
}

impl Scanner {
    pub fn new(settings: ScanSettings) -> Self {
        let classifier = Arc::new(Classifier::new(settings.extra_bloat_dirs.clone()));
        let exclusions = Arc::new(settings.exclusions.clone());
        Self {
            settings,
            classifier,
            exclusions,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ScanSettings::from(config))
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    fn pool(&self) -> Result<rayon::ThreadPool> {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.threads)
            .thread_name(|i| format!("reclaim-worker-{i}"))
            .build()?)
    }

    fn walker(&self, root: &Path, request: &ScanRequest, cancel: &CancelToken) -> Walker {
        let mut walker = Walker::new(root)
            .follow_symlinks(request.follow_symlinks)
            .threads(self.settings.threads)
            .cancel(cancel.clone());
        if !self.exclusions.is_empty() {
            let exclusions = Arc::clone(&self.exclusions);
            let filter: PathFilter = Arc::new(move |path: &Path| exclusions.is_excluded(path));
            walker = walker.exclude(filter);
        }
        walker
    }

    /// Bloat, junk and dev-cache categories from a single walk.
    pub fn classify(&self, request: &ScanRequest, cancel: &CancelToken) -> Result<Classification> {
        let root = validator::validate_scan_root(&request.root)?;
        let pool = self.pool()?;
        tracing::info!(root = %root.display(), "classifying");

        let prune = Arc::clone(&self.classifier);
        let events = self
            .walker(&root, request, cancel)
            .prune(move |path| prune.is_subtree_match(path))
            .walk();

        let mut warnings = Vec::new();
        let result = classifier::classify_tree(
            &self.classifier,
            events,
            request.min_size_bytes,
            &pool,
            cancel,
            &mut warnings,
        );
        report_warnings("classify", &warnings);
        result
    }

    pub fn scan_bloat(
        &self,
        request: &ScanRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<CategorySummary>> {
        Ok(self.classify(request, cancel)?.bloat)
    }

    pub fn scan_junk_files(
        &self,
        request: &ScanRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<CategorySummary>> {
        Ok(self.classify(request, cancel)?.junk)
    }

    pub fn scan_dev_caches(
        &self,
        request: &ScanRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<CategorySummary>> {
        Ok(self.classify(request, cancel)?.dev_caches)
    }

    /// Files at or above `min_size_bytes`, largest first.
    pub fn scan_large_files(
        &self,
        request: &ScanRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<FileRecord>> {
        let root = validator::validate_scan_root(&request.root)?;
        tracing::info!(root = %root.display(), min_size = request.min_size_bytes, "scanning for large files");

        let mut warnings = Vec::new();
        let mut files = Vec::new();
        for event in self.walker(&root, request, cancel).walk() {
            match event {
                WalkEvent::File(record) if record.size_bytes >= request.min_size_bytes => {
                    files.push(record)
                }
                WalkEvent::Warning(warning) => warnings.push(warning),
                _ => {}
            }
        }
        report_warnings("large files", &warnings);
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        aggregate::sort_files(&mut files);
        Ok(files)
    }

    /// Sets of identical files. `.git` directories are never descended.
    pub fn scan_duplicates(
        &self,
        request: &ScanRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<DuplicateSet>> {
        let root = validator::validate_scan_root(&request.root)?;
        let pool = self.pool()?;
        tracing::info!(root = %root.display(), "scanning for duplicates");

        let mut warnings = Vec::new();
        let mut files = Vec::new();
        for event in self
            .walker(&root, request, cancel)
            .prune(git::is_git_dir_name)
            .walk()
        {
            match event {
                WalkEvent::File(record) => files.push(record),
                WalkEvent::Warning(warning) => warnings.push(warning),
                WalkEvent::Dir { .. } => {}
            }
        }
        if cancel.is_cancelled() {
            report_warnings("duplicates", &warnings);
            return Err(Error::Cancelled);
        }

        let result = duplicates::find_duplicates(
            files,
            request.min_size_bytes,
            &pool,
            cancel,
            &mut warnings,
        );
        report_warnings("duplicates", &warnings);
        result
    }

    /// Analyze every `.git` directory below the root, largest repository first.
    pub fn scan_git_repos(
        &self,
        request: &ScanRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<GitRepoSummary>> {
        let root = validator::validate_scan_root(&request.root)?;
        let pool = self.pool()?;
        tracing::info!(root = %root.display(), "scanning for git repositories");

        let mut warnings = Vec::new();
        let mut git_dirs: Vec<PathBuf> = Vec::new();
        for event in self
            .walker(&root, request, cancel)
            .prune(git::is_git_dir_name)
            .walk()
        {
            match event {
                WalkEvent::Dir { path, pruned: true } if git::is_git_dir_name(&path) => {
                    git_dirs.push(path)
                }
                WalkEvent::Warning(warning) => warnings.push(warning),
                _ => {}
            }
        }
        if cancel.is_cancelled() {
            report_warnings("git", &warnings);
            return Err(Error::Cancelled);
        }
        tracing::debug!(repos = git_dirs.len(), "analyzing repositories");

        let options = self.settings.git;
        let analyzed: Vec<(PathBuf, std::result::Result<GitRepoSummary, String>)> = pool.install(|| {
            git_dirs
                .into_par_iter()
                .map(|dir| {
                    let summary = utils::catch_panic(|| git::analyze_git_dir(&dir, &options));
                    (dir, summary)
                })
                .collect()
        });

        let mut repos = Vec::new();
        for (dir, summary) in analyzed {
            match summary {
                Ok(summary) if summary.total_size >= request.min_size_bytes => repos.push(summary),
                Ok(_) => {}
                Err(msg) => warnings.push(ScanWarning::new(dir, format!("git analysis panicked: {msg}"))),
            }
        }
        report_warnings("git", &warnings);
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        aggregate::sort_git_repos(&mut repos);
        Ok(repos)
    }
}

fn report_warnings(scan: &str, warnings: &[ScanWarning]) {
    for warning in warnings {
        match &warning.path {
            Some(path) => tracing::warn!(scan, path = %path.display(), "{}", warning.message),
            None => tracing::warn!(scan, "{}", warning.message),
        }
    }
    if !warnings.is_empty() {
        tracing::info!(scan, count = warnings.len(), "scan finished with warnings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Exclusions;
    use crate::error::InvalidPathReason;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    fn scanner() -> Scanner {
        Scanner::new(ScanSettings {
            threads: 2,
            ..ScanSettings::default()
        })
    }

    #[test]
    fn test_rejects_missing_root() {
        let temp_dir = create_test_dir();
        let request = ScanRequest::new(temp_dir.path().join("missing"));
        let err = scanner()
            .scan_large_files(&request, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPath {
                reason: InvalidPathReason::NotFound,
                ..
            }
        ));
    }

    #[test]
    fn test_large_files_sorted_and_filtered() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        fs::write(root.join("small"), vec![0u8; 10]).unwrap();
        fs::write(root.join("mid"), vec![0u8; 200]).unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/big"), vec![0u8; 500]).unwrap();

        let request = ScanRequest::new(root).min_size(100);
        let files = scanner()
            .scan_large_files(&request, &CancelToken::new())
            .unwrap();
        let sizes: Vec<u64> = files.iter().map(|f| f.size_bytes).collect();
        assert_eq!(sizes, vec![500, 200]);
    }

    #[test]
    fn test_exclusions_prune_every_scan() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("keep")).unwrap();
        fs::create_dir_all(root.join("secret")).unwrap();
        fs::write(root.join("keep/a.log"), "log").unwrap();
        fs::write(root.join("secret/b.log"), "log").unwrap();

        let settings = ScanSettings {
            threads: 2,
            exclusions: Exclusions {
                patterns: vec!["**/secret/**".to_string()],
            }
            .matcher(),
            ..ScanSettings::default()
        };
        let junk = Scanner::new(settings)
            .scan_junk_files(&ScanRequest::new(root), &CancelToken::new())
            .unwrap();
        assert_eq!(junk.len(), 1);
        assert_eq!(junk[0].entries.len(), 1);
        assert!(junk[0].entries[0].path.ends_with("keep/a.log"));
    }

    #[test]
    fn test_duplicates_skip_git_objects() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".git/objects/aa")).unwrap();
        fs::write(root.join(".git/objects/aa/one"), "same bytes").unwrap();
        fs::write(root.join(".git/objects/aa/two"), "same bytes").unwrap();
        fs::write(root.join("only.txt"), "same bytes").unwrap();

        let sets = scanner()
            .scan_duplicates(&ScanRequest::new(root), &CancelToken::new())
            .unwrap();
        assert!(sets.is_empty());
    }

    #[test]
    fn test_git_repos_found_and_filtered() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("small/.git/refs/heads")).unwrap();
        fs::write(root.join("small/.git/HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::create_dir_all(root.join("big/.git/logs")).unwrap();
        fs::write(root.join("big/.git/HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(root.join("big/.git/logs/HEAD"), vec![b'x'; 4096]).unwrap();
        // A worktree link is a file, not a repository.
        fs::create_dir_all(root.join("wt")).unwrap();
        fs::write(root.join("wt/.git"), "gitdir: ../big/.git/worktrees/wt\n").unwrap();

        let all = scanner()
            .scan_git_repos(&ScanRequest::new(root), &CancelToken::new())
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].repo_path.ends_with("big"));

        let filtered = scanner()
            .scan_git_repos(&ScanRequest::new(root).min_size(1024), &CancelToken::new())
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_cancelled_scan() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("f"), "x").unwrap();
        let token = CancelToken::new();
        token.cancel();
        let err = scanner()
            .scan_bloat(&ScanRequest::new(temp_dir.path()), &token)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
