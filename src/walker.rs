//! Parallel tree walker.
//!
//! jwalk reads sibling directories on a fixed-size rayon pool and streams the
//! entries back to the single thread driving [`WalkIter`]. That consumer is
//! the only owner of whatever the caller aggregates, so no scan ever shares a
//! mutable map between workers.

use crate::model::FileRecord;
use crate::utils;
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver};
use jwalk::{DirEntryIter, Parallelism, WalkDirGeneric};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Predicate over a directory or file path, shared with the walk workers.
pub type PathFilter = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// jwalk client state: the per-entry flag records whether descent was pruned.
type WalkState = ((), bool);

/// Request-scoped cancellation flag, checked between directory entries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A non-fatal problem met while walking (unreadable directory, symlink loop, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: Option<PathBuf>,
    pub message: String,
}

impl ScanWarning {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            message: message.into(),
        }
    }

    fn from_jwalk(err: &jwalk::Error) -> Self {
        Self {
            path: err.path().map(Path::to_path_buf),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum WalkEvent {
    File(FileRecord),
    /// A directory below the root. `pruned` directories were yielded but not descended.
    Dir { path: PathBuf, pruned: bool },
    Warning(ScanWarning),
}

pub struct Walker {
    root: PathBuf,
    follow_symlinks: bool,
    threads: usize,
    prune: Vec<PathFilter>,
    exclude: Vec<PathFilter>,
    cancel: CancelToken,
}

impl Walker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
            threads: 0,
            prune: Vec::new(),
            exclude: Vec::new(),
            cancel: CancelToken::new(),
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Worker count; 0 means one per available CPU.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Directories matching `filter` are yielded but not descended into.
    pub fn prune(mut self, filter: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        self.prune.push(Arc::new(filter));
        self
    }

    /// Entries matching `filter` are dropped entirely, subtree included.
    pub fn exclude(mut self, filter: PathFilter) -> Self {
        self.exclude.push(filter);
        self
    }

    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn walk(self) -> WalkIter {
        let (warn_tx, warn_rx) = unbounded::<ScanWarning>();
        let follow = self.follow_symlinks;
        let prune = Arc::new(self.prune);
        let exclude = Arc::new(self.exclude);
        let cancel = self.cancel.clone();

        // One entry per directory visited, only needed when links are followed.
        // The root itself is recorded when jwalk hands it to `process_read_dir`.
        let visited: Arc<Mutex<HashSet<PathBuf>>> = Arc::new(Mutex::new(HashSet::new()));

        let walk = WalkDirGeneric::<WalkState>::new(&self.root)
            .skip_hidden(false)
            .follow_links(follow)
            .parallelism(Parallelism::RayonNewPool(worker_count(self.threads)))
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                if cancel.is_cancelled() {
                    children.clear();
                    return;
                }
                children.retain_mut(|entry| match entry {
                    Ok(e) => {
                        let path = e.path();
                        if exclude.iter().any(|f| f(&path)) {
                            return false;
                        }
                        if e.file_type().is_symlink() || utils::is_windows_reparse_point(&path) {
                            // Only reachable when links are not followed.
                            return false;
                        }
                        if e.read_children_path.is_none() {
                            return true;
                        }
                        if follow && !first_visit(&visited, &path) {
                            let _ = warn_tx.send(ScanWarning::new(
                                &path,
                                "symlink cycle detected, not descending",
                            ));
                            return false;
                        }
                        if prune.iter().any(|f| f(&path)) {
                            e.read_children_path = None;
                            e.client_state = true;
                        }
                        true
                    }
                    Err(err) => {
                        let _ = warn_tx.send(ScanWarning::from_jwalk(err));
                        false
                    }
                });
            });

        WalkIter {
            inner: walk.into_iter(),
            warnings: warn_rx,
            pending: VecDeque::new(),
            cancel: self.cancel,
            finished: false,
            seen_files: follow.then(HashSet::new),
        }
    }
}

fn worker_count(threads: usize) -> usize {
    if threads > 0 {
        return threads;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn lock_visited(visited: &Mutex<HashSet<PathBuf>>) -> std::sync::MutexGuard<'_, HashSet<PathBuf>> {
    visited.lock().unwrap_or_else(PoisonError::into_inner)
}

fn first_visit(visited: &Mutex<HashSet<PathBuf>>, dir: &Path) -> bool {
    match std::fs::canonicalize(dir) {
        Ok(canonical) => lock_visited(visited).insert(canonical),
        // Unresolvable: let jwalk report the read error itself.
        Err(_) => true,
    }
}

/// Lazy, unordered stream of walk events.
pub struct WalkIter {
    inner: DirEntryIter<WalkState>,
    warnings: Receiver<ScanWarning>,
    pending: VecDeque<WalkEvent>,
    cancel: CancelToken,
    finished: bool,
    /// Canonical paths of files already yielded; set only when links are followed.
    seen_files: Option<HashSet<PathBuf>>,
}

impl WalkIter {
    fn drain_warnings(&mut self) {
        while let Ok(warning) = self.warnings.try_recv() {
            self.pending.push_back(WalkEvent::Warning(warning));
        }
    }

    /// A followed link and its target are one real file: only the first is yielded.
    fn first_sighting(&mut self, path: &Path) -> bool {
        let Some(seen) = self.seen_files.as_mut() else {
            return true;
        };
        match std::fs::canonicalize(path) {
            Ok(canonical) => seen.insert(canonical),
            Err(_) => true,
        }
    }

    fn convert(&mut self, entry: jwalk::DirEntry<WalkState>) {
        if let Some(err) = &entry.read_children_error {
            self.pending
                .push_back(WalkEvent::Warning(ScanWarning::from_jwalk(err)));
        }
        if entry.depth == 0 {
            return;
        }

        let path = entry.path();
        let file_type = entry.file_type();
        if file_type.is_dir() {
            self.pending.push_back(WalkEvent::Dir {
                path,
                pruned: entry.client_state,
            });
        } else if file_type.is_file() {
            if !self.first_sighting(&path) {
                return;
            }
            match entry.metadata() {
                Ok(meta) => self.pending.push_back(WalkEvent::File(FileRecord {
                    size_bytes: meta.len(),
                    modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
                    path,
                })),
                Err(err) => self
                    .pending
                    .push_back(WalkEvent::Warning(ScanWarning::new(path, err.to_string()))),
            }
        }
    }
}

impl Iterator for WalkIter {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            self.drain_warnings();
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.finished {
                return None;
            }
            match self.inner.next() {
                Some(Ok(entry)) => self.convert(entry),
                Some(Err(err)) => self
                    .pending
                    .push_back(WalkEvent::Warning(ScanWarning::from_jwalk(&err))),
                None => self.finished = true,
            }
        }
    }
}
