//! Plain serializable records exchanged with callers.
//!
//! Every value here is created fresh by a scan or cleanup call and handed to
//! the caller; nothing keeps a reference back into engine state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parameters of a single scan invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub root: PathBuf,
    #[serde(default)]
    pub min_size_bytes: u64,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl ScanRequest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            min_size_bytes: 0,
            follow_symlinks: false,
        }
    }

    pub fn min_size(mut self, bytes: u64) -> Self {
        self.min_size_bytes = bytes;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// One regular file seen during traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Safety {
    Safe,
    Caution,
    Dangerous,
}

impl Safety {
    pub fn as_str(&self) -> &'static str {
        match self {
            Safety::Safe => "safe",
            Safety::Caution => "caution",
            Safety::Dangerous => "dangerous",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category_id: String,
    pub display_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub safety: Safety,
}

/// Entries of one category. `total_size` always equals the sum of entry sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category_id: String,
    pub display_name: String,
    pub entries: Vec<CategoryEntry>,
    pub total_size: u64,
    pub safety: Safety,
}

impl CategorySummary {
    pub fn items(&self) -> usize {
        self.entries.len()
    }
}

/// Files with identical size and content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSet {
    pub content_hash: String,
    pub file_size: u64,
    pub members: Vec<PathBuf>,
}

impl DuplicateSet {
    /// Bytes freed by removing every member but one.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.file_size
            .saturating_mul(self.members.len().saturating_sub(1) as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitEntryType {
    Objects,
    PackFile,
    Reflog,
    Refs,
    LargeTrackedFile,
    Other,
}

impl GitEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GitEntryType::Objects => "objects",
            GitEntryType::PackFile => "pack",
            GitEntryType::Reflog => "reflog",
            GitEntryType::Refs => "refs",
            GitEntryType::LargeTrackedFile => "large blob",
            GitEntryType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRepoEntry {
    pub repo_path: PathBuf,
    pub entry_path: PathBuf,
    pub entry_type: GitEntryType,
    pub size_bytes: u64,
    pub safety: Safety,
    pub actionable: bool,
    pub recommendation: Option<String>,
    /// Object id, set for `LargeTrackedFile` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

/// Analysis of one `.git` directory.
///
/// `total_size` counts on-disk entries only; `LargeTrackedFile` entries point
/// into pack or loose object files that are already counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRepoSummary {
    pub repo_path: PathBuf,
    pub entries: Vec<GitRepoEntry>,
    pub total_size: u64,
    pub lock_held: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupRequest {
    pub paths: Vec<PathBuf>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_use_trash")]
    pub use_trash: bool,
    /// When set, every path must lie inside this directory.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

fn default_use_trash() -> bool {
    true
}

impl CleanupRequest {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            dry_run: false,
            use_trash: true,
            root: None,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn use_trash(mut self, use_trash: bool) -> Self {
        self.use_trash = use_trash;
        self
    }

    pub fn within(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    PermissionDenied,
    /// Held open by another process (Windows sharing violation).
    Locked,
    Io,
    Trash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub reason: String,
}

/// Outcome of a cleanup call; covers every input path exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupResult {
    pub deleted: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub errors: Vec<CleanupFailure>,
}

impl CleanupResult {
    pub fn total(&self) -> usize {
        self.deleted.len() + self.skipped.len() + self.errors.len()
    }
}
