//! Reclaim library crate
//!
//! Scan a directory tree for reclaimable disk space (build bloat, large
//! files, duplicates, junk, developer caches, `.git` internals) and clean up
//! selected paths. The `reclaim` binary is a thin CLI over this API.
//!
//! ```no_run
//! use reclaim::{CancelToken, ScanRequest, Scanner};
//!
//! let scanner = Scanner::default();
//! let bloat = scanner.scan_bloat(&ScanRequest::new("."), &CancelToken::new())?;
//! for summary in &bloat {
//!     println!("{} {}", summary.display_name, summary.total_size);
//! }
//! # Ok::<(), reclaim::Error>(())
//! ```

pub mod aggregate;
pub mod categories;
pub mod classifier;
pub mod cleaner;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod model;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod size;
pub mod theme;
pub mod trash_ops;
pub mod utils;
pub mod validator;
pub mod walker;

pub use classifier::{Candidate, Classification, Classifier};
pub use cleaner::{cleanup, CleanupEngine, CleanupLimits};
pub use config::Config;
pub use error::{Error, Result};
pub use model::{
    CategoryEntry, CategorySummary, CleanupFailure, CleanupRequest, CleanupResult, DuplicateSet,
    FailureKind, FileRecord, GitEntryType, GitRepoEntry, GitRepoSummary, Safety, ScanRequest,
};
pub use scanner::{ScanSettings, Scanner};
pub use walker::{CancelToken, ScanWarning, Walker};
