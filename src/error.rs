//! Error taxonomy shared by the scanners and the cleanup engine.
//!
//! Only `InvalidPath`, `BatchLimitExceeded`, `Cancelled` and `ThreadPool` ever
//! escape a public call. The per-entry variants are produced while walking or
//! deleting and end up as warnings or as `CleanupFailure` reasons.

use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        path: PathBuf,
        reason: InvalidPathReason,
    },

    #[error("permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cleanup batch rejected: {attempted} {limit} exceeds the maximum of {max}")]
    BatchLimitExceeded {
        limit: BatchLimit,
        attempted: u64,
        max: u64,
    },

    #[error("repository {} has a pending operation ({})", repo.display(), marker.display())]
    LockHeld { repo: PathBuf, marker: PathBuf },

    #[error("scan cancelled")]
    Cancelled,

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Map an `io::Error` for `path` onto the taxonomy, splitting out permission failures.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Error::PermissionDenied { path }
        } else {
            Error::Io { path, source }
        }
    }

    pub fn invalid_path(path: impl Into<PathBuf>, reason: InvalidPathReason) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidPathReason {
    NotFound,
    NotADirectory,
    OutsideRoot,
    Protected,
    HomeDirectory,
    Unresolvable,
}

impl fmt::Display for InvalidPathReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InvalidPathReason::NotFound => "path does not exist",
            InvalidPathReason::NotADirectory => "path is not a directory",
            InvalidPathReason::OutsideRoot => "path escapes the declared root",
            InvalidPathReason::Protected => "path is a protected system directory",
            InvalidPathReason::HomeDirectory => "refusing to delete the home directory",
            InvalidPathReason::Unresolvable => "path cannot be resolved",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchLimit {
    Paths,
    Bytes,
}

impl fmt::Display for BatchLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchLimit::Paths => f.write_str("paths"),
            BatchLimit::Bytes => f.write_str("bytes"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_permission_denied() {
        let err = Error::from_io(
            "/some/dir",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[test]
    fn test_from_io_other() {
        let err = Error::from_io(
            "/some/file",
            std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
        );
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_batch_limit_message() {
        let err = Error::BatchLimitExceeded {
            limit: BatchLimit::Paths,
            attempted: 12,
            max: 10,
        };
        assert_eq!(
            err.to_string(),
            "cleanup batch rejected: 12 paths exceeds the maximum of 10"
        );
    }
}
