//! Single-path deletion with precheck.

use super::path_precheck::{precheck_path, vanished, PrecheckOutcome};
use crate::error::Error;
use crate::model::{CleanupFailure, FailureKind};
use crate::trash_ops;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    SkippedMissing,
}

/// Delete one path. Dry runs stop after the existence check.
pub fn delete_with_precheck(
    path: &Path,
    use_trash: bool,
    dry_run: bool,
) -> Result<DeleteOutcome, CleanupFailure> {
    let is_dir = match precheck_path(path) {
        Ok(PrecheckOutcome::Missing) => return Ok(DeleteOutcome::SkippedMissing),
        Ok(_) if dry_run => return Ok(DeleteOutcome::Deleted),
        Ok(PrecheckOutcome::Locked) => {
            return Err(failure(
                path,
                FailureKind::Locked,
                "in use by another process",
            ))
        }
        Ok(PrecheckOutcome::Present { is_dir }) => is_dir,
        Err(err) => return Err(io_failure(path, err)),
    };

    let result = if use_trash {
        trash_ops::delete(path).map_err(|err| failure(path, FailureKind::Trash, format!("{err:#}")))
    } else if is_dir {
        std::fs::remove_dir_all(path).map_err(|err| io_failure(path, err))
    } else {
        std::fs::remove_file(path).map_err(|err| io_failure(path, err))
    };

    match result {
        Ok(()) => Ok(DeleteOutcome::Deleted),
        // Someone else removed it while we were trying.
        Err(_) if vanished(path) => Ok(DeleteOutcome::SkippedMissing),
        Err(failure) => Err(failure),
    }
}

fn failure(path: &Path, kind: FailureKind, reason: impl Into<String>) -> CleanupFailure {
    CleanupFailure {
        path: path.to_path_buf(),
        kind,
        reason: reason.into(),
    }
}

fn io_failure(path: &Path, err: std::io::Error) -> CleanupFailure {
    let error = Error::from_io(path, err);
    let kind = match error {
        Error::PermissionDenied { .. } => FailureKind::PermissionDenied,
        _ => FailureKind::Io,
    };
    failure(path, kind, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_permanent_file_and_dir() {
        let temp_dir = create_test_dir();
        let file = temp_dir.path().join("a.txt");
        let dir = temp_dir.path().join("d");
        fs::write(&file, "x").unwrap();
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/f"), "y").unwrap();

        assert_eq!(delete_with_precheck(&file, false, false), Ok(DeleteOutcome::Deleted));
        assert_eq!(delete_with_precheck(&dir, false, false), Ok(DeleteOutcome::Deleted));
        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_missing_is_skipped() {
        let temp_dir = create_test_dir();
        let nonexistent = temp_dir.path().join("nonexistent.txt");
        assert_eq!(
            delete_with_precheck(&nonexistent, false, false),
            Ok(DeleteOutcome::SkippedMissing)
        );
        assert_eq!(
            delete_with_precheck(&nonexistent, true, true),
            Ok(DeleteOutcome::SkippedMissing)
        );
    }

    #[test]
    fn test_dry_run_does_not_touch_disk() {
        let temp_dir = create_test_dir();
        let file = temp_dir.path().join("keep.txt");
        fs::write(&file, "x").unwrap();

        assert_eq!(delete_with_precheck(&file, false, true), Ok(DeleteOutcome::Deleted));
        assert!(file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_removed_not_target() {
        let temp_dir = create_test_dir();
        let target = temp_dir.path().join("target");
        let link = temp_dir.path().join("link");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("data"), "precious").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(delete_with_precheck(&link, false, false), Ok(DeleteOutcome::Deleted));
        assert!(target.join("data").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = create_test_dir();
        let locked_dir = temp_dir.path().join("ro");
        fs::create_dir(&locked_dir).unwrap();
        let file = locked_dir.join("f");
        fs::write(&file, "x").unwrap();
        fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o555)).unwrap();

        let result = delete_with_precheck(&file, false, false);
        fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o755)).unwrap();

        // Root ignores directory permissions; only assert when the removal was refused.
        if let Err(failure) = result {
            assert_eq!(failure.kind, FailureKind::PermissionDenied);
            assert_eq!(failure.path, file);
        }
    }
}
