//! Path eligibility checks run right before each deletion.

use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrecheckOutcome {
    /// Present on disk. `is_dir` is false for symlinks, which are removed as links.
    Present { is_dir: bool },
    Missing,
    Locked,
}

/// Check if a path is locked by another process (Windows-specific)
///
/// Attempts to open the path with DELETE access and full sharing. If it fails with
/// sharing/access errors, the path is considered in use and likely not deletable.
#[cfg(windows)]
pub(crate) fn is_path_locked(path: &Path) -> bool {
    use std::fs::OpenOptions;
    use std::os::windows::fs::OpenOptionsExt;

    const FILE_SHARE_READ: u32 = 0x00000001;
    const FILE_SHARE_WRITE: u32 = 0x00000002;
    const FILE_SHARE_DELETE: u32 = 0x00000004;
    const DELETE: u32 = 0x00010000;
    const FILE_FLAG_BACKUP_SEMANTICS: u32 = 0x02000000;
    const FILE_FLAG_OPEN_REPARSE_POINT: u32 = 0x00200000;

    let mut options = OpenOptions::new();
    options
        .access_mode(DELETE)
        .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE)
        .custom_flags(FILE_FLAG_BACKUP_SEMANTICS | FILE_FLAG_OPEN_REPARSE_POINT);

    match options.open(path) {
        Ok(_) => false,
        // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
        Err(e) => matches!(e.raw_os_error(), Some(32) | Some(33)),
    }
}

#[cfg(not(windows))]
pub(crate) fn is_path_locked(_path: &Path) -> bool {
    // Unix locks are advisory and never block unlink.
    false
}

/// Stat `path` without following a final symlink.
pub(crate) fn precheck_path(path: &Path) -> io::Result<PrecheckOutcome> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(PrecheckOutcome::Missing),
        Err(err) => return Err(err),
    };

    if is_path_locked(path) {
        return Ok(PrecheckOutcome::Locked);
    }

    Ok(PrecheckOutcome::Present {
        is_dir: meta.is_dir(),
    })
}

/// True once `path` no longer exists (not even as a dangling link).
pub(crate) fn vanished(path: &Path) -> bool {
    matches!(
        std::fs::symlink_metadata(path),
        Err(err) if err.kind() == io::ErrorKind::NotFound
    )
}
