//! Shared filesystem helpers used by the scanners and the cleanup engine.

use std::any::Any;
use std::path::{Path, PathBuf};

/// Returns true if this path is a Windows reparse point (junction/symlink/mount point).
///
/// Junctions and OneDrive placeholders are not reported as symlinks, so a
/// walk that does not follow links can still loop through them.
pub fn is_windows_reparse_point(path: &Path) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x0400;
        if let Ok(meta) = std::fs::symlink_metadata(path) {
            return meta.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0;
        }
        false
    }
    #[cfg(not(windows))]
    {
        let _ = path;
        false
    }
}

/// Recursive size of a directory tree.
///
/// Uses an explicit stack instead of recursion so deep `node_modules` trees
/// cannot overflow the call stack. Symlinks and reparse points are counted
/// as entries but never followed; unreadable directories are skipped.
pub fn dir_size(path: &Path) -> u64 {
    let mut total = 0u64;
    let mut dir_stack: Vec<PathBuf> = vec![path.to_path_buf()];

    while let Some(current_dir) = dir_stack.pop() {
        let entries = match std::fs::read_dir(&current_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(dir = %current_dir.display(), %err, "skipping unreadable directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let entry_path = entry.path();
            let meta = match std::fs::symlink_metadata(&entry_path) {
                Ok(m) => m,
                Err(_) => continue,
            };

            if meta.is_dir() && !is_windows_reparse_point(&entry_path) {
                dir_stack.push(entry_path);
            } else if meta.is_file() {
                total = total.saturating_add(meta.len());
            }
        }
    }

    total
}

/// Size of a path on disk: file length, recursive size for directories,
/// zero for anything that cannot be stat'ed.
pub fn path_size(path: &Path) -> u64 {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => dir_size(path),
        Ok(meta) if meta.is_file() => meta.len(),
        _ => 0,
    }
}

/// Final path component as a `&str`, or an empty string.
pub fn file_name_str(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

pub fn panic_payload_to_string(panic_payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run `f`, turning a panic into `Err(message)`.
///
/// Used around worker tasks and dependency calls so a single bad file cannot
/// take down a whole scan or cleanup batch.
pub fn catch_panic<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).map_err(panic_payload_to_string)
}
