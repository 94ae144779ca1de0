//! Path validation gate for every scan and delete entry point.
//!
//! Pure checks: the only I/O is `stat` and canonicalization.

use crate::error::{Error, InvalidPathReason, Result};
use std::path::{Component, Path, PathBuf};

/// Directories whose whole subtree is off limits (kernel, device and boot trees).
const KERNEL_DIRS: &[&str] = &["/proc", "/sys", "/dev", "/boot", "/System"];

/// Directories that may contain user data below them but are never a valid
/// scan root or deletion target themselves.
const EXACT_PROTECTED_DIRS: &[&str] = &[
    "/bin",
    "/etc",
    "/lib",
    "/lib32",
    "/lib64",
    "/sbin",
    "/usr",
    "/var",
    "/run",
    "/opt",
    "/srv",
    "/snap",
    "/home",
    "/Users",
    "/Library",
    "/private",
    "/Applications",
    "/Volumes",
];

/// Top-level Windows directories, compared case-insensitively right below a drive root.
pub const WINDOWS_SYSTEM_DIRS: &[&str] = &[
    "Windows",
    "Program Files",
    "Program Files (x86)",
    "ProgramData",
    "$Recycle.Bin",
    "System Volume Information",
    "Recovery",
];

/// Check whether a path is an OS-critical location.
pub fn is_protected(path: &Path) -> bool {
    // A path with no normal components is a filesystem root ("/" or "C:\").
    if !path.components().any(|c| matches!(c, Component::Normal(_))) {
        return true;
    }

    if KERNEL_DIRS.iter().any(|dir| path.starts_with(dir)) {
        return true;
    }

    if EXACT_PROTECTED_DIRS.iter().any(|dir| path == Path::new(dir)) {
        return true;
    }

    is_windows_system_path(path)
}

fn is_windows_system_path(path: &Path) -> bool {
    let mut components = path.components();
    if !matches!(components.next(), Some(Component::Prefix(_))) {
        return false;
    }
    let top = components.find_map(|c| match c {
        Component::Normal(name) => Some(name.to_string_lossy()),
        _ => None,
    });
    match top {
        Some(name) => WINDOWS_SYSTEM_DIRS
            .iter()
            .any(|sys| name.eq_ignore_ascii_case(sys)),
        None => false,
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|err| {
        let reason = if err.kind() == std::io::ErrorKind::NotFound {
            InvalidPathReason::NotFound
        } else {
            InvalidPathReason::Unresolvable
        };
        Error::invalid_path(path, reason)
    })
}

/// Validate `path` against `root`, returning its canonical form.
///
/// Rejects paths that do not exist, resolve outside `root` (after symlink and
/// `..` resolution) or hit the protected-directory denylist.
pub fn validate(path: &Path, root: &Path) -> Result<PathBuf> {
    let canonical_root = canonicalize(root)?;
    let canonical = canonicalize(path)?;

    if !canonical.starts_with(&canonical_root) {
        return Err(Error::invalid_path(path, InvalidPathReason::OutsideRoot));
    }
    if is_protected(&canonical) {
        return Err(Error::invalid_path(path, InvalidPathReason::Protected));
    }
    Ok(canonical)
}

/// Validate a scan root: [`validate`] against itself, then it must be a directory.
pub fn validate_scan_root(root: &Path) -> Result<PathBuf> {
    let canonical = validate(root, root)?;
    if !canonical.is_dir() {
        return Err(Error::invalid_path(root, InvalidPathReason::NotADirectory));
    }
    Ok(canonical)
}

/// Validate a deletion target.
///
/// The final component is never resolved, so a symlink is judged (and later
/// removed) as the link itself. Paths that no longer exist are checked
/// lexically and accepted; the cleanup engine reports them as skipped.
pub fn validate_delete_target(path: &Path, root: Option<&Path>) -> Result<()> {
    let resolved = resolve_parent(path)?;

    if is_protected(&resolved) {
        return Err(Error::invalid_path(path, InvalidPathReason::Protected));
    }

    if let Some(home) = home_dir() {
        if home.starts_with(&resolved) {
            return Err(Error::invalid_path(path, InvalidPathReason::HomeDirectory));
        }
    }

    if let Some(root) = root {
        let root = resolve_parent(root)?;
        if resolved == root || !resolved.starts_with(&root) {
            return Err(Error::invalid_path(path, InvalidPathReason::OutsideRoot));
        }
    }

    Ok(())
}

/// Canonicalize the parent directory and re-attach the final component.
/// Falls back to lexical normalization when the parent does not exist.
fn resolve_parent(path: &Path) -> Result<PathBuf> {
    let absolute = normalize_lexically(&absolutize(path)?);
    let (parent, name) = match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => (parent, name),
        _ => return Ok(absolute),
    };
    match std::fs::canonicalize(parent) {
        Ok(parent) => Ok(parent.join(name)),
        Err(_) => Ok(absolute),
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|_| Error::invalid_path(path, InvalidPathReason::Unresolvable))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| {
        let home = dirs.home_dir().to_path_buf();
        std::fs::canonicalize(&home).unwrap_or(home)
    })
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
    fn test_filesystem_root_is_protected() {
        assert!(is_protected(Path::new("/")));
    }

    #[test]
    fn test_kernel_dirs_protected_recursively() {
        assert!(is_protected(Path::new("/proc")));
        assert!(is_protected(Path::new("/proc/self/cwd")));
        assert!(is_protected(Path::new("/boot/efi")));
        assert!(is_protected(Path::new("/System/Library/Caches")));
    }

    #[test]
    fn test_exact_dirs_only_protected_themselves() {
        assert!(is_protected(Path::new("/usr")));
        assert!(is_protected(Path::new("/home")));
        assert!(!is_protected(Path::new("/usr/local/src/project")));
        assert!(!is_protected(Path::new("/home/me/code")));
    }

    #[test]
    fn test_windows_component_only_matches_at_top_level() {
        // Without a drive prefix these are ordinary directories.
        assert!(!is_protected(Path::new("/home/me/Windows/notes")));
        assert!(!is_protected(Path::new("/home/me/Program Files")));
    }

    #[cfg(windows)]
    #[test]
    fn test_windows_system_dirs() {
        assert!(is_protected(Path::new(r"C:\Windows\System32")));
        assert!(is_protected(Path::new(r"c:\program files\App")));
        assert!(is_protected(Path::new(r"C:\")));
        assert!(!is_protected(Path::new(r"C:\Users\me\Documents")));
    }

    #[test]
    fn test_validate_scan_root_ok() {
        let temp_dir = create_test_dir();
        let canonical = validate_scan_root(temp_dir.path()).unwrap();
        assert!(canonical.is_absolute());
    }

    #[test]
    fn test_validate_scan_root_missing() {
        let temp_dir = create_test_dir();
        let err = validate_scan_root(&temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPath {
                reason: InvalidPathReason::NotFound,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_scan_root_file() {
        let temp_dir = create_test_dir();
        let file = temp_dir.path().join("f.txt");
        fs::write(&file, "x").unwrap();
        let err = validate_scan_root(&file).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPath {
                reason: InvalidPathReason::NotADirectory,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_scan_root_rejects_filesystem_root() {
        let err = validate_scan_root(Path::new("/")).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPath {
                reason: InvalidPathReason::Protected,
                ..
            }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_root_link_to_protected_dir() {
        let temp_dir = create_test_dir();
        let link = temp_dir.path().join("etc-link");
        std::os::unix::fs::symlink("/etc", &link).unwrap();

        for err in [validate_scan_root(&link).unwrap_err(), validate(&link, &link).unwrap_err()] {
            assert!(matches!(
                err,
                Error::InvalidPath {
                    reason: InvalidPathReason::Protected,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_validate_rejects_dotdot_escape() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path().join("root");
        let sibling = temp_dir.path().join("sibling");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&sibling).unwrap();

        let escaped = root.join("..").join("sibling");
        let err = validate(&escaped, &root).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPath {
                reason: InvalidPathReason::OutsideRoot,
                ..
            }
        ));
        assert!(validate(&root.join("."), &root).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_rejects_symlink_escape() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path().join("root");
        let outside = temp_dir.path().join("outside");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        assert!(validate(&root.join("link"), &root).is_err());
    }

    #[test]
    fn test_delete_target_missing_is_accepted() {
        let temp_dir = create_test_dir();
        let gone = temp_dir.path().join("gone");
        assert!(validate_delete_target(&gone, Some(temp_dir.path())).is_ok());
    }

    #[test]
    fn test_delete_target_outside_root() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path().join("root");
        fs::create_dir_all(&root).unwrap();
        let other = temp_dir.path().join("other.txt");
        fs::write(&other, "x").unwrap();

        assert!(validate_delete_target(&other, Some(&root)).is_err());
        // The root itself is not a deletable entry inside the root.
        assert!(validate_delete_target(&root, Some(&root)).is_err());
    }

    #[test]
    fn test_delete_target_rejects_protected_and_home() {
        assert!(validate_delete_target(Path::new("/"), None).is_err());
        assert!(validate_delete_target(Path::new("/usr"), None).is_err());
        if let Some(home) = home_dir() {
            assert!(validate_delete_target(&home, None).is_err());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_delete_target_symlink_is_judged_as_link() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path().join("root");
        fs::create_dir_all(&root).unwrap();
        let link = root.join("usr-link");
        std::os::unix::fs::symlink("/usr", &link).unwrap();

        // The link lives inside the root; its target is irrelevant.
        assert!(validate_delete_target(&link, Some(&root)).is_ok());
    }
}
