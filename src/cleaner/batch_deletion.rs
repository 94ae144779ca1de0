//! Batch execution: one path at a time, in input order.

use super::single_deletion::{delete_with_precheck, DeleteOutcome};
use crate::model::CleanupResult;
use std::path::PathBuf;

/// Delete every path independently. Failures never stop the batch and every
/// input lands in exactly one bucket of the result.
pub fn delete_batch(paths: &[PathBuf], use_trash: bool, dry_run: bool) -> CleanupResult {
    let mut result = CleanupResult::default();
    if paths.is_empty() {
        return result;
    }

    tracing::debug!(
        count = paths.len(),
        use_trash,
        dry_run,
        first = %paths[0].display(),
        "batch delete start"
    );

    for path in paths {
        match delete_with_precheck(path, use_trash, dry_run) {
            Ok(DeleteOutcome::Deleted) => result.deleted.push(path.clone()),
            Ok(DeleteOutcome::SkippedMissing) => result.skipped.push(path.clone()),
            Err(failure) => {
                tracing::debug!(path = %path.display(), reason = %failure.reason, "delete failed");
                result.errors.push(failure);
            }
        }
    }

    tracing::info!(
        deleted = result.deleted.len(),
        skipped = result.skipped.len(),
        errors = result.errors.len(),
        dry_run,
        "batch delete done"
    );
    result
}
