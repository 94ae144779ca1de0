//! Cleanup engine.
//!
//! A request moves through validation (whole-request checks, nothing touched
//! on disk) and execution (per path, sequential, no retries). Validation
//! failures reject the request; execution failures are reported per path.

pub mod batch_deletion;
pub(crate) mod path_precheck;
pub mod single_deletion;

use crate::error::{BatchLimit, Error, Result};
use crate::model::{CleanupRequest, CleanupResult};
use crate::utils;
use crate::validator;

/// Most paths accepted in one request.
pub const MAX_BATCH_PATHS: usize = 10_000;

/// Most bytes (of paths that exist) accepted in one request.
pub const MAX_BATCH_BYTES: u64 = 500 * 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupLimits {
    pub max_paths: usize,
    pub max_bytes: u64,
}

impl Default for CleanupLimits {
    fn default() -> Self {
        Self {
            max_paths: MAX_BATCH_PATHS,
            max_bytes: MAX_BATCH_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CleanupEngine {
    limits: CleanupLimits,
}

impl CleanupEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: CleanupLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> CleanupLimits {
        self.limits
    }

    /// Check a request without deleting anything. Returns the total size of
    /// the paths that currently exist.
    pub fn validate(&self, request: &CleanupRequest) -> Result<u64> {
        if request.paths.len() > self.limits.max_paths {
            return Err(Error::BatchLimitExceeded {
                limit: BatchLimit::Paths,
                attempted: request.paths.len() as u64,
                max: self.limits.max_paths as u64,
            });
        }

        for path in &request.paths {
            validator::validate_delete_target(path, request.root.as_deref())?;
        }

        let mut total = 0u64;
        for path in &request.paths {
            total = total.saturating_add(utils::path_size(path));
            if total > self.limits.max_bytes {
                return Err(Error::BatchLimitExceeded {
                    limit: BatchLimit::Bytes,
                    attempted: total,
                    max: self.limits.max_bytes,
                });
            }
        }
        Ok(total)
    }

    pub fn cleanup(&self, request: &CleanupRequest) -> Result<CleanupResult> {
        let total = self.validate(request)?;
        tracing::info!(
            paths = request.paths.len(),
            bytes = total,
            dry_run = request.dry_run,
            use_trash = request.use_trash,
            "cleanup validated"
        );

        let result =
            batch_deletion::delete_batch(&request.paths, request.use_trash, request.dry_run);
        debug_assert_eq!(result.total(), request.paths.len());
        Ok(result)
    }
}

/// Run a cleanup request with the default batch limits.
pub fn cleanup(request: &CleanupRequest) -> Result<CleanupResult> {
    CleanupEngine::new().cleanup(request)
}
