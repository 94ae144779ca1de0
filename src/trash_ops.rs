//! Thin wrapper around the `trash` crate.
//!
//! On Windows `trash` drives COM shell APIs and can panic when COM was already
//! initialized on the thread with a different concurrency model (HRESULT
//! `0x80010106`, `RPC_E_CHANGED_MODE`). Panics are turned into errors so one
//! bad path fails on its own instead of aborting the whole cleanup batch.

use crate::utils;
use anyhow::{anyhow, Result};
use std::path::Path;

pub fn delete(path: &Path) -> Result<()> {
    match utils::catch_panic(|| trash::delete(path)) {
        Ok(result) => Ok(result?),
        Err(msg) => Err(anyhow!("trash operation panicked (dependency bug): {msg}")),
    }
}
