//! Shared environment configuration for the pricing binaries.
//!
//! Consolidates `PRICING_BASE_PATH`, `RAYON_NUM_THREADS` and `PRICING_LOG`
//! reads shared by both binaries.

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Install the global tracing subscriber. Filter comes from `PRICING_LOG`
/// (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("PRICING_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    // A second install (e.g. from tests) is not an error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Read `PRICING_BASE_PATH` (default `"."`) and chdir into it.
pub fn init_base_path() -> Result<PathBuf> {
    let base_path = std::env::var("PRICING_BASE_PATH").unwrap_or_else(|_| ".".to_string());
    std::env::set_current_dir(&base_path)?;
    let cwd = std::env::current_dir()?;
    info!(base_path = %base_path, cwd = %cwd.display(), "working directory set");
    Ok(PathBuf::from(base_path))
}

/// Thread count from `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`), if set.
pub fn configured_threads() -> Option<usize> {
    std::env::var("RAYON_NUM_THREADS")
        .or_else(|_| std::env::var("OMP_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n| n > 0)
}

/// Build the rayon global pool from [`configured_threads`], tolerating an
/// already-initialized pool. Returns the thread count in effect.
pub fn init_rayon_threads() -> usize {
    if let Some(num_threads) = configured_threads() {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok();
    }
    let num_threads = rayon::current_num_threads();
    info!(threads = num_threads, "rayon pool ready");
    num_threads
}
