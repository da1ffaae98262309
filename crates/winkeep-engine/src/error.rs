//! Error type for the window manager.

use std::result::Result as StdResult;

use thiserror::Error;
use winkeep_ids::WindowId;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the persistence engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The window is unknown or its native handle was destroyed.
    #[error("window {0} is not live")]
    StaleHandle(WindowId),

    /// Reading or writing persisted state failed.
    #[error("store error: {0}")]
    Store(#[from] winkeep_store::Error),

    /// Several writes failed during one save.
    #[error("{} store writes failed: {}", .0.len(), join(.0))]
    Partial(Vec<winkeep_store::Error>),
}

/// Render several store errors on one line.
fn join(errs: &[winkeep_store::Error]) -> String {
    errs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
