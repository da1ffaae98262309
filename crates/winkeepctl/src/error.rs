//! Error handling for winkeepctl.

use std::result;

use thiserror::Error;

/// Convenient result type for winkeepctl operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a store file failed.
    #[error("store error: {0}")]
    Store(#[from] winkeep_store::Error),
    /// The configuration file could not be loaded.
    #[error("{}", .0.pretty())]
    Config(#[from] winkeep_config::Error),
    /// Output serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// No saved state exists for the requested window.
    #[error("no saved state for window {0}")]
    UnknownWindow(String),
}
