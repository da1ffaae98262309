//! Error types for the persistence layer.

use std::{io, path::PathBuf, result};

use thiserror::Error;

/// Convenient result type for store operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors produced while reading or writing persisted state.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem failure while reading or replacing a store file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A store file exists but is not a JSON object.
    #[error("malformed store file {}: {source}", path.display())]
    Malformed {
        /// File that failed to parse.
        path: PathBuf,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// A value could not be converted to or from its typed form.
    #[error("value under key '{key}' has an unexpected shape: {source}")]
    Shape {
        /// Key holding the offending value.
        key: String,
        /// Conversion failure.
        #[source]
        source: serde_json::Error,
    },
    /// The backing store refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
