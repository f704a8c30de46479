use std::path::PathBuf;
use thiserror::Error;

/// Errors raised before verification can start.
///
/// Only the bundle location itself can fail; problems inside the bundle
/// are reported as checks.
#[derive(Error, Debug)]
pub enum BundleError {
    /// The bundle directory does not exist or is not a directory.
    #[error("bundle directory not found: {}", .0.display())]
    NotFound(PathBuf),
    /// A directory or policy file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Policy file is not valid policy JSON.
    #[error("invalid policy: {0}")]
    Policy(#[from] serde_json::Error),
}
