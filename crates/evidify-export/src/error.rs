use evidify_ledger::LedgerError;
use thiserror::Error;

/// Errors raised while packaging or writing a bundle.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The snapshot's own chain does not recompute; nothing is packaged.
    #[error("refusing to export: {0}")]
    ChainInvalid(#[source] LedgerError),
    /// An artifact could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Writing the bundle directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
