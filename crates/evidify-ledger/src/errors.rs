use evidify_canonical::CanonicalizationError;
use evidify_core::CoreError;
use thiserror::Error;

/// Errors raised by [`EventLog`](crate::EventLog) operations.
///
/// Every error leaves the log unchanged.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Payload rejected by the event catalogue.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// Payload could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
    /// Durable journal failed; the append was not published.
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
    /// Recomputed chain hash or previous-hash link does not match.
    #[error("chain broken at seq {seq}")]
    ChainBroken {
        /// Position of the first bad entry.
        seq: u64,
    },
    /// Recomputed content hash does not match the stored one.
    #[error("content hash mismatch at seq {seq}")]
    ContentMismatch {
        /// Position of the first bad entry.
        seq: u64,
    },
    /// Event or entry carries the wrong position, id or timestamp.
    #[error("record mismatch at position {expected}: found seq {found}")]
    SeqMismatch {
        /// Expected zero-based position.
        expected: u64,
        /// Sequence number actually found.
        found: u64,
    },
    /// Events and ledger entries differ in count.
    #[error("{events} events but {entries} ledger entries")]
    LengthMismatch {
        /// Number of events.
        events: usize,
        /// Number of ledger entries.
        entries: usize,
    },
    /// A durable log was requested on a journal that already holds records.
    #[error("journal already holds records; recover it instead")]
    JournalNotEmpty,
}

/// Failures reading or writing the session journal file.
#[derive(Error, Debug)]
pub enum JournalError {
    /// Underlying file operation failed.
    #[error("journal I/O: {0}")]
    Io(#[from] std::io::Error),
    /// The file does not start with a usable `EVJ1` header.
    #[error("bad journal header: {0}")]
    InvalidHeader(String),
    #[error("bad frame at byte {offset}: {reason}")]
    #[allow(missing_docs)]
    InvalidFrame { offset: u64, reason: String },
    /// A record would not fit in one frame.
    #[error("record of {size} bytes does not fit a frame (limit {max})")]
    PayloadTooLarge {
        /// Encoded record size.
        size: usize,
        /// Frame payload limit.
        max: u32,
    },
    /// Record bytes are not UTF-8.
    #[error("record is not UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// Record bytes are not an `{event, entry}` object.
    #[error("record does not decode: {0}")]
    Json(#[from] serde_json::Error),
    /// The file has content but is too short to hold a header.
    #[error("existing file is shorter than a journal header")]
    FileNotEmpty,
    /// The file ends inside a frame (strict mode only).
    #[error("journal ends mid-frame at byte {offset}")]
    TruncatedFrame {
        /// Where the incomplete frame starts.
        offset: u64,
    },
}
