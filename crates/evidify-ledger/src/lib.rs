//! Append-only, hash-chained event log for Evidify sessions.
//!
//! This crate provides:
//! - [`EventLog`], the single-writer log that issues `seq`, timestamps and
//!   event ids and produces matched [`Event`] / [`LedgerEntry`] pairs
//! - [`LogSnapshot`], the frozen copy export and verification operate on
//! - A framed append-only session journal ([`JournalWriter`],
//!   [`JournalReader`]) for durable logs and crash recovery
//! - Chain self-checks shared by recovery and export
//!
//! ## Quick Start
//!
//! ```rust
//! use evidify_canonical::{CaseId, SessionId};
//! use evidify_core::{CaseLoaded, EventPayload, SessionStarted};
//! use evidify_ledger::EventLog;
//!
//! let mut log = EventLog::new();
//! log.append(EventPayload::SessionStarted(SessionStarted {
//!     session_id: SessionId::parse("S1")?,
//!     reader_id: None,
//!     protocol_id: None,
//! }))?;
//! let (_, entry) = log.append(EventPayload::CaseLoaded(CaseLoaded {
//!     case_id: CaseId::parse("C1")?,
//!     is_calibration: false,
//! }))?;
//!
//! assert_eq!(entry.previous_hash, log.ledger()[0].chain_hash);
//! log.verify_chain()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Core invariants:
//! - `seq` is the zero-based position in the log, assigned by the log
//! - `previousHash` of entry `i` is `chainHash` of entry `i - 1` (genesis at 0)
//! - events and ledger entries are published together or not at all

#![deny(missing_docs)]

/// Time sources for event timestamps.
pub mod clock;
/// Ledger entry and journal record types.
pub mod entry;
/// Error types for ledger and journal operations.
pub mod errors;
/// Journal frame structure and serialization.
pub mod frame;
/// The event log and its snapshots.
pub mod log;
/// Journal reader implementation.
pub mod reader;
/// Chain recomputation over events and ledger entries.
pub mod verification;
/// Journal writer implementation.
pub mod writer;

pub use clock::{format_timestamp, Clock, FixedClock, SteppingClock, SystemClock};
pub use entry::{JournalRecord, LedgerEntry};
pub use errors::{JournalError, LedgerError};
pub use evidify_core::Event;
pub use frame::{FrameKind, JournalHeader, RecordFrame};
pub use log::{EventLog, LogSnapshot};
pub use reader::{JournalReader, ReadMode};
pub use verification::{verify_chain, verify_record};
pub use writer::{JournalWriter, WriteOptions};
