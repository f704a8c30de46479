use evidify_canonical::{Digest, EventId, Timestamp};
use evidify_core::{Event, EventType};
use serde::{Deserialize, Serialize};

/// Hash-chain record produced alongside each [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Position of the event in the log.
    pub seq: u64,
    /// Id of the event this entry covers.
    pub event_id: EventId,
    /// Timestamp of the event.
    pub timestamp: Timestamp,
    /// Type tag of the event.
    pub event_type: EventType,
    /// Chain hash of the previous entry, or genesis at `seq == 0`.
    pub previous_hash: Digest,
    /// SHA-256 of the canonical payload bytes.
    pub content_hash: Digest,
    /// SHA-256 over `seq|previousHash|eventId|timestamp|contentHash`.
    pub chain_hash: Digest,
}

/// One journal frame: the event and its ledger entry, written together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    /// The recorded event.
    pub event: Event,
    /// Its ledger entry.
    pub entry: LedgerEntry,
}
