use crate::clock::{format_timestamp, Clock, SystemClock};
use crate::entry::{JournalRecord, LedgerEntry};
use crate::errors::{JournalError, LedgerError};
use crate::reader::{JournalReader, ReadMode};
use crate::verification::{verify_chain, verify_record};
use crate::writer::{JournalWriter, WriteOptions};
use evidify_canonical::{chain_hash, content_hash, Digest, EventId, SessionId};
use evidify_core::{Event, EventPayload, EventType};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Append-only event log for one session.
///
/// The log is the only source of `seq`, `timestamp` and event ids. It has a
/// single writer: [`append`](Self::append) takes `&mut self`, so concurrent
/// callers must serialize through whatever owns the log.
pub struct EventLog {
    events: Vec<Event>,
    ledger: Vec<LedgerEntry>,
    clock: Box<dyn Clock>,
    journal: Option<JournalWriter>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Creates an empty in-memory log stamped by the wall clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Creates an empty in-memory log with a custom clock.
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            events: Vec::new(),
            ledger: Vec::new(),
            clock: Box::new(clock),
            journal: None,
        }
    }

    /// Creates an empty log that journals every append to `path`.
    ///
    /// Fails with [`LedgerError::JournalNotEmpty`] if the journal already
    /// holds records; use [`recover`](Self::recover) for those.
    pub fn with_journal<P: AsRef<Path>>(
        path: P,
        options: WriteOptions,
        clock: impl Clock + 'static,
    ) -> Result<Self, LedgerError> {
        let writer = JournalWriter::open(path, options)?;
        if !writer.is_empty() {
            return Err(LedgerError::JournalNotEmpty);
        }
        let mut log = Self::with_clock(clock);
        log.journal = Some(writer);
        Ok(log)
    }

    /// Rebuilds a log from its journal, recomputing every hash.
    ///
    /// In [`ReadMode::Permissive`] a truncated tail frame is dropped from the
    /// file before further appends. The returned log keeps journaling to
    /// `path`.
    pub fn recover<P: AsRef<Path>>(
        path: P,
        mode: ReadMode,
        clock: impl Clock + 'static,
    ) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let mut reader = JournalReader::open(path, mode)?;
        let mut log = Self::with_clock(clock);

        while let Some(JournalRecord { event, entry }) = reader.read_record()? {
            let seq = log.events.len() as u64;
            verify_record(seq, &log.head_hash(), &event, &entry)?;
            log.events.push(event);
            log.ledger.push(entry);
        }

        let mut writer = JournalWriter::open(path, WriteOptions::default())?;
        let valid_len = reader.valid_len();
        let file_len = std::fs::metadata(path)
            .map_err(JournalError::from)?
            .len();
        if valid_len < file_len {
            warn!(
                dropped_bytes = file_len - valid_len,
                "discarding truncated journal tail"
            );
            writer.truncate(valid_len)?;
        }
        log.journal = Some(writer);

        info!(events = log.events.len(), head = %log.head_hash(), "session journal recovered");
        Ok(log)
    }

    /// Validates `payload` and appends it.
    ///
    /// Assigns `seq`, timestamp and id; computes content and chain hash;
    /// journals the pair if a journal is attached; then publishes both
    /// records. Any error leaves the log unchanged.
    pub fn append(&mut self, payload: EventPayload) -> Result<(Event, LedgerEntry), LedgerError> {
        payload.validate()?;
        let payload_json = payload.to_json()?;
        let content_hash = content_hash(&payload_json)?;

        let seq = self.events.len() as u64;
        let id = EventId::new(Uuid::new_v4().to_string());
        let timestamp = format_timestamp(self.clock.now());
        let previous_hash = self.head_hash();
        let chain_hash = chain_hash(
            seq,
            previous_hash.as_str(),
            id.as_str(),
            timestamp.as_str(),
            content_hash.as_str(),
        );

        let event = Event {
            id,
            seq,
            timestamp,
            payload,
        };
        let entry = LedgerEntry {
            seq,
            event_id: event.id.clone(),
            timestamp: event.timestamp.clone(),
            event_type: event.event_type(),
            previous_hash,
            content_hash,
            chain_hash,
        };

        let record = JournalRecord { event, entry };
        if let Some(journal) = self.journal.as_mut() {
            journal.append_record(&record)?;
        }

        debug!(
            seq,
            event_type = %record.entry.event_type,
            chain_hash = %record.entry.chain_hash,
            "event appended"
        );
        self.events.push(record.event.clone());
        self.ledger.push(record.entry.clone());
        Ok((record.event, record.entry))
    }

    /// Parses an untyped `(type, payload)` pair and appends it.
    pub fn append_json(
        &mut self,
        event_type: &str,
        payload: Value,
    ) -> Result<(Event, LedgerEntry), LedgerError> {
        let event_type: EventType = event_type.parse()?;
        let payload = EventPayload::from_json(event_type, payload)?;
        self.append(payload)
    }

    /// Events in `seq` order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Ledger entries in `seq` order.
    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    /// Most recent ledger entry.
    pub fn last(&self) -> Option<&LedgerEntry> {
        self.ledger.last()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Chain hash of the last entry, or genesis.
    pub fn head_hash(&self) -> Digest {
        self.last()
            .map(|entry| entry.chain_hash.clone())
            .unwrap_or_else(Digest::genesis)
    }

    /// Recomputes the whole chain from stored fields.
    pub fn verify_chain(&self) -> Result<Digest, LedgerError> {
        verify_chain(&self.events, &self.ledger)
    }

    /// Frozen copy of the current contents.
    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            events: self.events.clone(),
            ledger: self.ledger.clone(),
        }
    }
}

/// Immutable copy of a log taken at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSnapshot {
    events: Vec<Event>,
    ledger: Vec<LedgerEntry>,
}

impl LogSnapshot {
    /// Builds a snapshot from records read elsewhere, e.g. a journal.
    ///
    /// Nothing is checked here; consumers call
    /// [`verify_chain`](Self::verify_chain) before trusting the pair.
    pub fn from_parts(events: Vec<Event>, ledger: Vec<LedgerEntry>) -> Self {
        Self { events, ledger }
    }

    /// Events in `seq` order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Ledger entries in `seq` order.
    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Chain hash of the last entry, or genesis.
    pub fn final_hash(&self) -> Digest {
        self.ledger
            .last()
            .map(|entry| entry.chain_hash.clone())
            .unwrap_or_else(Digest::genesis)
    }

    /// Session id from the first `SESSION_STARTED` event.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.events.iter().find_map(|event| match &event.payload {
            EventPayload::SessionStarted(p) => Some(&p.session_id),
            _ => None,
        })
    }

    /// Recomputes the whole chain from stored fields.
    pub fn verify_chain(&self) -> Result<Digest, LedgerError> {
        verify_chain(&self.events, &self.ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use evidify_canonical::{CaseId, GENESIS_HASH};
    use evidify_core::{CaseLoaded, CoreError, FirstImpressionLocked};
    use serde_json::json;

    fn fixed_log() -> EventLog {
        EventLog::with_clock(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn first_entry_links_to_genesis() {
        let mut log = fixed_log();
        let (event, entry) = log
            .append_json("SESSION_STARTED", json!({"sessionId": "S1"}))
            .unwrap();
        assert_eq!(event.seq, 0);
        assert_eq!(entry.previous_hash.as_str(), GENESIS_HASH);
        assert_eq!(entry.timestamp.as_str(), "2026-01-01T00:00:00.000Z");
        assert_eq!(log.last(), Some(&entry));
    }

    #[test]
    fn rejected_payload_leaves_log_unchanged() {
        let mut log = fixed_log();
        log.append_json("SESSION_STARTED", json!({"sessionId": "S1"}))
            .unwrap();
        let head = log.head_hash();

        let err = log
            .append(EventPayload::FirstImpressionLocked(FirstImpressionLocked {
                case_id: CaseId::new("C1".into()),
                birads: 9,
                confidence: 3,
                time_to_lock_ms: None,
            }))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::InvalidPayload { .. })));
        assert_eq!(log.len(), 1);
        assert_eq!(log.head_hash(), head);

        assert!(matches!(
            log.append_json("NOT_A_TYPE", json!({})),
            Err(LedgerError::Core(CoreError::UnknownEventType(_)))
        ));
        assert!(matches!(
            log.append_json("CASE_LOADED", json!({"caseId": "C1", "extra": 1})),
            Err(LedgerError::Core(CoreError::Schema { .. }))
        ));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn snapshot_is_detached_from_later_appends() {
        let mut log = fixed_log();
        log.append(EventPayload::CaseLoaded(CaseLoaded {
            case_id: CaseId::new("C1".into()),
            is_calibration: false,
        }))
        .unwrap();
        let snapshot = log.snapshot();
        log.append_json("SESSION_ENDED", json!({})).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(snapshot.final_hash(), log.ledger()[0].chain_hash);
    }

    #[test]
    fn event_ids_are_unique_uuids() {
        let mut log = fixed_log();
        let (a, _) = log.append_json("SESSION_ENDED", json!({})).unwrap();
        let (b, _) = log.append_json("SESSION_ENDED", json!({})).unwrap();
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(a.id.as_str()).is_ok());
    }

    #[test]
    fn empty_log_verifies_to_genesis() {
        let log = fixed_log();
        assert!(log.is_empty());
        assert!(log.last().is_none());
        assert!(log.verify_chain().unwrap().is_genesis());
    }
}
