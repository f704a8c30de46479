use crate::entry::LedgerEntry;
use crate::errors::LedgerError;
use evidify_canonical::{chain_hash, content_hash, Digest};
use evidify_core::Event;

/// Recomputes one entry against its event and predecessor.
pub fn verify_record(
    expected_seq: u64,
    previous_hash: &Digest,
    event: &Event,
    entry: &LedgerEntry,
) -> Result<(), LedgerError> {
    if event.seq != expected_seq || entry.seq != expected_seq {
        return Err(LedgerError::SeqMismatch {
            expected: expected_seq,
            found: if event.seq != expected_seq { event.seq } else { entry.seq },
        });
    }
    if entry.event_id != event.id
        || entry.timestamp != event.timestamp
        || entry.event_type != event.event_type()
    {
        return Err(LedgerError::SeqMismatch {
            expected: expected_seq,
            found: entry.seq,
        });
    }

    if content_hash(&event.payload.to_json()?)? != entry.content_hash {
        return Err(LedgerError::ContentMismatch { seq: expected_seq });
    }

    let recomputed = chain_hash(
        entry.seq,
        entry.previous_hash.as_str(),
        entry.event_id.as_str(),
        entry.timestamp.as_str(),
        entry.content_hash.as_str(),
    );
    if &entry.previous_hash != previous_hash || recomputed != entry.chain_hash {
        return Err(LedgerError::ChainBroken { seq: expected_seq });
    }
    Ok(())
}

/// Recomputes every content and chain hash; returns the head hash.
///
/// An empty log verifies to genesis.
pub fn verify_chain(events: &[Event], ledger: &[LedgerEntry]) -> Result<Digest, LedgerError> {
    if events.len() != ledger.len() {
        return Err(LedgerError::LengthMismatch {
            events: events.len(),
            entries: ledger.len(),
        });
    }
    let mut head = Digest::genesis();
    for (seq, (event, entry)) in (0u64..).zip(events.iter().zip(ledger)) {
        verify_record(seq, &head, event, entry)?;
        head = entry.chain_hash.clone();
    }
    Ok(head)
}
