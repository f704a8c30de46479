//! Content and chain hash computation.
//!
//! `contentHash = SHA256(canonical_bytes(payload))`
//!
//! `chainHash = SHA256(seq + "|" + previousHash + "|" + eventId + "|" + timestamp + "|" + contentHash)`
//!
//! with `seq` as a base-10 string and both hashes as lowercase hex. The
//! separator is part of the format; identifiers and timestamps are
//! restricted to character sets that cannot contain it.

use crate::canonicalizer::{CanonicalizationError, Canonicalizer};
use crate::digest::{sha256_hex, Digest};
use serde_json::Value;

/// Human-readable statement of the chain-hash input, recorded in manifests.
pub const CHAIN_HASH_FORMAT: &str =
    "SHA256(seq|previousHash|eventId|timestamp|contentHash), seq in base 10, hashes lowercase hex";

/// Field separator inside the chain-hash preimage.
pub const CHAIN_SEPARATOR: char = '|';

/// Hashes the canonical encoding of an event payload.
pub fn content_hash(payload: &Value) -> Result<Digest, CanonicalizationError> {
    let bytes = Canonicalizer::default().canonicalize(payload)?;
    Ok(sha256_hex(&bytes))
}

/// Computes the chain hash binding an entry to its predecessor.
///
/// Takes string views so a verifier can recompute over untrusted,
/// possibly malformed fields without first validating them.
pub fn chain_hash(
    seq: u64,
    previous_hash: &str,
    event_id: &str,
    timestamp: &str,
    content_hash: &str,
) -> Digest {
    let preimage = format!(
        "{seq}{sep}{previous_hash}{sep}{event_id}{sep}{timestamp}{sep}{content_hash}",
        sep = CHAIN_SEPARATOR
    );
    sha256_hex(preimage.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::GENESIS_HASH;
    use serde_json::json;

    #[test]
    fn content_hash_ignores_key_order() {
        let a = content_hash(&json!({"caseId": "C1", "birads": 4})).unwrap();
        let b = content_hash(&json!({"birads": 4, "caseId": "C1"})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn chain_hash_depends_on_every_field() {
        let base = chain_hash(0, GENESIS_HASH, "e1", "2026-01-01T00:00:00.000Z", "ab");
        assert_ne!(base, chain_hash(1, GENESIS_HASH, "e1", "2026-01-01T00:00:00.000Z", "ab"));
        assert_ne!(base, chain_hash(0, "11", "e1", "2026-01-01T00:00:00.000Z", "ab"));
        assert_ne!(base, chain_hash(0, GENESIS_HASH, "e2", "2026-01-01T00:00:00.000Z", "ab"));
        assert_ne!(base, chain_hash(0, GENESIS_HASH, "e1", "2026-01-01T00:00:00.001Z", "ab"));
        assert_ne!(base, chain_hash(0, GENESIS_HASH, "e1", "2026-01-01T00:00:00.000Z", "ac"));
    }
}
