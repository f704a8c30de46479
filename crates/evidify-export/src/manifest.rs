use evidify_canonical::{Digest, DigestAlg};
use serde::{Deserialize, Serialize};

/// Bundle manifest (`trial_manifest.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialManifest {
    /// Bundle format version.
    pub export_version: String,
    /// Record schema version.
    pub schema_version: String,
    /// Session id from `SESSION_STARTED`, if recorded.
    pub session_id: Option<String>,
    /// Timestamp of the last event in the snapshot.
    pub snapshot_at: Option<String>,
    /// Digest used for every hash in the bundle.
    pub hash_algorithm: DigestAlg,
    /// Statement of the chain-hash preimage.
    pub chain_hash_format: String,
    /// Previous-hash value of the first entry.
    pub genesis_hash: String,
    /// How far event timestamps can be trusted.
    pub timestamp_trust_model: String,
    /// Counts and head hash of the snapshot.
    pub integrity: Integrity,
    /// SHA-256 of each artifact file's bytes.
    pub file_checksums: FileChecksums,
}

/// Integrity summary of the packaged log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrity {
    /// Number of events.
    pub event_count: u64,
    /// Chain hash of the last entry, or genesis.
    pub final_hash: Digest,
    /// Result of the packager's own chain recomputation.
    pub chain_valid: bool,
}

/// Per-file checksums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChecksums {
    /// `events.jsonl`.
    pub events_file_hash: Digest,
    /// `ledger.json`.
    pub ledger_file_hash: Digest,
    /// `derived_metrics.csv`.
    pub metrics_file_hash: Digest,
    /// `codebook.md`.
    pub codebook_file_hash: Digest,
}
