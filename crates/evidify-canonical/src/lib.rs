//! Canonical data model primitives for Evidify event ledgers and export bundles.
//!
//! Everything that participates in hashing lives in this crate: the
//! canonical byte encoding of payloads, the SHA-256 digest type, and the
//! chain-hash formula that links ledger entries. Both the ledger writer and
//! the independent verifier depend on this crate and on nothing else from
//! each other, so the format is defined exactly once.
//!
#![deny(missing_docs)]

/// Canonicalization helpers for deterministic hashing.
pub mod canonicalizer;
/// Content and chain hash computation.
pub mod chain;
/// SHA-256 digest primitives.
pub mod digest;
/// Identifier newtypes shared across the ledger format.
pub mod identifiers;
/// File names and version strings of the export bundle.
pub mod layout;
/// Validation helpers used by canonical types.
pub mod validation;

pub use canonicalizer::{canonicalize, format_number, CanonicalizationError, Canonicalizer};
pub use chain::{chain_hash, content_hash, CHAIN_HASH_FORMAT};
pub use digest::{sha256_hex, Digest, DigestAlg, GENESIS_HASH};
pub use identifiers::{CaseId, EventId, ReaderId, SessionId, Timestamp};
pub use validation::ValidationError;
