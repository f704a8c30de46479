//! Export bundles for Evidify sessions.
//!
//! [`ExportPackager`] turns a frozen [`LogSnapshot`](evidify_ledger::LogSnapshot)
//! and its [`DerivedMetrics`](evidify_core::DerivedMetrics) into an
//! [`ExportBundle`]: the events file, the ledger file, a metrics CSV, a
//! codebook and a manifest that pins the SHA-256 of each of them.
//!
//! Packaging is a pure function of its inputs. Running it twice over the
//! same snapshot yields byte-identical files.

#![deny(missing_docs)]

/// In-memory bundle and directory write-out.
pub mod bundle;
/// Codebook generation.
pub mod codebook;
/// Single-row CSV writer.
pub mod csv;
/// Error types for export operations.
pub mod error;
/// Manifest types.
pub mod manifest;
/// Snapshot packaging.
pub mod packager;

pub use bundle::ExportBundle;
pub use error::ExportError;
pub use manifest::{FileChecksums, Integrity, TrialManifest};
pub use packager::{ExportOptions, ExportPackager};
