//! Independent verifier for Evidify export bundles.
//!
//! The verifier reads nothing but the bundle files and the format
//! definitions in `evidify-canonical`. It recomputes every content hash,
//! chain link and file checksum from raw bytes and never trusts a stored
//! validity flag.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use evidify_verify::{verify_dir, VerifierPolicy, VerifierResult};
//!
//! let output = verify_dir("exports/S1", &VerifierPolicy::default())?;
//! for check in &output.checks {
//!     println!("{:<28} {:?} {}", check.name, check.status, check.message);
//! }
//! assert_eq!(output.result, VerifierResult::Pass);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`verify`] never fails: a missing or corrupted file becomes a FAIL check
//! and every other check still runs.

#![deny(missing_docs)]

/// Bundle file access.
pub mod bundle;
/// The ordered verification checks.
pub mod checks;
/// Error types for loading bundles and policies.
pub mod errors;
/// Verification policy.
pub mod policy;
/// Lenient views over bundle records.
pub mod records;
/// Verifier output types.
pub mod report;
/// Verification entry points.
pub mod verifier;

pub use bundle::BundleFiles;
pub use errors::BundleError;
pub use policy::{CheckKind, Severity, VerifierPolicy};
pub use report::{CheckResult, CheckStatus, Summary, VerifierOutput, VerifierResult};
pub use verifier::{verify, verify_dir, Verifier, NOT_EVALUATED, NO_CHECKS_RUN};
