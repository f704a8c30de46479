//! Export bundle layout shared by the packager and the verifier.

/// Bundle manifest file.
pub const MANIFEST_FILE: &str = "trial_manifest.json";
/// One JSON event per line, in `seq` order.
pub const EVENTS_FILE: &str = "events.jsonl";
/// JSON array of ledger entries, in `seq` order.
pub const LEDGER_FILE: &str = "ledger.json";
/// Single-row derived metrics.
pub const METRICS_FILE: &str = "derived_metrics.csv";
/// Human-readable field definitions.
pub const CODEBOOK_FILE: &str = "codebook.md";
/// Output of the most recent verification run.
pub const VERIFIER_OUTPUT_FILE: &str = "verifier_output.json";

/// Files that must be present for a bundle to be checked at all.
pub const REQUIRED_FILES: [&str; 4] = [MANIFEST_FILE, EVENTS_FILE, LEDGER_FILE, METRICS_FILE];

/// Bundle format version written into new manifests.
pub const EXPORT_VERSION: &str = "1.0.0";
/// Record schema version written into new manifests.
pub const SCHEMA_VERSION: &str = "1.0";
/// Timestamps are taken from the recording machine's clock.
pub const TIMESTAMP_TRUST_MODEL: &str = "client_clock_untrusted";
