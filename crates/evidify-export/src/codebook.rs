use evidify_canonical::layout::{
    CODEBOOK_FILE, EVENTS_FILE, LEDGER_FILE, MANIFEST_FILE, METRICS_FILE, SCHEMA_VERSION,
    TIMESTAMP_TRUST_MODEL, VERIFIER_OUTPUT_FILE,
};
use evidify_canonical::{CHAIN_HASH_FORMAT, GENESIS_HASH};
use evidify_core::{EventType, METRIC_FIELDS, TOO_FAST_THRESHOLD_MS};
use std::fmt::Write;

/// Renders `codebook.md` from the event catalogue and metrics field list.
///
/// The text depends on nothing but compiled-in definitions.
pub fn render_codebook() -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_codebook(&mut out);
    out
}

fn write_codebook(out: &mut String) -> std::fmt::Result {
    writeln!(out, "# Evidify Export Codebook")?;
    writeln!(out)?;
    writeln!(out, "Schema version: {SCHEMA_VERSION}")?;
    writeln!(out)?;

    writeln!(out, "## Files")?;
    writeln!(out)?;
    writeln!(out, "| File | Contents |")?;
    writeln!(out, "|---|---|")?;
    for (file, contents) in [
        (MANIFEST_FILE, "Bundle metadata, integrity summary and file checksums"),
        (EVENTS_FILE, "One JSON event per line in seq order"),
        (LEDGER_FILE, "JSON array of hash-chain entries in seq order"),
        (METRICS_FILE, "Derived metrics, one header row and one value row"),
        (CODEBOOK_FILE, "This document (informational, not verified)"),
        (VERIFIER_OUTPUT_FILE, "Result of the most recent verification run (optional)"),
    ] {
        writeln!(out, "| `{file}` | {contents} |")?;
    }
    writeln!(out)?;

    writeln!(out, "## Hashing")?;
    writeln!(out)?;
    writeln!(out, "- Algorithm: SHA-256, lowercase hex")?;
    writeln!(
        out,
        "- contentHash: SHA-256 of the canonical JSON bytes of the event payload \
         (keys sorted by UTF-8 bytes, NFC strings, no whitespace)"
    )?;
    writeln!(out, "- chainHash: {CHAIN_HASH_FORMAT}")?;
    writeln!(out, "- Genesis previousHash: `{GENESIS_HASH}`")?;
    writeln!(out, "- Timestamp trust model: `{TIMESTAMP_TRUST_MODEL}`")?;
    writeln!(out)?;

    writeln!(out, "## Event Types")?;
    writeln!(out)?;
    writeln!(out, "| Type | Description |")?;
    writeln!(out, "|---|---|")?;
    for event_type in EventType::ALL {
        writeln!(out, "| `{}` | {} |", event_type, event_type.description())?;
    }
    writeln!(out)?;

    writeln!(out, "## Derived Metrics")?;
    writeln!(out)?;
    writeln!(
        out,
        "Empty cells mean the defining event was not recorded. \
         Timing flags use a {TOO_FAST_THRESHOLD_MS} ms threshold."
    )?;
    writeln!(out)?;
    writeln!(out, "| Column | Type | Description |")?;
    writeln!(out, "|---|---|---|")?;
    for field in METRIC_FIELDS {
        writeln!(
            out,
            "| `{}` | {} | {} |",
            field.name,
            field.kind.as_str(),
            field.description
        )?;
    }
    Ok(())
}
