//! Lenient views over bundle records.
//!
//! Every field is optional so that a damaged record still parses and the
//! checks can say exactly what is wrong with it. Unknown fields are ignored.

use crate::bundle::BundleFiles;
use crate::report::CheckResult;
use evidify_canonical::layout::{EVENTS_FILE, LEDGER_FILE, MANIFEST_FILE, REQUIRED_FILES};
use serde::Deserialize;
use serde_json::Value;

/// One line of `events.jsonl`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EventLine {
    /// Event id.
    pub id: Option<String>,
    /// Sequence number.
    pub seq: Option<u64>,
    /// Type tag.
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    /// Timestamp as written.
    pub timestamp: Option<String>,
    /// Payload; `null` when absent.
    pub payload: Value,
}

/// One element of `ledger.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LedgerLine {
    /// Sequence number.
    pub seq: Option<u64>,
    /// Event id.
    pub event_id: Option<String>,
    /// Timestamp as written.
    pub timestamp: Option<String>,
    /// Type tag.
    pub event_type: Option<String>,
    /// Stored previous hash.
    pub previous_hash: Option<String>,
    /// Stored content hash.
    pub content_hash: Option<String>,
    /// Stored chain hash.
    pub chain_hash: Option<String>,
}

/// The parts of `trial_manifest.json` the checks read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManifestView {
    /// Bundle format version.
    pub export_version: Option<String>,
    /// Record schema version.
    pub schema_version: Option<String>,
    /// Integrity summary.
    pub integrity: Option<IntegrityView>,
    /// Per-file checksums.
    pub file_checksums: Option<ChecksumsView>,
}

/// `integrity` block of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntegrityView {
    /// Claimed event count.
    pub event_count: Option<u64>,
    /// Claimed head hash.
    pub final_hash: Option<String>,
    /// Producer's own chain verdict.
    pub chain_valid: Option<bool>,
}

/// `fileChecksums` block of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChecksumsView {
    /// Claimed hash of `events.jsonl`.
    pub events_file_hash: Option<String>,
    /// Claimed hash of `ledger.json`.
    pub ledger_file_hash: Option<String>,
    /// Claimed hash of `derived_metrics.csv`.
    pub metrics_file_hash: Option<String>,
    /// Claimed hash of `codebook.md`.
    pub codebook_file_hash: Option<String>,
}

/// Parsed bundle; a record set is `None` when its file is missing or malformed.
#[derive(Debug, Default)]
pub struct ParsedBundle {
    /// Manifest view.
    pub manifest: Option<ManifestView>,
    /// Events in file order.
    pub events: Option<Vec<EventLine>>,
    /// Ledger entries in file order.
    pub ledger: Option<Vec<LedgerLine>>,
    /// `MISSING_FILE` / `MALFORMED_FILE` failures found while parsing.
    pub structural: Vec<CheckResult>,
}

impl ParsedBundle {
    /// Parses the required files, recording structural failures.
    pub fn parse(files: &BundleFiles) -> Self {
        let mut parsed = Self::default();

        let missing: Vec<&str> = REQUIRED_FILES
            .into_iter()
            .filter(|name| !files.contains(name) && files.unreadable(name).is_none())
            .collect();
        if !missing.is_empty() {
            parsed.structural.push(CheckResult::structural(
                "MISSING_FILE",
                format!("required file(s) absent: {}", missing.join(", ")),
            ));
        }
        for (name, reason) in files.unreadable_files() {
            parsed.malformed(name, format!("unreadable: {reason}"));
        }

        if let Some(bytes) = files.get(MANIFEST_FILE) {
            match serde_json::from_slice::<ManifestView>(bytes) {
                Ok(manifest) => parsed.manifest = Some(manifest),
                Err(e) => parsed.malformed(MANIFEST_FILE, e.to_string()),
            }
        }
        if let Some(bytes) = files.get(EVENTS_FILE) {
            match parse_jsonl(bytes) {
                Ok(events) => parsed.events = Some(events),
                Err(reason) => parsed.malformed(EVENTS_FILE, reason),
            }
        }
        if let Some(bytes) = files.get(LEDGER_FILE) {
            match serde_json::from_slice::<Vec<LedgerLine>>(bytes) {
                Ok(ledger) => parsed.ledger = Some(ledger),
                Err(e) => parsed.malformed(LEDGER_FILE, e.to_string()),
            }
        }
        parsed
    }

    /// Whether `name` parsed, for the three record files.
    pub fn is_available(&self, name: &str) -> bool {
        match name {
            MANIFEST_FILE => self.manifest.is_some(),
            EVENTS_FILE => self.events.is_some(),
            LEDGER_FILE => self.ledger.is_some(),
            _ => true,
        }
    }

    fn malformed(&mut self, file: &str, reason: String) {
        self.structural.push(CheckResult::structural(
            "MALFORMED_FILE",
            format!("{file}: {reason}"),
        ));
    }
}

fn parse_jsonl(bytes: &[u8]) -> Result<Vec<EventLine>, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {e}"))?;
    let mut events = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str::<EventLine>(line)
            .map_err(|e| format!("line {}: {}", idx + 1, e))?;
        events.push(event);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CheckStatus;
    use evidify_canonical::layout::METRICS_FILE;

    #[test]
    fn damaged_fields_still_parse() {
        let event: EventLine = serde_json::from_str(r#"{"seq": 3, "extra": true}"#).unwrap();
        assert_eq!(event.seq, Some(3));
        assert_eq!(event.id, None);
        assert!(event.payload.is_null());
    }

    #[test]
    fn malformed_line_is_reported_with_its_number() {
        let err = parse_jsonl(b"{\"seq\":0}\n{not json}\n").unwrap_err();
        assert!(err.starts_with("line 2:"), "{err}");
    }

    #[test]
    fn missing_files_are_listed_together() {
        let parsed = ParsedBundle::parse(&BundleFiles::new());
        assert_eq!(parsed.structural.len(), 1);
        let check = &parsed.structural[0];
        assert_eq!(check.name, "MISSING_FILE");
        assert_eq!(check.status, CheckStatus::Fail);
        for name in REQUIRED_FILES {
            assert!(check.message.contains(name));
        }
    }

    #[test]
    fn unreadable_file_is_malformed_not_missing() {
        let mut files = BundleFiles::new();
        files.insert(MANIFEST_FILE, b"{}".to_vec());
        files.insert(EVENTS_FILE, Vec::new());
        files.insert(METRICS_FILE, Vec::new());
        files.mark_unreadable(LEDGER_FILE, "Is a directory");

        let parsed = ParsedBundle::parse(&files);
        assert_eq!(parsed.structural.len(), 1);
        let check = &parsed.structural[0];
        assert_eq!(check.name, "MALFORMED_FILE");
        assert_eq!(check.message, "ledger.json: unreadable: Is a directory");
        assert!(parsed.ledger.is_none());
        assert!(parsed.events.is_some());
    }
}
