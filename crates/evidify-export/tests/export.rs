use chrono::{Duration, TimeZone, Utc};
use evidify_canonical::layout::{EVENTS_FILE, MANIFEST_FILE, REQUIRED_FILES, VERIFIER_OUTPUT_FILE};
use evidify_canonical::{sha256_hex, GENESIS_HASH};
use evidify_core::{compute_metrics, EventPayload, EventType, METRIC_FIELDS};
use evidify_export::{ExportError, ExportPackager, TrialManifest};
use evidify_ledger::{EventLog, LogSnapshot, SteppingClock};
use serde_json::{json, Value};
use tempfile::TempDir;

fn session_log() -> EventLog {
    let mut log = EventLog::with_clock(SteppingClock::new(
        Utc.with_ymd_and_hms(2026, 2, 10, 14, 0, 0).unwrap(),
        Duration::milliseconds(1200),
    ));
    log.append_json("SESSION_STARTED", json!({"sessionId": "S1", "readerId": "R7"}))
        .unwrap();
    log.append_json("RANDOMIZATION_ASSIGNED", json!({"condition": "HUMAN_FIRST"}))
        .unwrap();
    log.append_json("CASE_LOADED", json!({"caseId": "C1"}))
        .unwrap();
    log.append_json(
        "FIRST_IMPRESSION_LOCKED",
        json!({"caseId": "C1", "birads": 3, "confidence": 2}),
    )
    .unwrap();
    log.append_json(
        "AI_REVEALED",
        json!({"caseId": "C1", "suggestedBirads": 4, "aiConfidence": 0.91}),
    )
    .unwrap();
    log.append_json(
        "FINAL_ASSESSMENT",
        json!({"caseId": "C1", "birads": 4, "confidence": 3}),
    )
    .unwrap();
    log
}

#[test]
fn packaging_twice_is_byte_identical() {
    let log = session_log();
    let packager = ExportPackager::default();
    let first = packager.export(&log).unwrap();
    let second = packager.export(&log).unwrap();
    assert_eq!(first, second);
}

#[test]
fn manifest_pins_counts_and_file_bytes() {
    let log = session_log();
    let bundle = ExportPackager::default().export(&log).unwrap();
    let manifest = &bundle.manifest;

    assert_eq!(manifest.export_version, "1.0.0");
    assert_eq!(manifest.schema_version, "1.0");
    assert_eq!(manifest.session_id.as_deref(), Some("S1"));
    assert_eq!(manifest.timestamp_trust_model, "client_clock_untrusted");
    assert_eq!(manifest.integrity.event_count, 6);
    assert_eq!(manifest.integrity.final_hash, log.head_hash());
    assert!(manifest.integrity.chain_valid);
    assert_eq!(
        manifest.snapshot_at.as_deref(),
        Some(log.events()[5].timestamp.as_str())
    );

    let checksums = &manifest.file_checksums;
    assert_eq!(checksums.events_file_hash, sha256_hex(&bundle.events_jsonl));
    assert_eq!(checksums.ledger_file_hash, sha256_hex(&bundle.ledger_json));
    assert_eq!(checksums.metrics_file_hash, sha256_hex(&bundle.metrics_csv));
    assert_eq!(checksums.codebook_file_hash, sha256_hex(&bundle.codebook_md));

    let parsed: TrialManifest = serde_json::from_slice(&bundle.manifest_json).unwrap();
    assert_eq!(&parsed, manifest);
    let raw: Value = serde_json::from_slice(&bundle.manifest_json).unwrap();
    assert_eq!(raw["hashAlgorithm"], "sha-256");
    assert_eq!(raw["integrity"]["eventCount"], 6);
}

#[test]
fn events_file_has_one_line_per_event() {
    let log = session_log();
    let bundle = ExportPackager::default().export(&log).unwrap();
    let text = String::from_utf8(bundle.events_jsonl.clone()).unwrap();
    assert!(text.ends_with('\n'));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    for (seq, line) in lines.iter().enumerate() {
        let value: Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["seq"], seq);
        assert!(value.get("payload").is_some());
    }
    let ledger: Vec<Value> = serde_json::from_slice(&bundle.ledger_json).unwrap();
    assert_eq!(ledger.len(), 6);
}

#[test]
fn metrics_csv_has_header_and_one_row() {
    let log = session_log();
    let bundle = ExportPackager::default().export(&log).unwrap();
    let text = String::from_utf8(bundle.metrics_csv.clone()).unwrap();
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows.len(), 2);
    let header: Vec<&str> = rows[0].split(',').collect();
    let values: Vec<&str> = rows[1].split(',').collect();
    assert_eq!(header.len(), METRIC_FIELDS.len());
    assert_eq!(values.len(), METRIC_FIELDS.len());

    let cell = |name: &str| values[header.iter().position(|h| *h == name).unwrap()];
    assert_eq!(cell("sessionId"), "S1");
    assert_eq!(cell("condition"), "HUMAN_FIRST");
    assert_eq!(cell("adda"), "true");
    assert_eq!(cell("aiConfidence"), "0.91");
    // No comprehension response was recorded.
    assert_eq!(cell("comprehensionCorrect"), "");
}

#[test]
fn empty_log_exports_genesis() {
    let log = EventLog::new();
    let bundle = ExportPackager::default().export(&log).unwrap();
    assert_eq!(bundle.manifest.integrity.event_count, 0);
    assert_eq!(bundle.manifest.integrity.final_hash.as_str(), GENESIS_HASH);
    assert_eq!(bundle.manifest.session_id, None);
    assert_eq!(bundle.manifest.snapshot_at, None);
    assert!(bundle.events_jsonl.is_empty());
    assert_eq!(bundle.ledger_json, b"[]\n");
}

#[test]
fn invalid_chain_is_refused() {
    let log = session_log();
    let snapshot = log.snapshot();
    let mut events = snapshot.events().to_vec();
    events[2].payload =
        EventPayload::from_json(EventType::CaseLoaded, json!({"caseId": "C2"})).unwrap();
    let forged = LogSnapshot::from_parts(events, snapshot.ledger().to_vec());

    let metrics = compute_metrics(forged.events());
    assert!(matches!(
        ExportPackager::default().package(&forged, &metrics),
        Err(ExportError::ChainInvalid(_))
    ));
}

#[test]
fn snapshot_ignores_later_appends() {
    let mut log = session_log();
    let packager = ExportPackager::default();
    let metrics = compute_metrics(log.events());
    let before = packager.snapshot(&log, &metrics).unwrap();
    log.append_json("SESSION_ENDED", json!({})).unwrap();
    assert_eq!(before.manifest.integrity.event_count, 6);
    assert_eq!(log.len(), 7);
}

#[test]
fn write_to_dir_creates_every_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("bundle");
    let bundle = ExportPackager::default()
        .export(&session_log())
        .unwrap()
        .with_verifier_output(b"{}\n".to_vec());
    bundle.write_to_dir(&out).unwrap();

    for name in REQUIRED_FILES {
        assert!(out.join(name).is_file(), "missing {name}");
    }
    assert!(out.join("codebook.md").is_file());
    assert!(out.join(VERIFIER_OUTPUT_FILE).is_file());
    assert_eq!(
        std::fs::read(out.join(EVENTS_FILE)).unwrap(),
        bundle.events_jsonl
    );
    assert_eq!(
        std::fs::read(out.join(MANIFEST_FILE)).unwrap(),
        bundle.manifest_json
    );
}
