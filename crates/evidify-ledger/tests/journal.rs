use chrono::{Duration, TimeZone, Utc};
use evidify_ledger::frame::MAX_PAYLOAD_SIZE;
use evidify_ledger::{
    EventLog, FrameKind, JournalError, JournalReader, JournalWriter, LedgerError, ReadMode,
    SteppingClock, WriteOptions,
};
use serde_json::json;
use std::fs::{self, OpenOptions};
use std::io::Write;
use tempfile::TempDir;

fn clock() -> SteppingClock {
    SteppingClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        Duration::seconds(1),
    )
}

fn durable_log(dir: &TempDir, events: usize) -> std::path::PathBuf {
    let path = dir.path().join("session.evj");
    let mut log = EventLog::with_journal(&path, WriteOptions::default(), clock()).unwrap();
    log.append_json("SESSION_STARTED", json!({"sessionId": "S1"}))
        .unwrap();
    for i in 1..events {
        log.append_json("CASE_LOADED", json!({"caseId": format!("C{i}")}))
            .unwrap();
    }
    path
}

#[test]
fn recover_rebuilds_the_same_chain() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.evj");
    let mut log = EventLog::with_journal(&path, WriteOptions::default(), clock()).unwrap();
    log.append_json("SESSION_STARTED", json!({"sessionId": "S1"}))
        .unwrap();
    log.append_json("CASE_LOADED", json!({"caseId": "C1"}))
        .unwrap();
    let expected = log.snapshot();
    drop(log);

    let recovered = EventLog::recover(&path, ReadMode::Strict, clock()).unwrap();
    assert_eq!(recovered.snapshot(), expected);
}

#[test]
fn recovered_log_keeps_appending() {
    let dir = TempDir::new().unwrap();
    let path = durable_log(&dir, 3);

    let mut log = EventLog::recover(&path, ReadMode::Strict, clock()).unwrap();
    let head = log.head_hash();
    let (event, entry) = log.append_json("SESSION_ENDED", json!({})).unwrap();
    assert_eq!(event.seq, 3);
    assert_eq!(entry.previous_hash, head);
    drop(log);

    let log = EventLog::recover(&path, ReadMode::Strict, clock()).unwrap();
    assert_eq!(log.len(), 4);
    log.verify_chain().unwrap();
}

#[test]
fn with_journal_refuses_existing_records() {
    let dir = TempDir::new().unwrap();
    let path = durable_log(&dir, 2);
    assert!(matches!(
        EventLog::with_journal(&path, WriteOptions::default(), clock()),
        Err(LedgerError::JournalNotEmpty)
    ));
}

#[test]
fn truncated_tail_strict_vs_permissive() {
    let dir = TempDir::new().unwrap();
    let path = durable_log(&dir, 3);
    let full = fs::metadata(&path).unwrap().len();
    OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len(full - 5)
        .unwrap();

    assert!(matches!(
        EventLog::recover(&path, ReadMode::Strict, clock()),
        Err(LedgerError::Journal(JournalError::TruncatedFrame { .. }))
    ));

    let mut log = EventLog::recover(&path, ReadMode::Permissive, clock()).unwrap();
    assert_eq!(log.len(), 2);
    log.append_json("SESSION_ENDED", json!({})).unwrap();
    drop(log);

    // The partial frame was cut off, so the file reads cleanly in strict mode again.
    let log = EventLog::recover(&path, ReadMode::Strict, clock()).unwrap();
    assert_eq!(log.len(), 3);
    log.verify_chain().unwrap();
}

#[test]
fn edited_journal_is_detected_on_recovery() {
    let dir = TempDir::new().unwrap();
    let path = durable_log(&dir, 3);
    let mut bytes = fs::read(&path).unwrap();
    let needle = br#""caseId":"C2""#;
    let at = bytes
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("case C2 is journaled");
    // Same length, so frame boundaries stay intact.
    bytes[at + needle.len() - 2] = b'9';
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        EventLog::recover(&path, ReadMode::Strict, clock()),
        Err(LedgerError::ContentMismatch { seq: 2 })
    ));
}

#[test]
fn unknown_frames_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = durable_log(&dir, 2);
    let mut writer = JournalWriter::open(&path, WriteOptions::default()).unwrap();
    writer.append_raw(FrameKind::Unknown(0x7f), b"future").unwrap();
    writer.finish().unwrap();

    let mut reader = JournalReader::open(&path, ReadMode::Strict).unwrap();
    let mut count = 0;
    while reader.read_record().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
}

#[test]
fn payload_size_limit_is_enforced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("big.evj");
    let mut writer = JournalWriter::open(&path, WriteOptions::default()).unwrap();
    let oversized = vec![b' '; MAX_PAYLOAD_SIZE as usize + 1];
    match writer.append_raw(FrameKind::Record, &oversized) {
        Err(JournalError::PayloadTooLarge { size, max }) => {
            assert_eq!(size, MAX_PAYLOAD_SIZE as usize + 1);
            assert_eq!(max, MAX_PAYLOAD_SIZE);
        }
        other => panic!("expected PayloadTooLarge, got {other:?}"),
    }
    assert!(writer.is_empty());
}

#[test]
fn foreign_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(b"this is not a journal file").unwrap();
    drop(file);

    assert!(matches!(
        JournalReader::open(&path, ReadMode::Strict),
        Err(JournalError::InvalidHeader(_))
    ));
    assert!(matches!(
        JournalWriter::open(&path, WriteOptions::default()),
        Err(JournalError::InvalidHeader(_))
    ));
}
