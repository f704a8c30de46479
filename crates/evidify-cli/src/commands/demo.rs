//! Demo command implementation.
//!
//! Writes a synthetic HUMAN_FIRST reader session. Timestamps come from a
//! stepping clock so the timing metrics are the same on every run; event
//! ids are fresh UUIDs.

use chrono::{Duration, TimeZone, Utc};
use evidify_export::ExportPackager;
use evidify_ledger::{EventLog, SteppingClock};
use evidify_verify::{verify, BundleFiles, VerifierPolicy};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

const STEP_MS: i64 = 4_000;

pub fn run(out_dir: PathBuf, cases: u32) -> Result<(), Box<dyn std::error::Error>> {
    let start = Utc
        .with_ymd_and_hms(2026, 1, 15, 9, 0, 0)
        .single()
        .ok_or("invalid demo start time")?;
    let mut log = EventLog::with_clock(SteppingClock::new(
        start,
        Duration::milliseconds(STEP_MS),
    ));

    log.append_json(
        "SESSION_STARTED",
        json!({"sessionId": "DEMO-S1", "readerId": "R-01", "protocolId": "demo"}),
    )?;
    log.append_json(
        "RANDOMIZATION_ASSIGNED",
        json!({"condition": "HUMAN_FIRST", "seed": "demo-seed", "method": "fixed"}),
    )?;
    for n in 1..=cases {
        append_case(&mut log, n)?;
        if n % 2 == 0 {
            log.append_json(
                "ATTENTION_CHECK_RESPONSE",
                json!({"checkId": format!("AC-{n}"), "passed": true}),
            )?;
        }
    }
    log.append_json("SESSION_ENDED", json!({"reason": "completed"}))?;

    let bundle = ExportPackager::default().export(&log)?;
    let files: BundleFiles = bundle
        .files()
        .into_iter()
        .map(|(name, bytes)| (name, bytes.to_vec()))
        .collect();
    let output = verify(&files, &VerifierPolicy::default());
    let bundle = bundle.with_verifier_output(output.to_json_pretty()?);
    bundle.write_to_dir(&out_dir)?;

    info!(cases, events = log.len(), "demo session written");
    println!(
        "Wrote {} events ({} cases) to {}",
        log.len(),
        cases,
        out_dir.display()
    );
    println!("finalHash: {}", bundle.manifest.integrity.final_hash);
    println!("verifier: {:?}", output.result);
    Ok(())
}

/// One case: initial read, AI reveal, final assessment.
///
/// Every third case the reader follows an AI suggestion that disagrees
/// with the first impression and documents the deviation.
fn append_case(log: &mut EventLog, n: u32) -> Result<(), Box<dyn std::error::Error>> {
    let case_id = format!("C{n}");
    let initial = 2 + (n % 3) as u8;
    let ai = if n % 3 == 0 { initial + 1 } else { initial };
    let changes = ai != initial;

    log.append_json("CASE_LOADED", json!({"caseId": case_id}))?;
    log.append_json(
        "READ_EPISODE_STARTED",
        json!({"caseId": case_id, "phase": "PRE_AI"}),
    )?;
    log.append_json(
        "READ_EPISODE_ENDED",
        json!({"caseId": case_id, "phase": "PRE_AI", "durationMs": STEP_MS}),
    )?;
    log.append_json(
        "FIRST_IMPRESSION_LOCKED",
        json!({"caseId": case_id, "birads": initial, "confidence": 3}),
    )?;
    log.append_json(
        "AI_REVEALED",
        json!({"caseId": case_id, "suggestedBirads": ai, "aiConfidence": 0.82}),
    )?;
    log.append_json(
        "DISCLOSURE_PRESENTED",
        json!({"caseId": case_id, "format": "FDR_FOR", "fdr": 0.04, "for": 0.12}),
    )?;
    log.append_json(
        "DISCLOSURE_COMPREHENSION_RESPONSE",
        json!({"caseId": case_id, "correct": n % 4 != 0}),
    )?;
    log.append_json(
        "FINAL_ASSESSMENT",
        json!({"caseId": case_id, "birads": ai, "confidence": 4}),
    )?;
    if changes {
        log.append_json(
            "DEVIATION_SUBMITTED",
            json!({
                "caseId": case_id,
                "reasonCodes": ["AI_FINDING_CONFIRMED"],
                "rationale": "Reviewed AI-marked region; agree with upgrade."
            }),
        )?;
    }
    log.append_json("CASE_COMPLETED", json!({"caseId": case_id}))?;
    Ok(())
}
