//! The eight bundle checks.
//!
//! Each check reads only the parsed records it needs and returns `None`
//! when one of those inputs is unavailable. Checks never consult each
//! other's results.

use crate::bundle::BundleFiles;
use crate::policy::{CheckKind, Severity, VerifierPolicy};
use crate::records::{EventLine, LedgerLine, ManifestView};
use crate::report::{itemize, CheckResult, CheckStatus};
use chrono::{DateTime, FixedOffset};
use evidify_canonical::layout::{CODEBOOK_FILE, EVENTS_FILE, LEDGER_FILE, MANIFEST_FILE, METRICS_FILE};
use evidify_canonical::{chain_hash, content_hash, sha256_hex, GENESIS_HASH};

/// Everything a check may read.
pub struct Context<'a> {
    /// Raw files, for checksums.
    pub files: &'a BundleFiles,
    /// Parsed manifest.
    pub manifest: Option<&'a ManifestView>,
    /// Parsed events.
    pub events: Option<&'a [EventLine]>,
    /// Parsed ledger.
    pub ledger: Option<&'a [LedgerLine]>,
    /// Active policy.
    pub policy: &'a VerifierPolicy,
}

/// Files a check needs, used to explain a skipped check.
pub fn required_inputs(kind: CheckKind) -> &'static [&'static str] {
    match kind {
        CheckKind::SequenceContinuity | CheckKind::TimestampMonotonicity => &[EVENTS_FILE],
        CheckKind::EventLedgerCorrespondence | CheckKind::ContentHash => {
            &[EVENTS_FILE, LEDGER_FILE]
        }
        CheckKind::ChainIntegrity => &[LEDGER_FILE],
        CheckKind::ManifestIntegrity => &[MANIFEST_FILE, EVENTS_FILE, LEDGER_FILE],
        CheckKind::FileChecksums | CheckKind::SchemaVersion => &[MANIFEST_FILE],
    }
}

/// Runs one check; `None` when its inputs are unavailable.
pub fn run(kind: CheckKind, ctx: &Context<'_>) -> Option<CheckResult> {
    let result = match kind {
        CheckKind::SequenceContinuity => sequence_continuity(ctx.events?),
        CheckKind::EventLedgerCorrespondence => correspondence(ctx.events?, ctx.ledger?),
        CheckKind::ContentHash => content_hashes(ctx.events?, ctx.ledger?),
        CheckKind::ChainIntegrity => chain_integrity(ctx.ledger?),
        CheckKind::TimestampMonotonicity => {
            timestamp_monotonicity(ctx.events?, ctx.policy.timestamp_regression)
        }
        CheckKind::ManifestIntegrity => {
            return manifest_integrity(ctx.manifest?, ctx.events, ctx.ledger)
        }
        CheckKind::FileChecksums => file_checksums(ctx.manifest?, ctx.files),
        CheckKind::SchemaVersion => schema_version(ctx.manifest?, ctx.policy),
    };
    Some(result)
}

fn sequence_continuity(events: &[EventLine]) -> CheckResult {
    let kind = CheckKind::SequenceContinuity;
    let offenders: Vec<String> = events
        .iter()
        .enumerate()
        .filter(|(pos, event)| event.seq != Some(*pos as u64))
        .map(|(pos, event)| match event.seq {
            Some(seq) => format!("{seq} at position {pos}"),
            None => format!("missing at position {pos}"),
        })
        .collect();
    if offenders.is_empty() {
        return CheckResult::pass(kind, contiguous_message(events.len()));
    }
    CheckResult::fail(
        kind,
        format!(
            "{} event(s) out of sequence; expected 0..{}: seq {}",
            offenders.len(),
            events.len(),
            itemize(&offenders)
        ),
    )
}

fn contiguous_message(count: usize) -> String {
    match count {
        0 => "no events".to_string(),
        n => format!("{n} event(s) numbered 0..{}", n - 1),
    }
}

fn correspondence(events: &[EventLine], ledger: &[LedgerLine]) -> CheckResult {
    let kind = CheckKind::EventLedgerCorrespondence;
    let mismatched: Vec<usize> = events
        .iter()
        .zip(ledger)
        .enumerate()
        .filter(|(_, (event, entry))| {
            event.seq != entry.seq
                || event.id != entry.event_id
                || event.timestamp != entry.timestamp
                || event.event_type != entry.event_type
        })
        .map(|(pos, _)| pos)
        .collect();

    let mut problems = Vec::new();
    if events.len() != ledger.len() {
        problems.push(format!(
            "{} events but {} ledger entries",
            events.len(),
            ledger.len()
        ));
    }
    if !mismatched.is_empty() {
        problems.push(format!(
            "seq/eventId/timestamp/type differ at position(s) {}",
            itemize(&mismatched)
        ));
    }
    if problems.is_empty() {
        CheckResult::pass(kind, format!("{} event/ledger pair(s) match", events.len()))
    } else {
        CheckResult::fail(kind, problems.join("; "))
    }
}

fn content_hashes(events: &[EventLine], ledger: &[LedgerLine]) -> CheckResult {
    let kind = CheckKind::ContentHash;
    let tampered: Vec<String> = events
        .iter()
        .zip(ledger)
        .enumerate()
        .filter(|(_, (event, entry))| {
            let recomputed = content_hash(&event.payload).ok();
            match (recomputed, entry.content_hash.as_deref()) {
                (Some(hash), Some(stored)) => hash.as_str() != stored,
                _ => true,
            }
        })
        .map(|(pos, (event, _))| seq_label(event.seq, pos))
        .collect();
    if tampered.is_empty() {
        let checked = events.len().min(ledger.len());
        CheckResult::pass(kind, format!("{checked} payload hash(es) recomputed"))
    } else {
        CheckResult::fail(
            kind,
            format!(
                "payload hash mismatch at seq {} ({} of {})",
                itemize(&tampered),
                tampered.len(),
                events.len().min(ledger.len())
            ),
        )
    }
}

fn seq_label(seq: Option<u64>, pos: usize) -> String {
    match seq {
        Some(seq) => seq.to_string(),
        None => format!("?@{pos}"),
    }
}

/// Recomputes an entry's chain hash from its own fields.
fn recompute_chain_hash(entry: &LedgerLine) -> Option<String> {
    Some(
        chain_hash(
            entry.seq?,
            entry.previous_hash.as_deref()?,
            entry.event_id.as_deref()?,
            entry.timestamp.as_deref()?,
            entry.content_hash.as_deref()?,
        )
        .to_string(),
    )
}

/// Positions whose link or chain hash does not recompute.
fn broken_links(ledger: &[LedgerLine]) -> Vec<String> {
    let mut broken = Vec::new();
    let mut expected_previous: Option<&str> = Some(GENESIS_HASH);
    for (pos, entry) in ledger.iter().enumerate() {
        let link_ok = expected_previous.is_some()
            && entry.previous_hash.as_deref() == expected_previous;
        let hash_ok = match (recompute_chain_hash(entry), entry.chain_hash.as_deref()) {
            (Some(recomputed), Some(stored)) => recomputed == stored,
            _ => false,
        };
        if !(link_ok && hash_ok) {
            broken.push(seq_label(entry.seq, pos));
        }
        expected_previous = entry.chain_hash.as_deref();
    }
    broken
}

fn chain_integrity(ledger: &[LedgerLine]) -> CheckResult {
    let kind = CheckKind::ChainIntegrity;
    let broken = broken_links(ledger);
    if broken.is_empty() {
        CheckResult::pass(
            kind,
            format!("{} link(s) recomputed from genesis", ledger.len()),
        )
    } else {
        CheckResult::fail(
            kind,
            format!(
                "chain does not recompute at seq {} ({} of {})",
                itemize(&broken),
                broken.len(),
                ledger.len()
            ),
        )
    }
}

fn timestamp_monotonicity(events: &[EventLine], severity: Severity) -> CheckResult {
    let kind = CheckKind::TimestampMonotonicity;
    let mut invalid = Vec::new();
    let mut regressions = Vec::new();
    let mut previous: Option<DateTime<FixedOffset>> = None;
    for (pos, event) in events.iter().enumerate() {
        let parsed = event
            .timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok());
        match parsed {
            None => invalid.push(seq_label(event.seq, pos)),
            Some(ts) => {
                if previous.is_some_and(|prev| ts < prev) {
                    regressions.push(seq_label(event.seq, pos));
                }
                previous = Some(ts);
            }
        }
    }

    let regression_text = || {
        format!(
            "timestamp earlier than its predecessor at seq {}",
            itemize(&regressions)
        )
    };
    if !invalid.is_empty() {
        let mut message = format!("unparseable timestamp at seq {}", itemize(&invalid));
        if !regressions.is_empty() {
            message.push_str("; ");
            message.push_str(&regression_text());
        }
        return CheckResult::fail_with(kind, "TIMESTAMP_INVALID", message);
    }
    if regressions.is_empty() {
        return CheckResult::pass(kind, "timestamps never decrease");
    }
    match severity {
        Severity::Fail => CheckResult::fail(kind, regression_text()),
        Severity::Warn => CheckResult::warn(kind, kind.failure_code(), regression_text()),
    }
}

fn manifest_integrity(
    manifest: &ManifestView,
    events: Option<&[EventLine]>,
    ledger: Option<&[LedgerLine]>,
) -> Option<CheckResult> {
    let kind = CheckKind::ManifestIntegrity;
    if events.is_none() && ledger.is_none() {
        return None;
    }
    let Some(integrity) = manifest.integrity.as_ref() else {
        return Some(CheckResult::fail(kind, "manifest has no integrity block"));
    };

    let mut problems = Vec::new();
    let actual_count = events
        .map(<[EventLine]>::len)
        .or(ledger.map(<[LedgerLine]>::len));
    match (integrity.event_count, actual_count) {
        (Some(claimed), Some(actual)) if claimed != actual as u64 => problems.push(format!(
            "eventCount {claimed} but bundle holds {actual} event(s)"
        )),
        (None, _) => problems.push("integrity.eventCount missing".to_string()),
        _ => {}
    }

    let mut flag_note = None;
    if let Some(ledger) = ledger {
        let recomputed_final = match ledger.last() {
            None => Some(GENESIS_HASH.to_string()),
            Some(last) => recompute_chain_hash(last),
        };
        match (integrity.final_hash.as_deref(), recomputed_final.as_deref()) {
            (Some(claimed), Some(actual)) if claimed == actual => {}
            (Some(claimed), Some(actual)) => problems.push(format!(
                "finalHash {claimed} but recomputed head is {actual}"
            )),
            (None, _) => problems.push("integrity.finalHash missing".to_string()),
            (Some(_), None) => {
                problems.push("last ledger entry lacks fields needed to recompute".to_string())
            }
        }

        let mut recomputed_valid = broken_links(ledger).is_empty();
        if let Some(events) = events {
            recomputed_valid &= events.len() == ledger.len()
                && content_hashes(events, ledger).status == CheckStatus::Pass;
        }
        if let Some(claimed) = integrity.chain_valid {
            if claimed != recomputed_valid {
                flag_note = Some(format!(
                    "stored chainValid={claimed} but recomputation gives {recomputed_valid}"
                ));
            }
        }
    }

    if !problems.is_empty() {
        if let Some(note) = flag_note {
            problems.push(note);
        }
        return Some(CheckResult::fail(kind, problems.join("; ")));
    }
    if let Some(note) = flag_note {
        return Some(CheckResult::warn(kind, "CHAIN_VALID_FLAG_MISMATCH", note));
    }
    Some(CheckResult::pass(
        kind,
        "eventCount and finalHash match the recomputed values",
    ))
}

fn file_checksums(manifest: &ManifestView, files: &BundleFiles) -> CheckResult {
    let kind = CheckKind::FileChecksums;
    let Some(checksums) = manifest.file_checksums.as_ref() else {
        return CheckResult::fail(kind, "manifest has no fileChecksums block");
    };

    let pinned = [
        (EVENTS_FILE, checksums.events_file_hash.as_deref(), true),
        (LEDGER_FILE, checksums.ledger_file_hash.as_deref(), true),
        (METRICS_FILE, checksums.metrics_file_hash.as_deref(), true),
        (CODEBOOK_FILE, checksums.codebook_file_hash.as_deref(), false),
    ];

    let mut problems = Vec::new();
    let mut matched = 0;
    for (name, claimed, required) in pinned {
        match (claimed, files.get(name)) {
            (Some(claimed), Some(bytes)) => {
                if sha256_hex(bytes).as_str() == claimed {
                    matched += 1;
                } else {
                    problems.push(format!("{name} does not match its checksum"));
                }
            }
            (None, _) if required => problems.push(format!("no checksum recorded for {name}")),
            // Absent and unreadable files are reported structurally; the codebook is optional.
            _ => {}
        }
    }

    if problems.is_empty() {
        CheckResult::pass(kind, format!("{matched} file checksum(s) match"))
    } else {
        CheckResult::fail(kind, problems.join("; "))
    }
}

fn schema_version(manifest: &ManifestView, policy: &VerifierPolicy) -> CheckResult {
    let kind = CheckKind::SchemaVersion;
    match manifest.schema_version.as_deref() {
        Some(version) if policy.known_schema_versions.iter().any(|v| v == version) => {
            CheckResult::pass(kind, format!("schema version {version}"))
        }
        Some(version) => CheckResult::warn(
            kind,
            kind.failure_code(),
            format!("schema version {version} is not known; checks ran best-effort"),
        ),
        None => CheckResult::warn(
            kind,
            kind.failure_code(),
            "manifest declares no schemaVersion; checks ran best-effort",
        ),
    }
}
