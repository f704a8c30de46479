//! Output formatting utilities.

use evidify_verify::records::{EventLine, LedgerLine};
use evidify_verify::{CheckStatus, VerifierOutput, VerifierResult};

/// Prints the check list followed by the verdict line.
///
/// A passing bundle gets a one-line summary per check; a failing one also
/// repeats the failures at the end so they are the last thing on screen.
pub fn print_check_table(output: &VerifierOutput) {
    println!("{:<28} {:<6} {}", "CHECK", "STATUS", "MESSAGE");
    println!("{}", "-".repeat(80));
    for check in &output.checks {
        println!(
            "{:<28} {:<6} {}",
            check.name,
            status_label(check.status),
            check.message
        );
    }
    println!();

    let summary = &output.summary;
    match output.result {
        VerifierResult::Pass => println!(
            "PASS: {} passed, {} warning(s)",
            summary.passed, summary.warnings
        ),
        VerifierResult::Fail => {
            println!(
                "FAIL: {} failed, {} passed, {} warning(s)",
                summary.failed, summary.passed, summary.warnings
            );
            for check in output.failures() {
                println!(
                    "  {} [{}] {}",
                    check.name,
                    check.code.as_deref().unwrap_or("-"),
                    check.message
                );
            }
        }
    }
}

fn status_label(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
    }
}

/// Prints the event table header.
#[allow(clippy::print_literal)]
pub fn print_event_header() {
    println!(
        "{:<5} {:<36} {:<26} {}",
        "SEQ", "TYPE", "TIMESTAMP", "CHAIN_HASH"
    );
    println!("{}", "-".repeat(90));
}

/// Formats one event, paired with its ledger entry when there is one.
pub fn format_event_row(event: &EventLine, entry: Option<&LedgerLine>) -> String {
    let seq = event
        .seq
        .map(|s| s.to_string())
        .unwrap_or_else(|| "?".to_string());
    let chain = entry
        .and_then(|e| e.chain_hash.as_deref())
        .unwrap_or("?");
    format!(
        "{:<5} {:<36} {:<26} {}",
        seq,
        event.event_type.as_deref().unwrap_or("?"),
        event.timestamp.as_deref().unwrap_or("?"),
        truncate(chain, 16)
    )
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
