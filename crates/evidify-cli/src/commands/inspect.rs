//! Inspect command implementation.

use crate::output;
use evidify_verify::records::ParsedBundle;
use evidify_verify::BundleFiles;
use serde_json::json;
use std::path::PathBuf;

pub fn run(dir: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let files = BundleFiles::from_dir(&dir)
        .map_err(|e| format!("Failed to open bundle: {}", e))?;
    let parsed = ParsedBundle::parse(&files);

    for problem in &parsed.structural {
        eprintln!("warning: {}", problem.message);
    }
    let events = parsed
        .events
        .ok_or_else(|| format!("No readable events in {}", dir.display()))?;
    let ledger = parsed.ledger.unwrap_or_default();

    if json_output {
        let rows: Vec<_> = events
            .iter()
            .enumerate()
            .map(|(pos, event)| {
                let entry = ledger.get(pos);
                json!({
                    "seq": event.seq,
                    "eventId": event.id,
                    "type": event.event_type,
                    "timestamp": event.timestamp,
                    "payload": event.payload,
                    "contentHash": entry.and_then(|e| e.content_hash.clone()),
                    "chainHash": entry.and_then(|e| e.chain_hash.clone()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        output::print_event_header();
        for (pos, event) in events.iter().enumerate() {
            println!("{}", output::format_event_row(event, ledger.get(pos)));
        }
        println!();
        println!("{} event(s)", events.len());
    }

    Ok(())
}
