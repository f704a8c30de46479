//! Verify command implementation.

use crate::output;
use evidify_canonical::layout::VERIFIER_OUTPUT_FILE;
use evidify_verify::{verify, BundleError, BundleFiles, Severity, VerifierPolicy};
use std::path::PathBuf;

/// Exit code for a bundle directory that cannot be read at all.
const EXIT_UNREADABLE: i32 = 2;

pub fn run(
    dir: PathBuf,
    json_output: bool,
    lenient_timestamps: bool,
    policy_path: Option<PathBuf>,
    write_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut policy = match &policy_path {
        Some(path) => VerifierPolicy::load(path)
            .map_err(|e| format!("Failed to load policy {}: {}", path.display(), e))?,
        None => VerifierPolicy::default(),
    };
    if lenient_timestamps {
        policy.timestamp_regression = Severity::Warn;
    }

    let files = match BundleFiles::from_dir(&dir) {
        Ok(files) => files,
        Err(e @ (BundleError::NotFound(_) | BundleError::Io { .. })) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_UNREADABLE);
        }
        Err(e) => return Err(e.into()),
    };

    let result = verify(&files, &policy);

    if write_output {
        let path = dir.join(VERIFIER_OUTPUT_FILE);
        std::fs::write(&path, result.to_json_pretty()?)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::print_check_table(&result);
    }

    if !result.passed() {
        std::process::exit(1);
    }
    Ok(())
}
