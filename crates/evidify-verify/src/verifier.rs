use crate::bundle::BundleFiles;
use crate::checks::{self, Context};
use crate::errors::BundleError;
use crate::policy::{CheckKind, VerifierPolicy};
use crate::records::ParsedBundle;
use crate::report::{CheckResult, CheckStatus, VerifierOutput};
use std::path::Path;
use tracing::{debug, info, warn};

/// Code given to a check whose input files are unavailable.
pub const NOT_EVALUATED: &str = "NOT_EVALUATED";

/// Code and name of the failure emitted when no integrity check could run.
pub const NO_CHECKS_RUN: &str = "NO_CHECKS_RUN";

/// Verifier bound to a policy.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    policy: VerifierPolicy,
}

impl Verifier {
    /// Creates a verifier with `policy`.
    pub fn new(policy: VerifierPolicy) -> Self {
        Self { policy }
    }

    /// Active policy.
    pub fn policy(&self) -> &VerifierPolicy {
        &self.policy
    }

    /// Verifies in-memory bundle files.
    pub fn verify(&self, files: &BundleFiles) -> VerifierOutput {
        verify(files, &self.policy)
    }

    /// Reads and verifies the bundle in `dir`.
    pub fn verify_dir<P: AsRef<Path>>(&self, dir: P) -> Result<VerifierOutput, BundleError> {
        verify_dir(dir, &self.policy)
    }
}

/// Reads the bundle in `dir` and verifies it.
///
/// Only an unreadable directory is an error; anything wrong with the files
/// themselves is reported as a failed check.
pub fn verify_dir<P: AsRef<Path>>(
    dir: P,
    policy: &VerifierPolicy,
) -> Result<VerifierOutput, BundleError> {
    let files = BundleFiles::from_dir(dir)?;
    Ok(verify(&files, policy))
}

/// Runs every enabled check over `files`.
///
/// Structural failures come first, then the enabled checks in policy
/// order. The same bytes and policy always give the same output.
pub fn verify(files: &BundleFiles, policy: &VerifierPolicy) -> VerifierOutput {
    let parsed = ParsedBundle::parse(files);
    let ctx = Context {
        files,
        manifest: parsed.manifest.as_ref(),
        events: parsed.events.as_deref(),
        ledger: parsed.ledger.as_deref(),
        policy,
    };

    let mut results = parsed.structural.clone();
    let mut evaluated_integrity = false;
    for kind in policy.enabled_checks() {
        let result = match checks::run(kind, &ctx) {
            Some(result) => {
                if kind != CheckKind::SchemaVersion {
                    evaluated_integrity = true;
                }
                result
            }
            None => not_evaluated(kind, &parsed),
        };
        results.push(result);
    }

    if !evaluated_integrity {
        let message = "no integrity check could be evaluated";
        match results
            .iter_mut()
            .find(|r| r.name == CheckKind::SchemaVersion.name())
        {
            Some(schema) => {
                schema.status = CheckStatus::Fail;
                schema.code = Some(NO_CHECKS_RUN.to_string());
                schema.message = format!("{message}; {}", schema.message);
            }
            None => results.push(CheckResult::structural(NO_CHECKS_RUN, message)),
        }
    }

    for failure in results.iter().filter(|r| r.status == CheckStatus::Fail) {
        warn!(
            check = %failure.name,
            code = failure.code.as_deref().unwrap_or_default(),
            "{}",
            failure.message
        );
    }
    for check in results.iter().filter(|r| r.status != CheckStatus::Fail) {
        debug!(check = %check.name, status = ?check.status, "{}", check.message);
    }

    let output = VerifierOutput::from_checks(results);
    info!(
        result = ?output.result,
        passed = output.summary.passed,
        failed = output.summary.failed,
        warnings = output.summary.warnings,
        "bundle verified"
    );
    output
}

fn not_evaluated(kind: CheckKind, parsed: &ParsedBundle) -> CheckResult {
    let unavailable: Vec<&str> = checks::required_inputs(kind)
        .iter()
        .copied()
        .filter(|name| !parsed.is_available(name))
        .collect();
    CheckResult::warn(
        kind,
        NOT_EVALUATED,
        format!("not evaluated: {} unavailable", unavailable.join(", ")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::VerifierResult;

    #[test]
    fn empty_directory_contents_fail_without_panicking() {
        let output = verify(&BundleFiles::new(), &VerifierPolicy::default());
        assert_eq!(output.result, VerifierResult::Fail);
        assert_eq!(output.checks[0].name, "MISSING_FILE");
        assert!(output.has_code(NO_CHECKS_RUN));
        let skipped = output.check("CHAIN_INTEGRITY").unwrap();
        assert_eq!(skipped.status, CheckStatus::Warn);
        assert_eq!(skipped.code.as_deref(), Some(NOT_EVALUATED));
        assert!(skipped.message.contains("ledger.json"));
    }

    #[test]
    fn no_checks_run_is_separate_when_schema_check_disabled() {
        let policy = VerifierPolicy {
            checks: vec![CheckKind::ChainIntegrity],
            ..VerifierPolicy::default()
        };
        let output = verify(&BundleFiles::new(), &policy);
        let last = output.checks.last().unwrap();
        assert_eq!(last.name, NO_CHECKS_RUN);
        assert_eq!(last.status, CheckStatus::Fail);
    }
}
