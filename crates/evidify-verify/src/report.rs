use crate::policy::CheckKind;
use serde::{Deserialize, Serialize};

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    /// Check passed.
    Pass,
    /// Check failed; blocks PASS.
    Fail,
    /// Anomaly worth surfacing; does not block PASS.
    Warn,
}

/// Overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerifierResult {
    /// No check failed.
    Pass,
    /// At least one check failed.
    Fail,
}

/// One line of the check list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check name, e.g. `CHAIN_INTEGRITY` or `MISSING_FILE`.
    pub name: String,
    /// Outcome.
    pub status: CheckStatus,
    /// Machine-readable reason when the check did not pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable explanation.
    pub message: String,
}

impl CheckResult {
    /// Passing result for `kind`.
    pub fn pass(kind: CheckKind, message: impl Into<String>) -> Self {
        Self {
            name: kind.name().to_string(),
            status: CheckStatus::Pass,
            code: None,
            message: message.into(),
        }
    }

    /// Failing result for `kind` with its standard failure code.
    pub fn fail(kind: CheckKind, message: impl Into<String>) -> Self {
        Self::fail_with(kind, kind.failure_code(), message)
    }

    /// Failing result for `kind` with a specific code.
    pub fn fail_with(kind: CheckKind, code: &str, message: impl Into<String>) -> Self {
        Self {
            name: kind.name().to_string(),
            status: CheckStatus::Fail,
            code: Some(code.to_string()),
            message: message.into(),
        }
    }

    /// Warning result for `kind` with a specific code.
    pub fn warn(kind: CheckKind, code: &str, message: impl Into<String>) -> Self {
        Self {
            name: kind.name().to_string(),
            status: CheckStatus::Warn,
            code: Some(code.to_string()),
            message: message.into(),
        }
    }

    /// Structural failure whose name and code coincide (`MISSING_FILE`, `MALFORMED_FILE`).
    pub fn structural(code: &str, message: impl Into<String>) -> Self {
        Self {
            name: code.to_string(),
            status: CheckStatus::Fail,
            code: Some(code.to_string()),
            message: message.into(),
        }
    }
}

/// Check counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Checks with status PASS.
    pub passed: usize,
    /// Checks with status FAIL.
    pub failed: usize,
    /// Checks with status WARN.
    pub warnings: usize,
}

/// Full verification report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierOutput {
    /// PASS iff no check failed.
    pub result: VerifierResult,
    /// Checks in the order they ran.
    pub checks: Vec<CheckResult>,
    /// Counts by status.
    pub summary: Summary,
}

impl VerifierOutput {
    /// Aggregates a check list into a report.
    pub fn from_checks(checks: Vec<CheckResult>) -> Self {
        let mut summary = Summary::default();
        for check in &checks {
            match check.status {
                CheckStatus::Pass => summary.passed += 1,
                CheckStatus::Fail => summary.failed += 1,
                CheckStatus::Warn => summary.warnings += 1,
            }
        }
        let result = if summary.failed == 0 {
            VerifierResult::Pass
        } else {
            VerifierResult::Fail
        };
        Self {
            result,
            checks,
            summary,
        }
    }

    /// Whether the verdict is PASS.
    pub fn passed(&self) -> bool {
        self.result == VerifierResult::Pass
    }

    /// First check with the given name.
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Whether any check carries `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.checks.iter().any(|c| c.code.as_deref() == Some(code))
    }

    /// Checks that failed, in order.
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
    }

    /// Pretty JSON with a trailing newline, as written to `verifier_output.json`.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Lists up to ten values, then how many were left out.
pub fn itemize<T: std::fmt::Display>(values: &[T]) -> String {
    const SHOWN: usize = 10;
    let shown: Vec<String> = values.iter().take(SHOWN).map(ToString::to_string).collect();
    let mut text = shown.join(", ");
    if values.len() > SHOWN {
        text.push_str(&format!(" and {} more", values.len() - SHOWN));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_block_pass() {
        let output = VerifierOutput::from_checks(vec![
            CheckResult::pass(CheckKind::ContentHash, "ok"),
            CheckResult::warn(CheckKind::SchemaVersion, "UNKNOWN_SCHEMA_VERSION", "2.0"),
        ]);
        assert_eq!(output.result, VerifierResult::Pass);
        assert_eq!(
            output.summary,
            Summary {
                passed: 1,
                failed: 0,
                warnings: 1
            }
        );
    }

    #[test]
    fn any_failure_fails() {
        let output = VerifierOutput::from_checks(vec![
            CheckResult::pass(CheckKind::SequenceContinuity, "ok"),
            CheckResult::fail(CheckKind::ChainIntegrity, "broken at 3"),
        ]);
        assert!(!output.passed());
        assert!(output.has_code("CHAIN_BROKEN"));
        assert_eq!(output.failures().count(), 1);
    }

    #[test]
    fn itemize_truncates_after_ten() {
        assert_eq!(itemize(&[1, 2, 3]), "1, 2, 3");
        let many: Vec<u64> = (0..13).collect();
        assert_eq!(itemize(&many), "0, 1, 2, 3, 4, 5, 6, 7, 8, 9 and 3 more");
    }

    #[test]
    fn json_shape() {
        let output =
            VerifierOutput::from_checks(vec![CheckResult::pass(CheckKind::FileChecksums, "ok")]);
        let value: serde_json::Value =
            serde_json::from_slice(&output.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["result"], "PASS");
        assert_eq!(value["checks"][0]["status"], "PASS");
        assert!(value["checks"][0].get("code").is_none());
        assert_eq!(value["summary"]["passed"], 1);
    }
}
