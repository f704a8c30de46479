use crate::errors::BundleError;
use evidify_canonical::layout::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Severity assigned to a non-integrity anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks PASS.
    Fail,
    /// Reported, does not block PASS.
    Warn,
}

/// The eight bundle checks, in their default order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckKind {
    /// `seq` values are `0..N-1`.
    SequenceContinuity,
    /// Events and ledger entries pair up.
    EventLedgerCorrespondence,
    /// Payload hashes recompute.
    ContentHash,
    /// Chain hashes and links recompute.
    ChainIntegrity,
    /// Timestamps never go backwards.
    TimestampMonotonicity,
    /// Manifest counts and head hash match.
    ManifestIntegrity,
    /// File bytes match the manifest checksums.
    FileChecksums,
    /// Schema version is known.
    SchemaVersion,
}

impl CheckKind {
    /// All checks in default order.
    pub const ALL: [CheckKind; 8] = [
        CheckKind::SequenceContinuity,
        CheckKind::EventLedgerCorrespondence,
        CheckKind::ContentHash,
        CheckKind::ChainIntegrity,
        CheckKind::TimestampMonotonicity,
        CheckKind::ManifestIntegrity,
        CheckKind::FileChecksums,
        CheckKind::SchemaVersion,
    ];

    /// Name shown in the check list.
    pub fn name(self) -> &'static str {
        match self {
            CheckKind::SequenceContinuity => "SEQUENCE_CONTINUITY",
            CheckKind::EventLedgerCorrespondence => "EVENT_LEDGER_CORRESPONDENCE",
            CheckKind::ContentHash => "CONTENT_HASH",
            CheckKind::ChainIntegrity => "CHAIN_INTEGRITY",
            CheckKind::TimestampMonotonicity => "TIMESTAMP_MONOTONICITY",
            CheckKind::ManifestIntegrity => "MANIFEST_INTEGRITY",
            CheckKind::FileChecksums => "FILE_CHECKSUMS",
            CheckKind::SchemaVersion => "SCHEMA_VERSION",
        }
    }

    /// Code attached when the check does not pass.
    pub fn failure_code(self) -> &'static str {
        match self {
            CheckKind::SequenceContinuity => "SEQ_GAP",
            CheckKind::EventLedgerCorrespondence => "EVENT_LEDGER_MISMATCH",
            CheckKind::ContentHash => "CONTENT_TAMPERED",
            CheckKind::ChainIntegrity => "CHAIN_BROKEN",
            CheckKind::TimestampMonotonicity => "TIMESTAMP_REGRESSION",
            CheckKind::ManifestIntegrity => "MANIFEST_MISMATCH",
            CheckKind::FileChecksums => "FILE_CHECKSUM_MISMATCH",
            CheckKind::SchemaVersion => "UNKNOWN_SCHEMA_VERSION",
        }
    }
}

/// Verification policy.
///
/// ```json
/// {
///   "timestampRegression": "warn",
///   "knownSchemaVersions": ["1.0"],
///   "checks": ["SEQUENCE_CONTINUITY", "CHAIN_INTEGRITY"]
/// }
/// ```
///
/// Omitted fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct VerifierPolicy {
    /// Severity of a timestamp regression (default FAIL).
    pub timestamp_regression: Severity,
    /// Schema versions this verifier fully understands.
    pub known_schema_versions: Vec<String>,
    /// Checks to run, in output order (default all eight).
    pub checks: Vec<CheckKind>,
}

impl Default for VerifierPolicy {
    fn default() -> Self {
        Self {
            timestamp_regression: Severity::Fail,
            known_schema_versions: vec![SCHEMA_VERSION.to_string()],
            checks: CheckKind::ALL.to_vec(),
        }
    }
}

impl VerifierPolicy {
    /// Default policy with timestamp regressions downgraded to WARN.
    pub fn lenient() -> Self {
        Self {
            timestamp_regression: Severity::Warn,
            ..Self::default()
        }
    }

    /// Reads a policy from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BundleError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Enabled checks in order, without duplicates.
    pub fn enabled_checks(&self) -> Vec<CheckKind> {
        let mut checks: Vec<CheckKind> = Vec::with_capacity(self.checks.len());
        for kind in &self.checks {
            if !checks.contains(kind) {
                checks.push(*kind);
            }
        }
        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_runs_all_checks_strictly() {
        let policy = VerifierPolicy::default();
        assert_eq!(policy.timestamp_regression, Severity::Fail);
        assert_eq!(policy.enabled_checks(), CheckKind::ALL.to_vec());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let policy: VerifierPolicy =
            serde_json::from_str(r#"{"timestampRegression": "warn"}"#).unwrap();
        assert_eq!(policy, VerifierPolicy::lenient());
    }

    #[test]
    fn duplicate_checks_collapse() {
        let policy: VerifierPolicy = serde_json::from_str(
            r#"{"checks": ["CHAIN_INTEGRITY", "CONTENT_HASH", "CHAIN_INTEGRITY"]}"#,
        )
        .unwrap();
        assert_eq!(
            policy.enabled_checks(),
            vec![CheckKind::ChainIntegrity, CheckKind::ContentHash]
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<VerifierPolicy>(r#"{"strict": true}"#).is_err());
    }

    #[test]
    fn names_match_serde_tags() {
        for kind in CheckKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.name());
        }
    }
}
