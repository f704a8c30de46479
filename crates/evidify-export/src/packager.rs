use crate::bundle::ExportBundle;
use crate::codebook::render_codebook;
use crate::csv::render_table;
use crate::error::ExportError;
use crate::manifest::{FileChecksums, Integrity, TrialManifest};
use evidify_canonical::layout::{EXPORT_VERSION, SCHEMA_VERSION, TIMESTAMP_TRUST_MODEL};
use evidify_canonical::{sha256_hex, DigestAlg, CHAIN_HASH_FORMAT, GENESIS_HASH};
use evidify_core::{compute_metrics, DerivedMetrics, METRIC_FIELDS};
use evidify_ledger::{EventLog, LogSnapshot};
use tracing::{debug, warn};

/// Values written into the manifest header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// `exportVersion` (default `"1.0.0"`).
    pub export_version: String,
    /// `schemaVersion` (default `"1.0"`).
    pub schema_version: String,
    /// `timestampTrustModel` (default `"client_clock_untrusted"`).
    pub timestamp_trust_model: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            export_version: EXPORT_VERSION.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            timestamp_trust_model: TIMESTAMP_TRUST_MODEL.to_string(),
        }
    }
}

/// Packages log snapshots into export bundles.
#[derive(Debug, Clone, Default)]
pub struct ExportPackager {
    options: ExportOptions,
}

impl ExportPackager {
    /// Creates a packager with custom manifest values.
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Snapshots `log` and packages the snapshot with `metrics`.
    ///
    /// The log is only read. Appends made after this call returns are not
    /// part of the bundle.
    pub fn snapshot(
        &self,
        log: &EventLog,
        metrics: &DerivedMetrics,
    ) -> Result<ExportBundle, ExportError> {
        self.package(&log.snapshot(), metrics)
    }

    /// Snapshots `log`, derives its metrics and packages both.
    pub fn export(&self, log: &EventLog) -> Result<ExportBundle, ExportError> {
        let snapshot = log.snapshot();
        let metrics = compute_metrics(snapshot.events());
        self.package(&snapshot, &metrics)
    }

    /// Packages a frozen snapshot.
    ///
    /// Fails with [`ExportError::ChainInvalid`] when the snapshot's chain
    /// does not recompute.
    pub fn package(
        &self,
        snapshot: &LogSnapshot,
        metrics: &DerivedMetrics,
    ) -> Result<ExportBundle, ExportError> {
        let final_hash = snapshot.verify_chain().map_err(|err| {
            warn!(error = %err, "chain self-check failed; export refused");
            ExportError::ChainInvalid(err)
        })?;

        let mut events_jsonl = Vec::new();
        for event in snapshot.events() {
            serde_json::to_writer(&mut events_jsonl, event)?;
            events_jsonl.push(b'\n');
        }

        let mut ledger_json = serde_json::to_vec_pretty(snapshot.ledger())?;
        ledger_json.push(b'\n');

        let metrics_csv = render_table(
            METRIC_FIELDS.iter().map(|field| field.name),
            metrics.values().iter().map(|value| value.render()),
        )
        .into_bytes();

        let codebook_md = render_codebook().into_bytes();

        let manifest = TrialManifest {
            export_version: self.options.export_version.clone(),
            schema_version: self.options.schema_version.clone(),
            session_id: snapshot.session_id().map(ToString::to_string),
            snapshot_at: snapshot
                .events()
                .last()
                .map(|event| event.timestamp.to_string()),
            hash_algorithm: DigestAlg::Sha256,
            chain_hash_format: CHAIN_HASH_FORMAT.to_string(),
            genesis_hash: GENESIS_HASH.to_string(),
            timestamp_trust_model: self.options.timestamp_trust_model.clone(),
            integrity: Integrity {
                event_count: snapshot.len() as u64,
                final_hash,
                chain_valid: true,
            },
            file_checksums: FileChecksums {
                events_file_hash: sha256_hex(&events_jsonl),
                ledger_file_hash: sha256_hex(&ledger_json),
                metrics_file_hash: sha256_hex(&metrics_csv),
                codebook_file_hash: sha256_hex(&codebook_md),
            },
        };
        let mut manifest_json = serde_json::to_vec_pretty(&manifest)?;
        manifest_json.push(b'\n');

        debug!(
            events = manifest.integrity.event_count,
            final_hash = %manifest.integrity.final_hash,
            "snapshot packaged"
        );

        Ok(ExportBundle {
            manifest,
            manifest_json,
            events_jsonl,
            ledger_json,
            metrics_csv,
            codebook_md,
            verifier_output: None,
        })
    }
}
