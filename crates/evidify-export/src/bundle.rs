use crate::error::ExportError;
use crate::manifest::TrialManifest;
use evidify_canonical::layout::{
    CODEBOOK_FILE, EVENTS_FILE, LEDGER_FILE, MANIFEST_FILE, METRICS_FILE, VERIFIER_OUTPUT_FILE,
};
use std::fs;
use std::path::Path;
use tracing::info;

/// Serialized export bundle held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    /// Parsed form of [`manifest_json`](Self::manifest_json).
    pub manifest: TrialManifest,
    /// `trial_manifest.json` bytes.
    pub manifest_json: Vec<u8>,
    /// `events.jsonl` bytes.
    pub events_jsonl: Vec<u8>,
    /// `ledger.json` bytes.
    pub ledger_json: Vec<u8>,
    /// `derived_metrics.csv` bytes.
    pub metrics_csv: Vec<u8>,
    /// `codebook.md` bytes.
    pub codebook_md: Vec<u8>,
    /// `verifier_output.json` bytes, once a verification has been run.
    pub verifier_output: Option<Vec<u8>>,
}

impl ExportBundle {
    /// Attaches the output of a verification run.
    ///
    /// The verifier output is not covered by the manifest checksums.
    pub fn with_verifier_output(mut self, output: Vec<u8>) -> Self {
        self.verifier_output = Some(output);
        self
    }

    /// `(file name, bytes)` for every file in the bundle.
    pub fn files(&self) -> Vec<(&'static str, &[u8])> {
        let mut files = vec![
            (MANIFEST_FILE, self.manifest_json.as_slice()),
            (EVENTS_FILE, self.events_jsonl.as_slice()),
            (LEDGER_FILE, self.ledger_json.as_slice()),
            (METRICS_FILE, self.metrics_csv.as_slice()),
            (CODEBOOK_FILE, self.codebook_md.as_slice()),
        ];
        if let Some(output) = &self.verifier_output {
            files.push((VERIFIER_OUTPUT_FILE, output.as_slice()));
        }
        files
    }

    /// Writes every file into `dir`, creating it if needed.
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<(), ExportError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        for (name, bytes) in self.files() {
            fs::write(dir.join(name), bytes)?;
        }
        info!(
            dir = %dir.display(),
            events = self.manifest.integrity.event_count,
            final_hash = %self.manifest.integrity.final_hash,
            "export bundle written"
        );
        Ok(())
    }
}
