use crate::errors::BundleError;
use evidify_canonical::layout::{CODEBOOK_FILE, REQUIRED_FILES, VERIFIER_OUTPUT_FILE};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::warn;

/// Raw bundle contents keyed by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleFiles {
    files: BTreeMap<String, Vec<u8>>,
    unreadable: BTreeMap<String, String>,
}

impl BundleFiles {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the known bundle files from `dir`.
    ///
    /// Absent files are left out and files that exist but cannot be read
    /// are recorded with the reason, so the verifier can report both. Only
    /// a missing or unlistable directory is an error.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, BundleError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(BundleError::NotFound(dir.to_path_buf()));
        }
        fs::read_dir(dir).map_err(|source| BundleError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut bundle = Self::new();
        for name in REQUIRED_FILES
            .into_iter()
            .chain([CODEBOOK_FILE, VERIFIER_OUTPUT_FILE])
        {
            let path = dir.join(name);
            match fs::read(&path) {
                Ok(bytes) => bundle.insert(name, bytes),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(file = name, error = %e, "bundle file unreadable");
                    bundle.mark_unreadable(name, e.to_string());
                }
            }
        }
        Ok(bundle)
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        let name = name.into();
        self.unreadable.remove(&name);
        self.files.insert(name, bytes);
    }

    /// Records that `name` exists but could not be read.
    pub fn mark_unreadable(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        let name = name.into();
        self.files.remove(&name);
        self.unreadable.insert(name, reason.into());
    }

    /// Read failure for `name`, if one was recorded.
    pub fn unreadable(&self, name: &str) -> Option<&str> {
        self.unreadable.get(name).map(String::as_str)
    }

    /// All recorded read failures, by file name.
    pub fn unreadable_files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.unreadable
            .iter()
            .map(|(name, reason)| (name.as_str(), reason.as_str()))
    }

    /// Removes a file.
    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.files.remove(name)
    }

    /// Bytes of a file, if present.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    /// Whether a file is present.
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Mutable bytes of a file, if present.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Vec<u8>> {
        self.files.get_mut(name)
    }
}

impl<N: Into<String>> FromIterator<(N, Vec<u8>)> for BundleFiles {
    fn from_iter<I: IntoIterator<Item = (N, Vec<u8>)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().map(|(n, b)| (n.into(), b)).collect(),
            unreadable: BTreeMap::new(),
        }
    }
}
