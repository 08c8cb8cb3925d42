//! Archive manifest: model metadata plus a checksum listing.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::{BundleError, Result};

/// Current archive format version.
pub const BUNDLE_SCHEMA_VERSION: &str = "1.0.0";

/// Manifest file name within the archive.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Manifest describing the stored model and the files next to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    pub bundle_version: String,

    pub created_at: DateTime<Utc>,

    /// Class name of the stored model, e.g. `"Bilateral"`.
    pub model_class: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Model attributes, in insertion order.
    #[serde(default)]
    pub attributes: Map<String, Value>,

    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl BundleManifest {
    pub fn new(model_class: impl Into<String>) -> Self {
        Self {
            bundle_version: BUNDLE_SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            model_class: model_class.into(),
            description: None,
            attributes: Map::new(),
            files: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Store a serializable attribute, replacing any previous value.
    pub fn set_attribute<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        self.attributes
            .insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Deserialize a stored attribute.
    pub fn attribute<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .attributes
            .get(key)
            .ok_or_else(|| BundleError::MissingAttribute(key.to_string()))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn add_file(&mut self, entry: FileEntry) {
        self.files.push(entry);
    }

    pub fn find_file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }

    pub fn validate(&self) -> Result<()> {
        if self.bundle_version != BUNDLE_SCHEMA_VERSION {
            return Err(BundleError::UnsupportedVersion {
                version: self.bundle_version.clone(),
                supported: BUNDLE_SCHEMA_VERSION.to_string(),
            });
        }
        if self.model_class.is_empty() {
            return Err(BundleError::CorruptedManifest(
                "model_class is empty".to_string(),
            ));
        }
        for file in &self.files {
            if file.path.is_empty() || file.path == MANIFEST_FILE_NAME {
                return Err(BundleError::CorruptedManifest(format!(
                    "invalid file entry path '{}'",
                    file.path
                )));
            }
            if file.sha256.len() != 64 {
                return Err(BundleError::CorruptedManifest(format!(
                    "file '{}' has invalid checksum length",
                    file.path
                )));
            }
        }
        Ok(())
    }

    pub fn sort_files(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A payload file and its SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub sha256: String,
    pub bytes: u64,
}

impl FileEntry {
    /// Entry for `data`, checksummed on construction.
    pub fn for_data(path: impl Into<String>, data: &[u8]) -> Self {
        Self {
            path: path.into(),
            sha256: Self::compute_checksum(data),
            bytes: data.len() as u64,
        }
    }

    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    pub fn verify(&self, data: &[u8]) -> bool {
        Self::compute_checksum(data) == self.sha256
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_keep_insertion_order() {
        let mut manifest = BundleManifest::new("Bilateral");
        manifest.set_attribute("zeta", &1).unwrap();
        manifest.set_attribute("alpha", &2).unwrap();
        manifest.set_attribute("mid", &3).unwrap();

        let keys: Vec<_> = manifest.attributes.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn attribute_roundtrips_through_json() {
        let mut manifest = BundleManifest::new("Bilateral").with_description("fit #1");
        manifest
            .set_attribute("spread_probs", &vec![0.1, 0.2, 0.3])
            .unwrap();
        let json = manifest.to_json().unwrap();
        let parsed = BundleManifest::from_json(&json).unwrap();

        let probs: Vec<f64> = parsed.attribute("spread_probs").unwrap();
        assert_eq!(probs, vec![0.1, 0.2, 0.3]);
        assert_eq!(parsed.description.as_deref(), Some("fit #1"));
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let manifest = BundleManifest::new("Bilateral");
        let result: Result<bool> = manifest.attribute("is_symmetric");
        assert!(matches!(result, Err(BundleError::MissingAttribute(_))));
    }

    #[test]
    fn validate_rejects_short_checksum() {
        let mut manifest = BundleManifest::new("Bilateral");
        manifest.add_file(FileEntry {
            path: "patient_data.json".to_string(),
            sha256: "abc".to_string(),
            bytes: 3,
        });
        assert!(matches!(
            manifest.validate(),
            Err(BundleError::CorruptedManifest(_))
        ));
    }

    #[test]
    fn validate_rejects_foreign_version() {
        let mut manifest = BundleManifest::new("Bilateral");
        manifest.bundle_version = "0.0.1".to_string();
        assert!(matches!(
            manifest.validate(),
            Err(BundleError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn file_entry_checksum() {
        // SHA-256 of "hello world"
        let entry = FileEntry::for_data("x.txt", b"hello world");
        assert_eq!(
            entry.sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(entry.bytes, 11);
        assert!(entry.verify(b"hello world"));
        assert!(!entry.verify(b"hello world!"));
    }
}
