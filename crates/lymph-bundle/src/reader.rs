//! Archive reader with checksum verification.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::{BundleError, BundleManifest, FileEntry, Result, MANIFEST_FILE_NAME};

/// Reader over a model archive. Every payload read is checked against the
/// manifest listing.
pub struct BundleReader<R: Read + Seek> {
    manifest: BundleManifest,
    archive: ZipArchive<R>,
}

impl BundleReader<File> {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }
}

impl BundleReader<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> BundleReader<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let json = {
            let mut file = archive
                .by_name(MANIFEST_FILE_NAME)
                .map_err(|_| BundleError::MissingFile(MANIFEST_FILE_NAME.to_string()))?;
            let mut json = String::new();
            file.read_to_string(&mut json)?;
            json
        };
        let manifest = BundleManifest::from_json(&json)?;
        manifest.validate()?;

        info!(
            model_class = %manifest.model_class,
            files = manifest.file_count(),
            "Bundle opened"
        );

        Ok(Self { manifest, archive })
    }

    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    pub fn model_class(&self) -> &str {
        &self.manifest.model_class
    }

    pub fn attribute<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.manifest.attribute(key)
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.manifest.find_file(path).is_some()
    }

    /// Read a listed payload and check its SHA-256.
    pub fn read_verified(&mut self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .manifest
            .find_file(path)
            .ok_or_else(|| BundleError::FileNotFound(path.to_string()))?
            .clone();

        let mut data = Vec::new();
        self.archive
            .by_name(path)
            .map_err(|_| BundleError::FileNotFound(path.to_string()))?
            .read_to_end(&mut data)?;

        let actual = FileEntry::compute_checksum(&data);
        if actual != entry.sha256 {
            return Err(BundleError::ChecksumMismatch {
                path: path.to_string(),
                expected: entry.sha256,
                actual,
            });
        }

        debug!(path, bytes = data.len(), "File verified");
        Ok(data)
    }

    pub fn read_json<T: DeserializeOwned>(&mut self, path: &str) -> Result<T> {
        let data = self.read_verified(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Verify every listed payload. Returns the paths that failed.
    pub fn verify_all(&mut self) -> Vec<String> {
        let paths: Vec<String> = self.manifest.files.iter().map(|f| f.path.clone()).collect();
        let mut failures = Vec::new();

        for path in paths {
            if let Err(e) = self.read_verified(&path) {
                warn!(path = %path, error = %e, "Verification failed");
                failures.push(path);
            }
        }

        if failures.is_empty() {
            info!("All files verified");
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BundleWriter;

    fn sample() -> Vec<u8> {
        let mut writer = BundleWriter::new("Bilateral");
        writer.set_attribute("is_symmetric", &false).unwrap();
        writer
            .add_json("patient_data.json", &serde_json::json!({"rows": [[true, false]]}))
            .unwrap();
        writer.write_to_vec().unwrap().0
    }

    #[test]
    fn reads_attributes_and_payload() {
        let mut reader = BundleReader::from_bytes(sample()).unwrap();
        assert_eq!(reader.model_class(), "Bilateral");
        let symmetric: bool = reader.attribute("is_symmetric").unwrap();
        assert!(!symmetric);

        let data: serde_json::Value = reader.read_json("patient_data.json").unwrap();
        assert_eq!(data["rows"][0][1], false);
        assert!(reader.verify_all().is_empty());
    }

    #[test]
    fn unlisted_file_is_not_found() {
        let mut reader = BundleReader::from_bytes(sample()).unwrap();
        assert!(!reader.has_file("samples.json"));
        assert!(matches!(
            reader.read_verified("samples.json"),
            Err(BundleError::FileNotFound(_))
        ));
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let result = BundleReader::from_bytes(b"definitely not a zip".to_vec());
        assert!(matches!(result, Err(BundleError::Zip(_))));
    }
}
