//! Archive writer.

use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::{BundleError, BundleManifest, FileEntry, Result, MANIFEST_FILE_NAME};

/// Builder for a model archive.
pub struct BundleWriter {
    manifest: BundleManifest,
    files: Vec<(String, Vec<u8>)>,
}

impl BundleWriter {
    pub fn new(model_class: impl Into<String>) -> Self {
        Self {
            manifest: BundleManifest::new(model_class),
            files: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.manifest = self.manifest.with_description(description);
        self
    }

    /// Record a model attribute in the manifest.
    pub fn set_attribute<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        self.manifest.set_attribute(key, value)
    }

    /// Add a payload, checksumming it for the manifest.
    pub fn add_bytes(&mut self, path: impl Into<String>, data: Vec<u8>) -> Result<()> {
        let path = path.into();
        if path == MANIFEST_FILE_NAME || self.manifest.find_file(&path).is_some() {
            return Err(BundleError::DuplicateFile(path));
        }
        let entry = FileEntry::for_data(&path, &data);
        debug!(path = %path, bytes = entry.bytes, "Added file to bundle");
        self.manifest.add_file(entry);
        self.files.push((path, data));
        Ok(())
    }

    pub fn add_json<T: Serialize>(&mut self, path: impl Into<String>, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.add_bytes(path, json.into_bytes())
    }

    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Write the archive to `path`.
    pub fn write(self, path: &Path) -> Result<BundleManifest> {
        let file = File::create(path)?;
        let (_, manifest) = self.write_into(file)?;
        info!(
            path = %path.display(),
            model_class = %manifest.model_class,
            files = manifest.file_count(),
            bytes = manifest.total_bytes(),
            "Bundle written"
        );
        Ok(manifest)
    }

    /// Write the archive into memory.
    pub fn write_to_vec(self) -> Result<(Vec<u8>, BundleManifest)> {
        let (cursor, manifest) = self.write_into(Cursor::new(Vec::new()))?;
        Ok((cursor.into_inner(), manifest))
    }

    fn write_into<W: Write + Seek>(mut self, sink: W) -> Result<(W, BundleManifest)> {
        if self.files.is_empty() {
            return Err(BundleError::EmptyBundle);
        }

        self.manifest.sort_files();
        self.files.sort_by(|a, b| a.0.cmp(&b.0));
        let manifest_json = self.manifest.to_json()?;

        let mut zip = ZipWriter::new(sink);
        let options: FileOptions<'_, ()> = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        zip.start_file(MANIFEST_FILE_NAME, options)?;
        zip.write_all(manifest_json.as_bytes())?;
        for (file_path, data) in &self.files {
            zip.start_file(file_path.as_str(), options)?;
            zip.write_all(data)?;
        }
        let sink = zip.finish()?;

        Ok((sink, self.manifest))
    }
}
