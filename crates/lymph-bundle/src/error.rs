//! Error types for model archives.

use thiserror::Error;

/// Errors raised while writing or reading a model archive.
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("checksum mismatch for '{path}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// The manifest itself is absent from the archive.
    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("unsupported bundle version: {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    #[error("corrupted manifest: {0}")]
    CorruptedManifest(String),

    /// A path listed by the caller but not by the manifest.
    #[error("file not found in bundle: {0}")]
    FileNotFound(String),

    #[error("attribute not found in manifest: {0}")]
    MissingAttribute(String),

    #[error("file added twice: {0}")]
    DuplicateFile(String),

    #[error("bundle has no content to write")]
    EmptyBundle,
}

pub type Result<T> = std::result::Result<T, BundleError>;
