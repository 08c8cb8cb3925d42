//! Checksummed model archives.
//!
//! A model archive is a ZIP file holding:
//! - `manifest.json`: bundle version, model class, free-form attributes
//!   (the model's parameters and settings) and a SHA-256 listing of every
//!   other file
//! - one or more JSON payloads, e.g. `patient_data.json`
//!
//! # Example
//!
//! ```no_run
//! use lymph_bundle::{BundleReader, BundleWriter};
//! use std::path::Path;
//!
//! let mut writer = BundleWriter::new("Bilateral");
//! writer.set_attribute("is_symmetric", &true).unwrap();
//! writer.add_json("patient_data.json", &serde_json::json!([])).unwrap();
//! writer.write(Path::new("model.lymph")).unwrap();
//!
//! let mut reader = BundleReader::open(Path::new("model.lymph")).unwrap();
//! let symmetric: bool = reader.attribute("is_symmetric").unwrap();
//! let data: serde_json::Value = reader.read_json("patient_data.json").unwrap();
//! ```

pub mod error;
pub mod manifest;
pub mod reader;
pub mod writer;

pub use error::{BundleError, Result};
pub use manifest::{BundleManifest, FileEntry, BUNDLE_SCHEMA_VERSION, MANIFEST_FILE_NAME};
pub use reader::BundleReader;
pub use writer::BundleWriter;
