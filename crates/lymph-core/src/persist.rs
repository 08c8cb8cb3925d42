//! Saving and restoring bilateral models as bundles.
//!
//! The manifest carries the model setup as attributes; the raw patient
//! table travels as `patient_data.json` and is reloaded on restore.

use std::io::{Read, Seek};
use std::path::Path;

use lymph_bundle::{BundleError, BundleManifest, BundleReader, BundleWriter};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::bilateral::Bilateral;
use crate::data::BilateralTable;
use crate::graph::Graph;
use crate::modality::ModalityTable;
use crate::mode::InferenceMode;
use crate::{Error, Result};

pub const MODEL_CLASS: &str = "Bilateral";
pub const PATIENT_DATA_FILE: &str = "patient_data.json";

const ATTR_GRAPH: &str = "graph";
const ATTR_MODALITIES: &str = "modalities";
const ATTR_BASE_SYMMETRIC: &str = "base_symmetric";
const ATTR_TRANS_SYMMETRIC: &str = "trans_symmetric";
const ATTR_SPREAD_PROBS: &str = "spread_probs";

impl Bilateral {
    fn bundle_writer(&self) -> Result<BundleWriter> {
        let layout = self.layout();
        let mut writer = BundleWriter::new(MODEL_CLASS)
            .with_description(format!("{} LNLs per side", self.graph().lnl_count()));
        writer.set_attribute(ATTR_GRAPH, &self.graph().to_key_map()?)?;
        writer.set_attribute(ATTR_MODALITIES, self.modalities()?)?;
        writer.set_attribute(ATTR_BASE_SYMMETRIC, &layout.base_symmetric())?;
        writer.set_attribute(ATTR_TRANS_SYMMETRIC, &layout.trans_symmetric())?;
        if let Ok(probs) = self.spread_probs() {
            writer.set_attribute(ATTR_SPREAD_PROBS, &probs)?;
        }
        writer.add_json(PATIENT_DATA_FILE, &self.patient_data)?;
        Ok(writer)
    }

    pub fn to_bundle(&self, path: &Path) -> Result<BundleManifest> {
        let manifest = self.bundle_writer()?.write(path)?;
        info!(path = %path.display(), "saved bilateral model");
        Ok(manifest)
    }

    pub fn to_bundle_bytes(&self) -> Result<Vec<u8>> {
        let (bytes, _) = self.bundle_writer()?.write_to_vec()?;
        Ok(bytes)
    }

    pub fn from_bundle(path: &Path) -> Result<Self> {
        Self::from_bundle_reader(open_checked(BundleReader::open(path))?)
    }

    pub fn from_bundle_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bundle_reader(open_checked(BundleReader::from_bytes(bytes))?)
    }

    fn from_bundle_reader<R: Read + Seek>(mut reader: BundleReader<R>) -> Result<Self> {
        if reader.model_class() != MODEL_CLASS {
            return Err(Error::Data(format!(
                "bundle holds a '{}' model, expected '{MODEL_CLASS}'",
                reader.model_class()
            )));
        }
        let graph = Graph::from_key_map(&reader.attribute::<Map<String, Value>>(ATTR_GRAPH)?)?;
        let mut model = Bilateral::new(
            graph,
            reader.attribute(ATTR_BASE_SYMMETRIC)?,
            reader.attribute(ATTR_TRANS_SYMMETRIC)?,
        );

        let modalities: ModalityTable = reader.attribute(ATTR_MODALITIES)?;
        if !modalities.is_empty() {
            model.set_modalities(modalities.clone())?;
        }
        if reader.manifest().attributes.contains_key(ATTR_SPREAD_PROBS) {
            let probs: Vec<f64> = reader.attribute(ATTR_SPREAD_PROBS)?;
            model.set_spread_probs(&probs)?;
        }

        let table: Option<BilateralTable> = if reader.has_file(PATIENT_DATA_FILE) {
            reader.read_json(PATIENT_DATA_FILE)?
        } else {
            None
        };
        match table {
            Some(table) if !modalities.is_empty() => {
                let t_stages = table.t_stages()?;
                model.load_data(&table, &t_stages, &modalities, InferenceMode::HiddenMarkovModel)?;
            }
            other => model.patient_data = other,
        }
        Ok(model)
    }
}

fn open_checked<R: Read + Seek>(
    opened: lymph_bundle::Result<BundleReader<R>>,
) -> Result<BundleReader<R>> {
    opened.map_err(|err| {
        if let BundleError::UnsupportedVersion { version, supported } = &err {
            warn!(%version, %supported, "bundle version not supported");
        }
        Error::from(err)
    })
}
