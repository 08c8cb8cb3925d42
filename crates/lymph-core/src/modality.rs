//! Diagnostic modalities.
//!
//! A modality table is ordered: the position of a modality fixes where its
//! bits sit in an observation state. It serializes as a JSON object
//! `name -> [specificity, sensitivity]` in that order.

use std::fmt;

use lymph_config::ModalityEntry;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Specificity and sensitivity of one diagnostic modality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Modality {
    specificity: f64,
    sensitivity: f64,
}

impl Modality {
    pub fn new(specificity: f64, sensitivity: f64) -> Result<Self> {
        for (name, value) in [("specificity", specificity), ("sensitivity", sensitivity)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::OutOfDomain {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(Self {
            specificity,
            sensitivity,
        })
    }

    pub fn specificity(&self) -> f64 {
        self.specificity
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// P(observed `positive` | hidden `involved`).
    pub fn likelihood(&self, involved: bool, positive: bool) -> f64 {
        match (involved, positive) {
            (false, false) => self.specificity,
            (false, true) => 1.0 - self.specificity,
            (true, true) => self.sensitivity,
            (true, false) => 1.0 - self.sensitivity,
        }
    }
}

impl TryFrom<[f64; 2]> for Modality {
    type Error = Error;

    fn try_from([specificity, sensitivity]: [f64; 2]) -> Result<Self> {
        Self::new(specificity, sensitivity)
    }
}

impl From<Modality> for [f64; 2] {
    fn from(m: Modality) -> Self {
        [m.specificity, m.sensitivity]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalityTable {
    entries: Vec<(String, Modality)>,
}

impl ModalityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[ModalityEntry]) -> Result<Self> {
        let mut table = Self::new();
        for entry in entries {
            table.insert(&entry.name, Modality::new(entry.specificity, entry.sensitivity)?);
        }
        Ok(table)
    }

    /// Add a modality, replacing an existing one of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, modality: Modality) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = modality,
            None => self.entries.push((name, modality)),
        }
    }

    /// Builder form of [`ModalityTable::insert`].
    pub fn with(mut self, name: impl Into<String>, specificity: f64, sensitivity: f64) -> Result<Self> {
        self.insert(name, Modality::new(specificity, sensitivity)?);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Modality> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Modality)> {
        self.entries.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl Serialize for ModalityTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, modality) in &self.entries {
            map.serialize_entry(name, modality)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ModalityTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = ModalityTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of modality name to [specificity, sensitivity]")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut table = ModalityTable::new();
                while let Some((name, modality)) = access.next_entry::<String, Modality>()? {
                    table.insert(name, modality);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
