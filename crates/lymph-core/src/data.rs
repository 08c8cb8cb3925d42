//! Patient tables.
//!
//! Bilateral tables label columns with three levels: modality (or `"info"`),
//! side, and LNL (or field). Splitting by side keeps the columns of that side
//! plus the side-less ones (like the tumor's T-stage) and drops the side
//! level. Rows are never filtered, so duplicates and fully unknown patients
//! appear on both sides.

use serde::{Deserialize, Serialize};

use crate::side::Side;
use crate::{Error, Result};

pub const INFO: &str = "info";
pub const T_STAGE: &str = "t_stage";

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Flag(bool),
    Text(String),
    Missing,
}

impl CellValue {
    /// Read the cell as a diagnosis: `None` when unknown.
    pub fn as_flag(&self) -> Result<Option<bool>> {
        match self {
            CellValue::Flag(b) => Ok(Some(*b)),
            CellValue::Missing => Ok(None),
            CellValue::Text(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                "" | "nan" | "none" => Ok(None),
                _ => Err(Error::Data(format!("'{s}' is not a diagnosis"))),
            },
        }
    }

    pub fn as_text(&self) -> Result<&str> {
        match self {
            CellValue::Text(s) => Ok(s),
            other => Err(Error::Data(format!("expected text, got {other:?}"))),
        }
    }
}

impl From<Option<bool>> for CellValue {
    fn from(value: Option<bool>) -> Self {
        value.map_or(CellValue::Missing, CellValue::Flag)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

/// `(modality or "info", side, LNL or field)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BilateralColumn(pub String, pub String, pub String);

impl BilateralColumn {
    pub fn new(top: &str, side: &str, field: &str) -> Self {
        Self(top.to_string(), side.to_string(), field.to_string())
    }

    pub fn t_stage() -> Self {
        Self::new(INFO, "tumor", T_STAGE)
    }
}

/// `(modality or "info", LNL or field)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnilateralColumn(pub String, pub String);

impl UnilateralColumn {
    pub fn new(top: &str, field: &str) -> Self {
        Self(top.to_string(), field.to_string())
    }

    pub fn t_stage() -> Self {
        Self::new(INFO, T_STAGE)
    }
}

/// Rows of patients under labelled columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientTable<C> {
    pub columns: Vec<C>,
    pub rows: Vec<Vec<CellValue>>,
}

pub type BilateralTable = PatientTable<BilateralColumn>;
pub type UnilateralTable = PatientTable<UnilateralColumn>;

impl<C: PartialEq> PatientTable<C> {
    pub fn new(columns: Vec<C>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Data(format!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &C) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Check that every row has one cell per column.
    pub fn validate(&self) -> Result<()> {
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(Error::Data(format!(
                    "row {i} has {} cells, table has {} columns",
                    row.len(),
                    self.columns.len()
                )));
            }
        }
        Ok(())
    }
}

impl BilateralTable {
    /// The per-side view of this table.
    pub fn split(&self, side: Side) -> Result<UnilateralTable> {
        self.validate()?;
        let other = side.other().as_str();
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.1 != other)
            .map(|(i, _)| i)
            .collect();

        Ok(UnilateralTable {
            columns: keep
                .iter()
                .map(|&i| {
                    let BilateralColumn(top, _, field) = &self.columns[i];
                    UnilateralColumn(top.clone(), field.clone())
                })
                .collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Distinct T-stage labels in order of first appearance.
    pub fn t_stages(&self) -> Result<Vec<String>> {
        let col = self
            .column_index(&BilateralColumn::t_stage())
            .ok_or_else(|| Error::MissingColumn(format!("{INFO}/tumor/{T_STAGE}")))?;
        let mut stages: Vec<String> = Vec::new();
        for row in &self.rows {
            let stage = row[col].as_text()?;
            if !stages.iter().any(|s| s == stage) {
                stages.push(stage.to_string());
            }
        }
        Ok(stages)
    }
}
