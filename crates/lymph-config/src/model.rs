//! Model setup configuration types.
//!
//! The graph is an ordered list so that the edge order (and with it the
//! layout of the spread-probability vector) is exactly the file order.

use serde::{Deserialize, Serialize};

/// Complete model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Nodes with their outgoing edges, in edge order.
    #[serde(default)]
    pub graph: Vec<GraphEntry>,

    /// Diagnostic modalities in observation order.
    #[serde(default)]
    pub modalities: Vec<ModalityEntry>,

    /// Tie tumor → LNL spread between the two sides.
    #[serde(default)]
    pub base_symmetric: bool,

    /// Tie LNL → LNL spread between the two sides.
    #[serde(default = "default_true")]
    pub trans_symmetric: bool,

    /// T-stage labels, first stage first.
    #[serde(default = "default_t_stages")]
    pub t_stages: Vec<String>,

    #[serde(default)]
    pub time_prior: TimePriorConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            description: None,
            graph: Vec::new(),
            modalities: Vec::new(),
            base_symmetric: false,
            trans_symmetric: true,
            t_stages: default_t_stages(),
            time_prior: TimePriorConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Number of LNL nodes declared in the graph.
    pub fn lnl_count(&self) -> usize {
        self.graph.iter().filter(|e| e.kind == "lnl").count()
    }
}

/// One node and its outgoing edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEntry {
    /// `"tumor"` or `"lnl"`.
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

impl GraphEntry {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, targets: &[&str]) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// A diagnostic modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityEntry {
    pub name: String,
    pub specificity: f64,
    pub sensitivity: f64,
}

/// Binomial time prior settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePriorConfig {
    /// Last diagnosis time step.
    #[serde(default = "default_t_max")]
    pub t_max: usize,

    /// Binomial parameter of the first T-stage.
    #[serde(default = "default_first_p")]
    pub first_p: f64,
}

impl Default for TimePriorConfig {
    fn default() -> Self {
        Self {
            t_max: default_t_max(),
            first_p: default_first_p(),
        }
    }
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

fn default_t_stages() -> Vec<String> {
    vec!["early".to_string(), "late".to_string()]
}

fn default_t_max() -> usize {
    10
}

fn default_first_p() -> f64 {
    0.3
}
