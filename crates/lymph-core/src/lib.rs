//! Lymph Core Library
//!
//! Hidden Markov models of lymphatic tumor progression in the head and neck:
//! - Per-side models over the involvement of lymph node levels (LNLs)
//! - Bilateral models tying the spread parameters of both neck sides
//! - Joint likelihoods of patient data and conditional risk of involvement
//! - Ensemble sampling with an autocorrelation-based stopping rule
//! - Persistence of model setups and patient data as checksummed bundles

pub mod bilateral;
pub mod data;
pub mod error;
pub mod graph;
pub mod logging;
pub mod matrix;
pub mod modality;
pub mod mode;
pub mod persist;
pub mod prior;
pub mod sampler;
pub mod side;
pub mod state;
pub mod synthetic;
pub mod unilateral;

pub use bilateral::{Bilateral, ParameterLayout};
pub use data::{BilateralColumn, BilateralTable, CellValue, UnilateralColumn, UnilateralTable};
pub use error::{Error, ErrorCategory, Result};
pub use graph::{Edge, EdgeSource, Graph, Node, NodeKind};
pub use modality::{Modality, ModalityTable};
pub use mode::{InferenceMode, MarginalizationOptions};
pub use prior::{binomial_stage_priors, TimePriors};
pub use sampler::{
    CombinedObjective, ConvergenceSampler, LogDensity, MoveMixture, SamplerSettings,
    SamplingOutcome,
};
pub use side::{BySide, Side};
pub use unilateral::{Diagnoses, Unilateral};
