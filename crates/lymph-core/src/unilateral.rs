//! Per-side hidden Markov model of lymphatic progression.

use std::collections::HashMap;
use std::fmt;

use lymph_config::ModelConfig;
use lymph_math::{all_in_unit_interval, xlogy};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::data::{UnilateralColumn, UnilateralTable, INFO, T_STAGE};
use crate::graph::Graph;
use crate::matrix::{self, Marginalization};
use crate::modality::ModalityTable;
use crate::mode::{InferenceMode, MarginalizationOptions};
use crate::prior::{check_prior, padded, TimePriors};
use crate::state::{self, check_width, selector, MAX_STATE_BITS};
use crate::{Error, Result};

/// Modality name -> per-LNL diagnosis (`None` = not assessed).
///
/// A modality that is left out is treated as not assessed at all.
pub type Diagnoses = HashMap<String, Vec<Option<bool>>>;

#[derive(Debug, Clone)]
struct StageData {
    label: String,
    marginalization: Marginalization,
}

#[derive(Debug, Clone)]
pub struct Unilateral {
    graph: Graph,
    state: Vec<bool>,
    spread_probs: Option<Vec<f64>>,
    transition: Option<DMatrix<f64>>,
    modalities: ModalityTable,
    observation: Option<DMatrix<f64>>,
    stages: Vec<StageData>,
}

impl Unilateral {
    pub fn new(graph: Graph) -> Self {
        let state = vec![false; graph.lnl_count()];
        Self {
            graph,
            state,
            spread_probs: None,
            transition: None,
            modalities: ModalityTable::new(),
            observation: None,
            stages: Vec::new(),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let mut model = Self::new(Graph::from_entries(&config.graph)?);
        if !config.modalities.is_empty() {
            model.set_modalities(ModalityTable::from_entries(&config.modalities)?)?;
        }
        Ok(model)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn lnl_count(&self) -> usize {
        self.graph.lnl_count()
    }

    pub fn state(&self) -> &[bool] {
        &self.state
    }

    pub fn set_state(&mut self, state: &[bool]) -> Result<()> {
        if state.len() != self.lnl_count() {
            return Err(Error::InvalidArgument(format!(
                "state has {} entries, expected {}",
                state.len(),
                self.lnl_count()
            )));
        }
        self.state = state.to_vec();
        Ok(())
    }

    /// Spread probabilities, base edges first.
    pub fn spread_probs(&self) -> Result<&[f64]> {
        self.spread_probs
            .as_deref()
            .ok_or(Error::Uninitialized("spread probabilities"))
    }

    pub fn base_probs(&self) -> Result<&[f64]> {
        Ok(&self.spread_probs()?[..self.graph.base_edges().len()])
    }

    pub fn trans_probs(&self) -> Result<&[f64]> {
        Ok(&self.spread_probs()?[self.graph.base_edges().len()..])
    }

    /// Assign spread probabilities and rebuild the transition matrix.
    pub fn set_spread_probs(&mut self, probs: &[f64]) -> Result<()> {
        self.check_spread_probs(probs)?;
        self.transition = Some(matrix::transition_matrix(&self.graph, probs));
        self.spread_probs = Some(probs.to_vec());
        Ok(())
    }

    /// Length and range checks of [`Unilateral::set_spread_probs`], without
    /// assigning anything.
    pub(crate) fn check_spread_probs(&self, probs: &[f64]) -> Result<()> {
        let expected = self.graph.edges().len();
        if probs.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "got {} spread probabilities, graph has {expected} edges",
                probs.len()
            )));
        }
        if let Some((k, &value)) = probs
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(Error::OutOfDomain {
                name: self.graph.edge_label(&self.graph.edges()[k]),
                value,
            });
        }
        Ok(())
    }

    pub fn modalities(&self) -> &ModalityTable {
        &self.modalities
    }

    /// Replace the modalities, rebuilding the observation matrix. Loaded
    /// patient data no longer fits and is dropped.
    ///
    /// Fails without changing anything if the observation state would have
    /// more than [`MAX_STATE_BITS`] components.
    pub fn set_modalities(&mut self, modalities: ModalityTable) -> Result<()> {
        let width = self.lnl_count() * modalities.len();
        if width > MAX_STATE_BITS {
            return Err(Error::InvalidArgument(format!(
                "{} modalities over {} LNLs give {width} observation bits, limit is {MAX_STATE_BITS}",
                modalities.len(),
                self.lnl_count()
            )));
        }
        if !self.stages.is_empty() && modalities != self.modalities {
            debug!("modalities changed, dropping loaded patient data");
            self.stages.clear();
        }
        self.observation = Some(matrix::observation_matrix(self.lnl_count(), &modalities));
        self.modalities = modalities;
        Ok(())
    }

    pub fn transition_matrix(&self) -> Result<&DMatrix<f64>> {
        self.transition
            .as_ref()
            .ok_or(Error::Uninitialized("transition matrix"))
    }

    pub fn observation_matrix(&self) -> Result<&DMatrix<f64>> {
        self.observation
            .as_ref()
            .ok_or(Error::Uninitialized("observation matrix"))
    }

    pub fn hidden_states(&self) -> Vec<Vec<bool>> {
        state::enumerate_states(self.lnl_count())
    }

    pub fn observation_states(&self) -> Vec<Vec<bool>> {
        state::enumerate_states(self.observation_width())
    }

    fn observation_width(&self) -> usize {
        self.lnl_count() * self.modalities.len()
    }

    /// Loaded T-stages in loading order.
    pub fn t_stages(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.label.as_str()).collect()
    }

    fn stage(&self, label: &str) -> Result<&StageData> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .ok_or_else(|| Error::UnknownStage(label.to_string()))
    }

    pub fn marginalization_matrix(&self, t_stage: &str) -> Result<&DMatrix<f64>> {
        Ok(&self.stage(t_stage)?.marginalization.matrix)
    }

    /// Patients per marginalization column.
    pub fn patient_counts(&self, t_stage: &str) -> Result<&DVector<f64>> {
        Ok(&self.stage(t_stage)?.marginalization.counts)
    }

    /// Hidden state distribution for `t = 0..=t_last`, one row per step.
    pub fn evolve(&self, t_last: usize) -> Result<DMatrix<f64>> {
        Ok(matrix::evolve(self.transition_matrix()?, t_last))
    }

    /// Build one marginalization matrix per T-stage from `table`.
    ///
    /// The table needs an `("info", "t_stage")` column and one
    /// `(modality, lnl)` column per modality and LNL. Patients of stages not
    /// listed in `t_stages` are ignored.
    pub fn load_data(
        &mut self,
        table: &UnilateralTable,
        t_stages: &[String],
        modalities: &ModalityTable,
        mode: InferenceMode,
        options: MarginalizationOptions,
    ) -> Result<()> {
        mode.require_hmm()?;
        table.validate()?;
        for (i, stage) in t_stages.iter().enumerate() {
            if t_stages[..i].contains(stage) {
                return Err(Error::InvalidArgument(format!("T-stage '{stage}' listed twice")));
            }
        }

        self.set_modalities(modalities.clone())?;

        let stage_col = table
            .column_index(&UnilateralColumn::t_stage())
            .ok_or_else(|| Error::MissingColumn(format!("{INFO}/{T_STAGE}")))?;
        let mut columns = Vec::with_capacity(self.observation_width());
        for name in modalities.names() {
            for lnl in self.graph.lnl_names() {
                let col = table
                    .column_index(&UnilateralColumn::new(name, lnl))
                    .ok_or_else(|| Error::MissingColumn(format!("{name}/{lnl}")))?;
                columns.push(col);
            }
        }

        let width = self.observation_width();
        let mut stages = Vec::with_capacity(t_stages.len());
        for label in t_stages {
            let mut patterns = Vec::new();
            for row in &table.rows {
                if row[stage_col].as_text()? != label {
                    continue;
                }
                let pattern = columns
                    .iter()
                    .map(|&c| row[c].as_flag())
                    .collect::<Result<Vec<_>>>()?;
                patterns.push(pattern);
            }
            let marginalization = matrix::marginalization_matrix(width, &patterns, options);
            debug!(
                t_stage = %label,
                patients = patterns.len(),
                columns = marginalization.matrix.ncols(),
                "built marginalization matrix"
            );
            stages.push(StageData {
                label: label.clone(),
                marginalization,
            });
        }
        self.stages = stages;
        Ok(())
    }

    /// Log-likelihood of the loaded data under `spread_probs`.
    ///
    /// Out-of-range probabilities give `-∞`.
    pub fn marg_likelihood(
        &mut self,
        spread_probs: &[f64],
        time_priors: &TimePriors,
        mode: InferenceMode,
    ) -> Result<f64> {
        if spread_probs.len() != self.graph.edges().len() {
            return Err(Error::InvalidArgument(format!(
                "got {} spread probabilities, graph has {} edges",
                spread_probs.len(),
                self.graph.edges().len()
            )));
        }
        mode.require_hmm()?;
        if !all_in_unit_interval(spread_probs) {
            return Ok(f64::NEG_INFINITY);
        }
        self.set_spread_probs(spread_probs)?;

        let len = self.longest_prior(time_priors)?;
        let observed = self.evolve(len - 1)? * self.observation_matrix()?;

        let mut total = 0.0;
        for stage in &self.stages {
            let prior = padded(&time_priors[&stage.label], len);
            let per_column = prior.transpose() * &observed * &stage.marginalization.matrix;
            total += per_column
                .iter()
                .zip(stage.marginalization.counts.iter())
                .map(|(&p, &f)| xlogy(f, p))
                .sum::<f64>();
        }
        Ok(total)
    }

    /// Number of time steps needed to cover every loaded stage's prior.
    pub(crate) fn longest_prior(&self, time_priors: &TimePriors) -> Result<usize> {
        if self.stages.is_empty() {
            return Err(Error::Uninitialized("patient data"));
        }
        let mut len = 0;
        for stage in &self.stages {
            let prior = time_priors
                .get(&stage.label)
                .ok_or_else(|| Error::UnknownStage(stage.label.clone()))?;
            check_prior(prior)?;
            len = len.max(prior.len());
        }
        Ok(len)
    }

    /// Indicator over observation states compatible with `diagnoses`.
    pub fn diagnosis_selector(&self, diagnoses: &Diagnoses) -> Result<DVector<f64>> {
        if let Some(unknown) = diagnoses.keys().find(|name| !self.modalities.contains(name)) {
            return Err(Error::UnknownModality(unknown.clone()));
        }
        let l = self.lnl_count();
        let mut pattern = Vec::with_capacity(self.observation_width());
        for name in self.modalities.names() {
            match diagnoses.get(name) {
                Some(diagnosis) => {
                    check_width(diagnosis, l, &format!("diagnosis for {name}"))?;
                    pattern.extend_from_slice(diagnosis);
                }
                None => pattern.extend(std::iter::repeat(None).take(l)),
            }
        }
        Ok(selector(&pattern))
    }

    /// Posterior over hidden states given `diagnoses`, marginalized over
    /// diagnose time with `time_prior`.
    pub fn posterior(
        &self,
        diagnoses: &Diagnoses,
        time_prior: &[f64],
        mode: InferenceMode,
    ) -> Result<DVector<f64>> {
        mode.require_hmm()?;
        check_prior(time_prior)?;
        let c_z = self.diagnosis_selector(diagnoses)?;
        let p_x = self.evolve(time_prior.len() - 1)?.tr_mul(&padded(time_prior, time_prior.len()));
        let p_d = self.observation_matrix()? * c_z;
        let joint = p_x.component_mul(&p_d);
        let evidence = joint.sum();
        if evidence <= 0.0 {
            return Err(Error::ZeroEvidence);
        }
        Ok(joint / evidence)
    }

    /// Probability of `involvement` given `diagnoses`.
    pub fn risk(
        &self,
        involvement: &[Option<bool>],
        diagnoses: &Diagnoses,
        time_prior: &[f64],
        mode: InferenceMode,
    ) -> Result<f64> {
        check_width(involvement, self.lnl_count(), "involvement")?;
        let posterior = self.posterior(diagnoses, time_prior, mode)?;
        Ok(selector(involvement).dot(&posterior))
    }
}

impl fmt::Display for Unilateral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.graph.nodes();
        for (k, edge) in self.graph.edges().iter().enumerate() {
            let source = &nodes[edge.source].name;
            let target = &nodes[edge.target].name;
            match &self.spread_probs {
                Some(probs) => writeln!(f, "{source} ---{:>6.2}%--> {target}", 100.0 * probs[k])?,
                None => writeln!(f, "{source} ---> {target}")?,
            }
        }
        Ok(())
    }
}
