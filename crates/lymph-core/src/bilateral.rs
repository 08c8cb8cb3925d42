//! Bilateral model: two per-side models with tied spread parameters.
//!
//! Both sides share one graph and one modality table. Patients are loaded
//! with one marginalization column per patient on each side, so that column
//! `k` of the ipsilateral and contralateral matrices belong to the same
//! patient and the joint likelihood can pair them up.

use std::fmt;

use lymph_config::ModelConfig;
use lymph_math::all_in_unit_interval;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::data::BilateralTable;
use crate::graph::Graph;
use crate::modality::ModalityTable;
use crate::mode::{InferenceMode, MarginalizationOptions};
use crate::prior::{binomial_stage_priors, check_prior, padded, TimePriors};
use crate::side::{BySide, Side};
use crate::state::{check_width, selector};
use crate::unilateral::{Diagnoses, Unilateral};
use crate::{Error, Result};

/// Position of each side's spread probabilities in the bilateral vector.
///
/// The vector is base-ipsi, base-contra (only if base spread is not
/// symmetric), trans-ipsi, trans-contra (only if transition spread is not
/// symmetric).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterLayout {
    num_base: usize,
    num_trans: usize,
    base_symmetric: bool,
    trans_symmetric: bool,
}

impl ParameterLayout {
    pub fn new(graph: &Graph, base_symmetric: bool, trans_symmetric: bool) -> Self {
        Self {
            num_base: graph.base_edges().len(),
            num_trans: graph.trans_edges().len(),
            base_symmetric,
            trans_symmetric,
        }
    }

    pub fn base_symmetric(&self) -> bool {
        self.base_symmetric
    }

    pub fn trans_symmetric(&self) -> bool {
        self.trans_symmetric
    }

    pub fn len(&self) -> usize {
        let base = if self.base_symmetric { 1 } else { 2 };
        let trans = if self.trans_symmetric { 1 } else { 2 };
        base * self.num_base + trans * self.num_trans
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-side spread probabilities, each base edges first.
    pub fn split(&self, theta: &[f64]) -> Result<BySide<Vec<f64>>> {
        if theta.len() != self.len() {
            return Err(Error::InvalidArgument(format!(
                "got {} spread probabilities, expected {}",
                theta.len(),
                self.len()
            )));
        }
        let (nb, nt) = (self.num_base, self.num_trans);
        let base_ipsi = &theta[..nb];
        let (base_contra, rest) = if self.base_symmetric {
            (base_ipsi, &theta[nb..])
        } else {
            (&theta[nb..2 * nb], &theta[2 * nb..])
        };
        let trans_ipsi = &rest[..nt];
        let trans_contra = if self.trans_symmetric {
            trans_ipsi
        } else {
            &rest[nt..]
        };
        Ok(BySide::new(
            [base_ipsi, trans_ipsi].concat(),
            [base_contra, trans_contra].concat(),
        ))
    }

    /// Inverse of [`ParameterLayout::split`]. Tied values are read from the
    /// ipsilateral side.
    pub fn join(&self, probs: BySide<&[f64]>) -> Vec<f64> {
        let nb = self.num_base;
        let mut theta = Vec::with_capacity(self.len());
        theta.extend_from_slice(&probs.ipsi[..nb]);
        if !self.base_symmetric {
            theta.extend_from_slice(&probs.contra[..nb]);
        }
        theta.extend_from_slice(&probs.ipsi[nb..]);
        if !self.trans_symmetric {
            theta.extend_from_slice(&probs.contra[nb..]);
        }
        theta
    }
}

#[derive(Debug, Clone)]
pub struct Bilateral {
    sides: BySide<Unilateral>,
    layout: ParameterLayout,
    pub(crate) patient_data: Option<BilateralTable>,
}

impl Bilateral {
    pub fn new(graph: Graph, base_symmetric: bool, trans_symmetric: bool) -> Self {
        let layout = ParameterLayout::new(&graph, base_symmetric, trans_symmetric);
        Self {
            sides: BySide::new(Unilateral::new(graph.clone()), Unilateral::new(graph)),
            layout,
            patient_data: None,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let graph = Graph::from_entries(&config.graph)?;
        let mut model = Self::new(graph, config.base_symmetric, config.trans_symmetric);
        if !config.modalities.is_empty() {
            model.set_modalities(ModalityTable::from_entries(&config.modalities)?)?;
        }
        debug!(
            lnls = model.graph().lnl_count(),
            parameters = model.layout.len(),
            "built bilateral model from config"
        );
        Ok(model)
    }

    pub fn side(&self, side: Side) -> &Unilateral {
        &self.sides[side]
    }

    pub fn ipsi(&self) -> &Unilateral {
        &self.sides.ipsi
    }

    pub fn contra(&self) -> &Unilateral {
        &self.sides.contra
    }

    pub fn graph(&self) -> &Graph {
        self.sides.ipsi.graph()
    }

    pub fn layout(&self) -> ParameterLayout {
        self.layout
    }

    /// Change the tying of spread parameters. Each side keeps its current
    /// probabilities.
    pub fn set_symmetry(&mut self, base_symmetric: bool, trans_symmetric: bool) {
        self.layout = ParameterLayout::new(self.graph(), base_symmetric, trans_symmetric);
    }

    /// Ipsilateral state followed by the contralateral one.
    pub fn state(&self) -> Vec<bool> {
        [self.sides.ipsi.state(), self.sides.contra.state()].concat()
    }

    pub fn set_state(&mut self, state: &[bool]) -> Result<()> {
        let l = self.graph().lnl_count();
        if state.len() != 2 * l {
            return Err(Error::InvalidArgument(format!(
                "bilateral state has {} entries, expected {}",
                state.len(),
                2 * l
            )));
        }
        self.sides.ipsi.set_state(&state[..l])?;
        self.sides.contra.set_state(&state[l..])
    }

    pub fn spread_probs(&self) -> Result<Vec<f64>> {
        Ok(self.layout.join(BySide::new(
            self.sides.ipsi.spread_probs()?,
            self.sides.contra.spread_probs()?,
        )))
    }

    /// Assign the spread probabilities of both sides. Nothing changes if
    /// either side rejects its share.
    pub fn set_spread_probs(&mut self, theta: &[f64]) -> Result<()> {
        let split = self.layout.split(theta)?;
        for side in Side::BOTH {
            self.sides[side].check_spread_probs(&split[side])?;
        }
        for side in Side::BOTH {
            self.sides[side].set_spread_probs(&split[side])?;
        }
        Ok(())
    }

    /// The shared modality table.
    pub fn modalities(&self) -> Result<&ModalityTable> {
        let ipsi = self.sides.ipsi.modalities();
        if ipsi != self.sides.contra.modalities() {
            return Err(Error::ModalityMismatch);
        }
        Ok(ipsi)
    }

    /// Set the modality table of both sides. A different table drops the
    /// loaded patient data.
    pub fn set_modalities(&mut self, modalities: ModalityTable) -> Result<()> {
        let changed = Side::BOTH
            .iter()
            .any(|&side| self.sides[side].modalities() != &modalities);
        self.sides.contra.set_modalities(modalities.clone())?;
        self.sides.ipsi.set_modalities(modalities)?;
        if changed && self.patient_data.take().is_some() {
            debug!("modalities changed, dropping bilateral patient data");
        }
        Ok(())
    }

    /// Split `table` by side and load both halves, one column per patient.
    pub fn load_data(
        &mut self,
        table: &BilateralTable,
        t_stages: &[String],
        modalities: &ModalityTable,
        mode: InferenceMode,
    ) -> Result<()> {
        mode.require_hmm()?;
        for side in Side::BOTH {
            let half = table.split(side)?;
            self.sides[side].load_data(
                &half,
                t_stages,
                modalities,
                mode,
                MarginalizationOptions::PER_PATIENT,
            )?;
        }
        self.patient_data = Some(table.clone());
        debug!(patients = table.len(), stages = t_stages.len(), "loaded bilateral data");
        Ok(())
    }

    /// The table last passed to [`Bilateral::load_data`].
    pub fn patient_data(&self) -> Option<&BilateralTable> {
        self.patient_data.as_ref()
    }

    pub fn t_stages(&self) -> Vec<&str> {
        self.sides.ipsi.t_stages()
    }

    /// Joint log-likelihood of the loaded patients of `t_stages`.
    ///
    /// Out-of-range probabilities give `-∞`.
    pub fn marg_likelihood(
        &mut self,
        theta: &[f64],
        t_stages: &[String],
        time_priors: &TimePriors,
        mode: InferenceMode,
    ) -> Result<f64> {
        if theta.len() != self.layout.len() {
            return Err(Error::InvalidArgument(format!(
                "got {} spread probabilities, expected {}",
                theta.len(),
                self.layout.len()
            )));
        }
        mode.require_hmm()?;
        if !all_in_unit_interval(theta) {
            return Ok(f64::NEG_INFINITY);
        }
        self.set_spread_probs(theta)?;

        if self.t_stages().is_empty() {
            return Err(Error::Uninitialized("patient data"));
        }
        let mut len = 0;
        for stage in t_stages {
            let prior = time_priors
                .get(stage)
                .ok_or_else(|| Error::UnknownStage(stage.clone()))?;
            check_prior(prior)?;
            len = len.max(prior.len());
        }
        if len == 0 {
            return Ok(0.0);
        }

        let observed = BySide::try_from_fn(|side| {
            let model = &self.sides[side];
            Ok::<_, Error>(model.evolve(len - 1)? * model.observation_matrix()?)
        })?;

        let mut total = 0.0;
        for stage in t_stages {
            let c_ipsi = self.sides.ipsi.marginalization_matrix(stage)?;
            let c_contra = self.sides.contra.marginalization_matrix(stage)?;
            if c_ipsi.ncols() != c_contra.ncols() {
                return Err(Error::Data(format!(
                    "stage '{stage}' has {} ipsilateral and {} contralateral patients",
                    c_ipsi.ncols(),
                    c_contra.ncols()
                )));
            }
            let prior = DMatrix::from_diagonal(&padded(&time_priors[stage], len));
            let joint = observed.ipsi.transpose() * prior * &observed.contra;
            let per_patient = c_ipsi.component_mul(&(joint * c_contra)).row_sum();
            total += per_patient.iter().map(|p| p.ln()).sum::<f64>();
        }
        Ok(total)
    }

    /// Log-likelihood with Binomial time priors.
    ///
    /// `theta` holds the spread probabilities followed by one Binomial
    /// parameter for every T-stage after the first; the first stage uses
    /// `first_p`.
    pub fn combined_likelihood(
        &mut self,
        theta: &[f64],
        t_stages: &[String],
        t_max: usize,
        first_p: f64,
        mode: InferenceMode,
    ) -> Result<f64> {
        if !(0.0..=1.0).contains(&first_p) {
            return Err(Error::OutOfDomain {
                name: "first_p".to_string(),
                value: first_p,
            });
        }
        let num_spread = self.layout.len();
        let expected = num_spread + t_stages.len().saturating_sub(1);
        if t_stages.is_empty() || theta.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "got {} parameters, expected {expected}",
                theta.len()
            )));
        }
        mode.require_hmm()?;
        if !all_in_unit_interval(theta) {
            return Ok(f64::NEG_INFINITY);
        }
        let (spread, binomial) = theta.split_at(num_spread);
        let priors = binomial_stage_priors(t_stages, first_p, binomial, t_max)?;
        self.marg_likelihood(spread, t_stages, &priors, mode)
    }

    /// Probability of the per-side `involvement` given per-side `diagnoses`.
    ///
    /// New spread probabilities are assigned first when given.
    pub fn risk(
        &mut self,
        spread_probs: Option<&[f64]>,
        involvement: &BySide<Vec<Option<bool>>>,
        diagnoses: &BySide<Diagnoses>,
        time_prior: &[f64],
        mode: InferenceMode,
    ) -> Result<f64> {
        mode.require_hmm()?;
        if let Some(theta) = spread_probs {
            self.set_spread_probs(theta)?;
        }
        check_prior(time_prior)?;
        let l = self.graph().lnl_count();

        let mut evolved = Vec::with_capacity(2);
        let mut evidence = Vec::with_capacity(2);
        let mut wanted = Vec::with_capacity(2);
        for side in Side::BOTH {
            let model = &self.sides[side];
            check_width(&involvement[side], l, &format!("{side} involvement"))?;
            let p_d = model.observation_matrix()? * model.diagnosis_selector(&diagnoses[side])?;
            wanted.push(selector(&involvement[side]).component_mul(&p_d));
            evidence.push(p_d);
            evolved.push(model.evolve(time_prior.len() - 1)?);
        }

        let prior = DMatrix::from_diagonal(&DVector::from_column_slice(time_prior));
        let joint = evolved[0].transpose() * prior * &evolved[1];

        let denominator = evidence[0].dot(&(&joint * &evidence[1]));
        if denominator <= 0.0 {
            return Err(Error::ZeroEvidence);
        }
        let numerator = wanted[0].dot(&(&joint * &wanted[1]));
        Ok(numerator / denominator)
    }
}

impl fmt::Display for Bilateral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### IPSILATERAL ###")?;
        write!(f, "{}", self.sides.ipsi)?;
        writeln!(f, "### CONTRALATERAL ###")?;
        write!(f, "{}", self.sides.contra)
    }
}
