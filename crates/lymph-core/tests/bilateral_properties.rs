//! Property and end-to-end tests of the bilateral model.

use std::collections::HashMap;

use lymph_config::GraphEntry;
use lymph_core::{
    binomial_stage_priors, Bilateral, BilateralColumn, BilateralTable, BySide, CellValue, Diagnoses,
    Error, Graph, InferenceMode, ModalityTable, Side, TimePriors,
};
use lymph_math::binomial_time_prior;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

const HMM: InferenceMode = InferenceMode::HiddenMarkovModel;
const SYMMETRIES: [(bool, bool); 4] = [(true, true), (true, false), (false, true), (false, false)];

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn graph() -> Graph {
    Graph::from_entries(&[
        GraphEntry::new("tumor", "primary", &["one", "two"]),
        GraphEntry::new("lnl", "one", &["two", "three"]),
        GraphEntry::new("lnl", "two", &["three"]),
        GraphEntry::new("lnl", "three", &[]),
    ])
    .unwrap()
}

fn modalities() -> ModalityTable {
    ModalityTable::new().with("test-o-meter", 0.99, 0.88).unwrap()
}

fn stages() -> Vec<String> {
    vec!["early".to_string(), "late".to_string()]
}

type Diag = [Option<bool>; 3];

/// Five early and three late patients; includes a duplicate pair and a
/// fully unknown contralateral side.
fn table() -> BilateralTable {
    let mut columns = vec![BilateralColumn::t_stage()];
    for side in ["ipsi", "contra"] {
        for lnl in ["one", "two", "three"] {
            columns.push(BilateralColumn::new("test-o-meter", side, lnl));
        }
    }
    let mut table = BilateralTable::new(columns);

    let rows: [(&str, Diag, Diag); 9] = [
        ("early", [Some(true), Some(false), Some(false)], [Some(false), Some(false), Some(false)]),
        ("early", [Some(true), Some(false), None], [None, None, None]),
        ("early", [Some(false), Some(false), Some(false)], [Some(false), None, Some(false)]),
        ("early", [Some(true), Some(true), Some(false)], [Some(false), Some(false), Some(false)]),
        ("early", [Some(true), Some(true), Some(false)], [Some(false), Some(false), Some(false)]),
        ("late", [Some(true), Some(true), Some(true)], [Some(true), Some(false), Some(false)]),
        ("late", [None, None, None], [None, None, None]),
        ("late", [Some(true), Some(true), None], [Some(true), Some(true), Some(false)]),
        ("T0", [Some(false), Some(false), Some(false)], [Some(false), Some(false), Some(false)]),
    ];
    for (stage, ipsi, contra) in rows {
        let mut row = vec![CellValue::from(stage)];
        row.extend(ipsi.into_iter().chain(contra).map(CellValue::from));
        table.push_row(row).unwrap();
    }
    table
}

fn loaded(base_symmetric: bool, trans_symmetric: bool) -> Bilateral {
    let mut model = Bilateral::new(graph(), base_symmetric, trans_symmetric);
    model.load_data(&table(), &stages(), &modalities(), HMM).unwrap();
    model
}

fn time_priors() -> TimePriors {
    binomial_stage_priors(&stages(), 0.3, &[0.7], 10).unwrap()
}

fn random_theta(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| rng.random::<f64>()).collect()
}

fn diagnoses(diag: &[Option<bool>]) -> Diagnoses {
    HashMap::from([("test-o-meter".to_string(), diag.to_vec())])
}

proptest! {
    #[test]
    fn transition_powers_stay_row_stochastic(
        theta in prop::collection::vec(0.0f64..=1.0, 10),
        sym in 0usize..4,
    ) {
        let (base_symmetric, trans_symmetric) = SYMMETRIES[sym];
        let mut model = Bilateral::new(graph(), base_symmetric, trans_symmetric);
        let len = model.layout().len();
        model.set_spread_probs(&theta[..len]).unwrap();

        for side in Side::BOTH {
            let a = model.side(side).transition_matrix().unwrap();
            let mut power = nalgebra::DMatrix::<f64>::identity(8, 8);
            for _ in 0..=10 {
                for i in 0..8 {
                    prop_assert!(approx_eq(power.row(i).sum(), 1.0, 1e-9));
                }
                power = &power * a;
            }
        }
    }

    #[test]
    fn likelihood_is_nonpositive_in_bounds(
        theta in prop::collection::vec(0.0f64..=1.0, 10),
        sym in 0usize..4,
    ) {
        let (base_symmetric, trans_symmetric) = SYMMETRIES[sym];
        let mut model = loaded(base_symmetric, trans_symmetric);
        let len = model.layout().len();
        let llh = model.marg_likelihood(&theta[..len], &stages(), &time_priors(), HMM).unwrap();
        prop_assert!(llh <= 0.0);
        prop_assert!(!llh.is_nan());
    }
}

#[test]
fn spread_probs_roundtrip_for_every_symmetry() {
    let mut rng = StdRng::seed_from_u64(17);
    let expected_len = [5, 8, 7, 10];
    for ((base_symmetric, trans_symmetric), len) in SYMMETRIES.into_iter().zip(expected_len) {
        let mut model = Bilateral::new(graph(), base_symmetric, trans_symmetric);
        assert_eq!(model.layout().len(), len);

        let theta = random_theta(&mut rng, len);
        model.set_spread_probs(&theta).unwrap();
        assert_eq!(model.spread_probs().unwrap(), theta);

        let same = model.ipsi().transition_matrix().unwrap() == model.contra().transition_matrix().unwrap();
        assert_eq!(same, base_symmetric && trans_symmetric);

        assert!(matches!(
            model.set_spread_probs(&random_theta(&mut rng, len + 1)),
            Err(Error::InvalidArgument(_))
        ));
    }
}

#[test]
fn observation_matrices_match_on_both_sides() {
    let mut model = Bilateral::new(graph(), false, true);
    model.set_modalities(modalities()).unwrap();
    let ipsi = model.ipsi().observation_matrix().unwrap();
    assert_eq!(ipsi, model.contra().observation_matrix().unwrap());
    for i in 0..8 {
        assert!(approx_eq(ipsi.row(i).sum(), 1.0, 1e-12));
    }
}

#[test]
fn loading_keeps_one_column_per_patient() {
    let model = loaded(false, true);
    for (side, model) in [(Side::Ipsi, model.ipsi()), (Side::Contra, model.contra())] {
        let early = model.marginalization_matrix("early").unwrap();
        let late = model.marginalization_matrix("late").unwrap();
        assert_eq!(early.shape(), (8, 5), "{side}");
        assert_eq!(late.shape(), (8, 3), "{side}");
        assert_eq!(model.patient_counts("early").unwrap().len(), 5);
        assert_eq!(model.patient_counts("late").unwrap().len(), 3);
        assert!(model.marginalization_matrix("T0").is_err());
    }
    // the unknown contralateral side matches every observation
    let contra = model.contra().marginalization_matrix("early").unwrap();
    assert!(contra.column(1).iter().all(|&v| v == 1.0));
}

#[test]
fn likelihood_edges() {
    let mut rng = StdRng::seed_from_u64(23);
    for (base_symmetric, trans_symmetric) in SYMMETRIES {
        let mut model = loaded(base_symmetric, trans_symmetric);
        let len = model.layout().len();

        let theta = random_theta(&mut rng, len);
        let llh = model.marg_likelihood(&theta, &stages(), &time_priors(), HMM).unwrap();
        assert!(llh.is_finite() && llh < 0.0, "{llh}");

        let outside: Vec<f64> = theta.iter().map(|t| t + 1.0).collect();
        let llh = model.marg_likelihood(&outside, &stages(), &time_priors(), HMM).unwrap();
        assert_eq!(llh, f64::NEG_INFINITY);

        assert!(matches!(
            model.marg_likelihood(&theta[1..], &stages(), &time_priors(), HMM),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            model.marg_likelihood(&theta, &stages(), &time_priors(), InferenceMode::BayesianNetwork),
            Err(Error::Unimplemented(InferenceMode::BayesianNetwork))
        ));
    }
}

#[test]
fn shorter_priors_are_padded() {
    let mut model = loaded(false, true);
    let theta = [0.3, 0.2, 0.1, 0.15, 0.2, 0.1, 0.05];
    let mut priors = TimePriors::new();
    priors.insert("early".to_string(), binomial_time_prior(5, 0.3));
    priors.insert("late".to_string(), binomial_time_prior(10, 0.7));
    let llh = model.marg_likelihood(&theta, &stages(), &priors, HMM).unwrap();
    assert!(llh.is_finite() && llh < 0.0);

    // appending zero-probability time steps changes nothing
    let mut padded = priors.clone();
    padded.get_mut("early").unwrap().extend([0.0; 5]);
    let llh_padded = model.marg_likelihood(&theta, &stages(), &padded, HMM).unwrap();
    assert!(approx_eq(llh, llh_padded, 1e-10));
}

#[test]
fn combined_likelihood_edges() {
    let mut rng = StdRng::seed_from_u64(29);
    for (base_symmetric, trans_symmetric) in SYMMETRIES {
        let mut model = loaded(base_symmetric, trans_symmetric);
        let len = model.layout().len() + 1;

        let theta = random_theta(&mut rng, len);
        let llh = model.combined_likelihood(&theta, &stages(), 10, 0.3, HMM).unwrap();
        assert!(llh.is_finite() && llh < 0.0);

        let outside: Vec<f64> = theta.iter().map(|t| t + 1.0).collect();
        assert_eq!(
            model.combined_likelihood(&outside, &stages(), 10, 0.3, HMM).unwrap(),
            f64::NEG_INFINITY
        );
    }
}

#[test]
fn combined_likelihood_matches_explicit_priors() {
    let mut model = loaded(false, true);
    let spread = [0.3, 0.2, 0.1, 0.15, 0.2, 0.1, 0.05];
    let mut theta = spread.to_vec();
    theta.push(0.7);

    let combined = model.combined_likelihood(&theta, &stages(), 10, 0.3, HMM).unwrap();
    let explicit = model.marg_likelihood(&spread, &stages(), &time_priors(), HMM).unwrap();
    assert!(approx_eq(combined, explicit, 1e-12));
}

/// Involvement and diagnosis masks for ipsi and contra.
type RiskCase = (Diag, Diag, Diag, Diag);

const RISK_CASES: [RiskCase; 4] = [
    (
        [Some(true), Some(false), None],
        [None, None, None],
        [Some(false), None, None],
        [None, None, None],
    ),
    (
        [Some(false), Some(false), Some(false)],
        [None, Some(true), Some(true)],
        [Some(true), None, None],
        [Some(false), Some(true), None],
    ),
    (
        [None, Some(true), Some(false)],
        [Some(true), Some(true), Some(true)],
        [Some(true), Some(false), Some(false)],
        [None, Some(true), None],
    ),
    (
        [Some(false), Some(false), None],
        [None, Some(false), Some(false)],
        [Some(false), Some(false), Some(false)],
        [None, Some(false), None],
    ),
];

#[test]
fn risk_is_a_probability_and_consistent_with_single_sides() {
    let mut rng = StdRng::seed_from_u64(31);
    let time_prior = vec![0.2; 5];
    let unknown = [None, None, None];

    for (inv_ipsi, inv_contra, diag_ipsi, diag_contra) in RISK_CASES {
        let mut model = loaded(false, true);
        let theta = random_theta(&mut rng, model.layout().len());

        let risk = model
            .risk(
                Some(theta.as_slice()),
                &BySide::new(inv_ipsi.to_vec(), inv_contra.to_vec()),
                &BySide::new(diagnoses(&diag_ipsi), diagnoses(&diag_contra)),
                &time_prior,
                HMM,
            )
            .unwrap();
        assert!((0.0..=1.0 + 1e-12).contains(&risk), "{risk}");

        let ignore_contra = model
            .risk(
                None,
                &BySide::new(inv_ipsi.to_vec(), unknown.to_vec()),
                &BySide::new(diagnoses(&diag_ipsi), diagnoses(&unknown)),
                &time_prior,
                HMM,
            )
            .unwrap();
        let ignore_ipsi = model
            .risk(
                None,
                &BySide::new(unknown.to_vec(), inv_contra.to_vec()),
                // an omitted modality counts as not assessed
                &BySide::new(Diagnoses::new(), diagnoses(&diag_contra)),
                &time_prior,
                HMM,
            )
            .unwrap();

        let ipsi = model.ipsi().risk(&inv_ipsi, &diagnoses(&diag_ipsi), &time_prior, HMM).unwrap();
        let contra = model
            .contra()
            .risk(&inv_contra, &diagnoses(&diag_contra), &time_prior, HMM)
            .unwrap();
        assert!(approx_eq(ignore_contra, ipsi, 1e-10), "{ignore_contra} vs {ipsi}");
        assert!(approx_eq(ignore_ipsi, contra, 1e-10), "{ignore_ipsi} vs {contra}");
    }
}

#[test]
fn positive_contralateral_findings_raise_ipsilateral_risk() {
    let mut rng = StdRng::seed_from_u64(37);
    let time_prior = vec![0.2; 5];
    let involvement = BySide::new(vec![Some(true); 3], vec![None; 3]);

    for _ in 0..10 {
        let mut model = loaded(false, true);
        let theta = random_theta(&mut rng, model.layout().len());
        model.set_spread_probs(&theta).unwrap();

        let mut risk_given = |contra: bool| {
            model
                .risk(
                    None,
                    &involvement,
                    &BySide::new(diagnoses(&[None; 3]), diagnoses(&[Some(contra); 3])),
                    &time_prior,
                    HMM,
                )
                .unwrap()
        };
        let positive = risk_given(true);
        let negative = risk_given(false);
        assert!(positive >= negative - 1e-12, "{positive} < {negative}");
    }
}

#[test]
fn impossible_diagnosis_is_reported() {
    let mut model = Bilateral::new(graph(), false, true);
    model
        .set_modalities(ModalityTable::new().with("path", 1.0, 1.0).unwrap())
        .unwrap();
    // nothing can spread, but pathology claims involvement
    model.set_spread_probs(&[0.0; 7]).unwrap();
    let mut positive = Diagnoses::new();
    positive.insert("path".to_string(), vec![Some(true), None, None]);
    let result = model.risk(
        None,
        &BySide::new(vec![None; 3], vec![None; 3]),
        &BySide::new(positive, Diagnoses::new()),
        &[0.5, 0.5],
        HMM,
    );
    assert!(matches!(result, Err(Error::ZeroEvidence)));
}

#[test]
fn changing_modalities_drops_patient_data() {
    let mut model = loaded(false, true);
    model.set_modalities(modalities()).unwrap();
    assert!(model.patient_data().is_some());
    assert_eq!(model.t_stages(), vec!["early", "late"]);

    let other = ModalityTable::new().with("CT", 0.76, 0.81).unwrap();
    model.set_modalities(other).unwrap();
    assert!(model.patient_data().is_none());
    assert!(model.t_stages().is_empty());

    // the saved bundle carries no stale table
    let restored = Bilateral::from_bundle_bytes(model.to_bundle_bytes().unwrap()).unwrap();
    assert!(restored.patient_data().is_none());
}

#[test]
fn too_wide_observations_are_rejected_without_panicking() {
    let names: Vec<String> = (0..11).map(|i| format!("L{i}")).collect();
    let mut entries = vec![GraphEntry::new("tumor", "primary", &["L0"])];
    entries.extend(names.iter().map(|n| GraphEntry::new("lnl", n.as_str(), &[])));
    let mut model = Bilateral::new(Graph::from_entries(&entries).unwrap(), false, true);

    let two = ModalityTable::new()
        .with("CT", 0.76, 0.81)
        .unwrap()
        .with("MRI", 0.63, 0.81)
        .unwrap();
    assert!(matches!(
        model.set_modalities(two),
        Err(Error::InvalidArgument(_))
    ));
    assert!(model.modalities().unwrap().is_empty());
}

#[test]
fn bundle_roundtrip_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.zip");

    let mut model = loaded(true, false);
    let theta = [0.4, 0.3, 0.2, 0.1, 0.05, 0.15, 0.25, 0.35];
    model.set_spread_probs(&theta).unwrap();
    let manifest = model.to_bundle(&path).unwrap();
    assert_eq!(manifest.model_class, "Bilateral");

    let mut restored = Bilateral::from_bundle(&path).unwrap();
    assert_eq!(restored.spread_probs().unwrap(), theta.to_vec());
    assert_eq!(restored.layout(), model.layout());
    assert_eq!(restored.patient_data(), model.patient_data());
    // reloading picks up every stage present in the table
    assert_eq!(restored.t_stages(), vec!["early", "late", "T0"]);

    let llh = model.marg_likelihood(&theta, &stages(), &time_priors(), HMM).unwrap();
    let llh_restored = restored.marg_likelihood(&theta, &stages(), &time_priors(), HMM).unwrap();
    assert!(approx_eq(llh, llh_restored, 1e-12));
}
