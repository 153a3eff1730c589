use super::*;
use crate::error::HostError;
use proptest::prelude::*;

/// Dose hotspot is a quadratic bowl around `target` weights.
struct Bowl {
    weights: Vec<f64>,
    target: Vec<f64>,
    dose: Option<f64>,
    valid: bool,
    allow_calc: bool,
    calcs: usize,
    snapshots: Vec<Vec<f64>>,
}

impl Bowl {
    fn new(weights: Vec<f64>, target: Vec<f64>) -> Self {
        let mut bowl = Self {
            weights,
            target,
            dose: None,
            valid: false,
            allow_calc: true,
            calcs: 0,
            snapshots: Vec::new(),
        };
        bowl.dose = Some(bowl.bowl());
        bowl.valid = true;
        bowl
    }

    fn bowl(&self) -> f64 {
        self.weights
            .iter()
            .zip(&self.target)
            .map(|(w, t)| (w - t).powi(2))
            .sum()
    }
}

impl DoseHost for Bowl {
    fn treatment_weights(&self) -> Vec<f64> {
        self.weights.clone()
    }

    fn set_treatment_weight(&mut self, index: usize, weight: f64) -> Result<(), HostError> {
        let count = self.weights.len();
        let slot = self
            .weights
            .get_mut(index)
            .ok_or(HostError::FieldIndex { index, count })?;
        *slot = weight;
        self.valid = false;
        Ok(())
    }

    fn dose_is_valid(&self) -> bool {
        self.valid
    }

    fn calculate_dose(&mut self) -> Result<(), HostError> {
        if !self.allow_calc {
            return Err(HostError::DoseCalculation("locked".into()));
        }
        self.calcs += 1;
        self.snapshots.push(self.weights.clone());
        self.dose = Some(self.bowl());
        self.valid = true;
        Ok(())
    }

    fn max_dose(&self) -> Option<f64> {
        self.dose
    }
}

fn tight() -> SimplexCfg {
    SimplexCfg {
        max_iterations: 300,
        dose_tol: 1e-6,
        ..SimplexCfg::default()
    }
}

#[test]
fn single_field_is_skipped() {
    let mut host = Bowl::new(vec![1.0], vec![0.5]);
    let report = optimize(&mut host, &SimplexCfg::default()).unwrap();
    assert!(report.skipped);
    assert_eq!(report.evaluations, 0);
    assert_eq!(report.weights, vec![1.0]);
    assert_eq!(host.calcs, 0);
    assert_eq!(host.weights, vec![1.0]);
}

#[test]
fn converges_on_bowl() {
    let cases: [&[f64]; 3] = [&[0.7, 0.3], &[0.5, 0.3, 0.2], &[0.4, 0.3, 0.2, 0.1]];
    for target in cases {
        let n = target.len();
        let mut host = Bowl::new(vec![1.0 / n as f64; n], target.to_vec());
        let report = optimize(&mut host, &tight()).unwrap();
        assert!(!report.skipped);
        assert!(report.score <= 1e-3, "n={n} score={}", report.score);
        let sum: f64 = report.weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(host.weights, report.weights);
        assert!(host.valid);
    }
}

#[test]
fn applied_weights_keep_sum_and_bounds() {
    let mut host = Bowl::new(vec![0.5, 0.5, 0.5], vec![1.0, 0.4, 0.1]);
    let bounds = WeightBounds::default();
    optimize(&mut host, &tight()).unwrap();
    assert!(!host.snapshots.is_empty());
    for w in &host.snapshots {
        let sum: f64 = w.iter().sum();
        assert!((sum - 1.5).abs() < 1e-9, "sum {sum}");
        assert!(w.iter().all(|&x| bounds.contains(x, 1e-9)), "{w:?}");
    }
}

#[test]
fn best_score_never_increases() {
    let mut host = Bowl::new(vec![0.25; 4], vec![0.6, 0.2, 0.1, 0.1]);
    let report = optimize(&mut host, &SimplexCfg::default()).unwrap();
    assert!(!report.history.is_empty());
    for pair in report.history.windows(2) {
        assert!(pair[1] <= pair[0]);
    }
    assert!(report.iterations <= 20);
}

#[test]
fn evaluations_match_recomputes() {
    let mut host = Bowl::new(vec![0.5, 0.5], vec![0.8, 0.2]);
    let report = optimize(&mut host, &SimplexCfg::default()).unwrap();
    // One recompute per evaluation plus the final one.
    assert_eq!(host.calcs, report.evaluations + 1);
    assert_eq!(report.stale_evaluations, 0);
}

#[test]
fn stale_dose_keeps_initial_weights() {
    let w0 = vec![0.4, 0.35, 0.25];
    let mut host = Bowl::new(w0.clone(), vec![0.1, 0.1, 0.8]);
    host.allow_calc = false;
    let report = optimize(&mut host, &SimplexCfg::default()).unwrap();
    // Every score is the same stale dose, so the first spread check stops the search.
    assert!(report.converged);
    assert_eq!(report.iterations, 0);
    assert_eq!(report.evaluations, 4);
    assert_eq!(report.stale_evaluations, 4);
    assert_eq!(report.weights, w0);
    assert_eq!(host.weights, w0);
    assert_eq!(host.calcs, 0);
}

#[test]
fn out_of_bounds_start_is_projected_before_scoring() {
    // Optimum sits above max; the best feasible point is (max, sum - max).
    let mut host = Bowl::new(vec![1.5, 0.5], vec![1.5, 0.5]);
    let bounds = WeightBounds::default();
    let report = optimize(&mut host, &SimplexCfg::default()).unwrap();
    assert_eq!(host.weights, report.weights);
    let sum: f64 = report.weights.iter().sum();
    assert!((sum - 2.0).abs() < 1e-9, "sum {sum}");
    assert!(report.weights.iter().all(|&w| bounds.contains(w, 0.0)), "{:?}", report.weights);
    // Every scored candidate, including the first, met both constraints.
    for w in &host.snapshots {
        let s: f64 = w.iter().sum();
        assert!((s - 2.0).abs() < 1e-9, "sum {s}");
        assert!(w.iter().all(|&x| bounds.contains(x, 0.0)), "{w:?}");
    }
    assert!((host.max_dose().unwrap() - report.score).abs() < 1e-12);
}

#[test]
fn apply_rejects_wrong_count() {
    let mut host = Bowl::new(vec![0.5, 0.5], vec![0.5, 0.5]);
    let err = apply_weights(&mut host, &[1.0], WeightBounds::default()).unwrap_err();
    assert_eq!(err, PlanError::WeightCountMismatch { expected: 2, got: 1 });
}

#[test]
fn apply_clamps_to_bounds() {
    let mut host = Bowl::new(vec![0.5, 0.5], vec![0.5, 0.5]);
    apply_weights(&mut host, &[-1.0, 3.0], WeightBounds::default()).unwrap();
    assert_eq!(host.weights, vec![0.02, 1.02]);
}

#[test]
fn equalize_spreads_total() {
    let mut host = Bowl::new(vec![0.9, 0.05, 0.05, 0.2], vec![0.0; 4]);
    equalize(&mut host, 2.0).unwrap();
    assert_eq!(host.weights, vec![0.5; 4]);
    assert!(recompute_if_possible(&mut host));
    assert_eq!(host.calcs, 1);
}

#[test]
fn projection_recovers_from_opposite_bounds() {
    // One component far above max, the rest far below min.
    let mut w = vec![5.0, -1.0, -1.0];
    let bounds = WeightBounds::default();
    project(&mut w, 1.5, bounds);
    let sum: f64 = w.iter().sum();
    assert!((sum - 1.5).abs() < 1e-9);
    assert!(w.iter().all(|&x| bounds.contains(x, 1e-9)), "{w:?}");
}

#[test]
fn renormalize_collapsed_sum_is_uniform() {
    let mut w = vec![0.0, 0.0, 0.0, 0.0];
    renormalize(&mut w, 2.0);
    assert_eq!(w, vec![0.5; 4]);
    let mut empty: Vec<f64> = Vec::new();
    renormalize(&mut empty, 1.0);
    assert!(empty.is_empty());
}

proptest! {
    #[test]
    fn projection_satisfies_sum_and_bounds(
        (w, sum) in (2usize..6).prop_flat_map(|n| (
            prop::collection::vec(-1.0f64..3.0, n),
            (n as f64 * 0.1)..(n as f64 * 0.9),
        ))
    ) {
        let bounds = WeightBounds::default();
        let mut w = w;
        project(&mut w, sum, bounds);
        let got: f64 = w.iter().sum();
        prop_assert!((got - sum).abs() < 1e-9, "sum {} vs {}", got, sum);
        prop_assert!(w.iter().all(|&x| bounds.contains(x, 1e-9)), "{:?}", w);
    }
}
