//! Beam-weight optimization against a host-computed dose hotspot.
//!
//! Purpose
//! - Constrained Nelder–Mead over the weights of the treatment (non-setup)
//!   fields: every candidate is clamped to `WeightBounds` and rescaled to the
//!   initial weight sum before it is scored.
//! - The objective is the host's maximum dose after applying the candidate
//!   and recomputing. Each scoring mutates the host, so candidates are
//!   evaluated strictly one after another.
//!
//! Degraded mode
//! - If the host refuses to recompute, the (stale) maximum dose it still
//!   reports is used as the score and the search carries on.

mod project;
mod simplex;

use nalgebra::DVector;

use crate::error::PlanError;
use crate::host::DoseHost;

pub use project::{project, renormalize, WeightBounds};
pub use simplex::Vertex;
use simplex::{combine, lerp, Simplex};

/// Reflection, expansion, contraction and shrink coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NelderMeadCoeffs {
    pub alpha: f64,
    pub gamma: f64,
    pub rho: f64,
    pub sigma: f64,
}

impl Default for NelderMeadCoeffs {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
        }
    }
}

/// Optimizer configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimplexCfg {
    pub bounds: WeightBounds,
    pub max_iterations: usize,
    /// Stop once worst − best score is at most this (Gy).
    pub dose_tol: f64,
    /// Initial simplex step as a fraction of the weight sum.
    pub init_step_frac: f64,
    pub coeffs: NelderMeadCoeffs,
}

impl Default for SimplexCfg {
    fn default() -> Self {
        Self {
            bounds: WeightBounds::default(),
            max_iterations: 20,
            dose_tol: 0.01,
            init_step_frac: 0.07,
            coeffs: NelderMeadCoeffs::default(),
        }
    }
}

/// Outcome of `optimize`.
#[derive(Clone, Debug, PartialEq)]
pub struct SimplexReport {
    /// Weights applied to the plan at the end.
    pub weights: Vec<f64>,
    /// Score of `weights` as last evaluated.
    pub score: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
    /// Evaluations whose dose could not be recomputed.
    pub stale_evaluations: usize,
    /// Best score at the start of every iteration.
    pub history: Vec<f64>,
    /// Fewer than two treatment fields: nothing was optimized.
    pub skipped: bool,
}

/// Recompute dose if it is not valid. Returns false when the host refused.
pub fn recompute_if_possible<H: DoseHost>(host: &mut H) -> bool {
    if host.dose_is_valid() {
        return true;
    }
    match host.calculate_dose() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(%err, "dose not recomputed, using stale dose");
            false
        }
    }
}

/// Apply `weights` (clamped to `bounds`) to the treatment fields in order.
pub fn apply_weights<H: DoseHost>(
    host: &mut H,
    weights: &[f64],
    bounds: WeightBounds,
) -> Result<(), PlanError> {
    let expected = host.treatment_weights().len();
    if weights.len() != expected {
        return Err(PlanError::WeightCountMismatch {
            expected,
            got: weights.len(),
        });
    }
    for (i, &w) in weights.iter().enumerate() {
        host.set_treatment_weight(i, bounds.clamp(w))?;
    }
    Ok(())
}

/// Set every treatment field weight to `total / n`.
pub fn equalize<H: DoseHost>(host: &mut H, total: f64) -> Result<(), PlanError> {
    let n = host.treatment_weights().len();
    if n == 0 {
        return Ok(());
    }
    let w = total / n as f64;
    for i in 0..n {
        host.set_treatment_weight(i, w)?;
    }
    Ok(())
}

/// Scores candidates against the host.
struct Objective<'a, H> {
    host: &'a mut H,
    bounds: WeightBounds,
    sum: f64,
    evaluations: usize,
    stale: usize,
}

impl<H: DoseHost> Objective<'_, H> {
    fn score(&mut self, w: &DVector<f64>) -> Result<f64, PlanError> {
        apply_weights(self.host, w.as_slice(), self.bounds)?;
        if !recompute_if_possible(self.host) {
            self.stale += 1;
        }
        self.evaluations += 1;
        let score = self.host.max_dose().unwrap_or(f64::INFINITY);
        tracing::trace!(weights = ?w.as_slice(), score, "evaluated");
        Ok(score)
    }

    /// Project and score a raw candidate.
    fn candidate(&mut self, mut w: DVector<f64>) -> Result<Vertex, PlanError> {
        project(w.as_mut_slice(), self.sum, self.bounds);
        let score = self.score(&w)?;
        Ok(Vertex { weights: w, score })
    }
}

/// Minimize the host's maximum dose over the treatment field weights while
/// keeping their sum fixed. The best weights are applied and dose is
/// recomputed once more before returning.
pub fn optimize<H: DoseHost>(host: &mut H, cfg: &SimplexCfg) -> Result<SimplexReport, PlanError> {
    let w0 = DVector::from_vec(host.treatment_weights());
    let n = w0.len();
    if n <= 1 {
        tracing::info!(fields = n, "fewer than two treatment fields, weights unchanged");
        return Ok(SimplexReport {
            weights: w0.as_slice().to_vec(),
            score: host.max_dose().unwrap_or(f64::INFINITY),
            iterations: 0,
            evaluations: 0,
            converged: false,
            stale_evaluations: 0,
            history: Vec::new(),
            skipped: true,
        });
    }
    let sum0 = w0.sum();
    let c = cfg.coeffs;
    let mut obj = Objective {
        host,
        bounds: cfg.bounds,
        sum: sum0,
        evaluations: 0,
        stale: 0,
    };

    // Current weights start the simplex as they are unless a component is out
    // of bounds; then the scored vertex must be the projected one.
    let mut start = w0;
    if !start.iter().all(|&w| cfg.bounds.contains(w, 0.0)) {
        project(start.as_mut_slice(), sum0, cfg.bounds);
    }
    let mut simplex = Simplex::with_capacity(n + 1);
    let f0 = obj.score(&start)?;
    simplex.push(Vertex {
        weights: start.clone(),
        score: f0,
    });
    let step = (cfg.init_step_frac * sum0).max(1e-3);
    for k in 0..n {
        let mut wk = start.clone();
        wk[k] += step;
        simplex.push(obj.candidate(wk)?);
    }

    let mut iterations = 0;
    let mut converged = false;
    let mut history = Vec::with_capacity(cfg.max_iterations);
    while iterations < cfg.max_iterations {
        simplex.sort();
        history.push(simplex.best().score);
        if simplex.spread() <= cfg.dose_tol {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid = simplex.centroid();
        let worst = simplex.worst().weights.clone();
        let reflected = obj.candidate(combine(&centroid, &worst, 1.0 + c.alpha, -c.alpha))?;

        if reflected.score < simplex.best().score {
            let expanded = obj.candidate(combine(&centroid, &worst, 1.0 + c.gamma, -c.gamma))?;
            tracing::debug!(iteration = iterations, "expand");
            if expanded.score < reflected.score {
                simplex.replace_worst(expanded);
            } else {
                simplex.replace_worst(reflected);
            }
        } else if reflected.score < simplex.second_worst().score {
            tracing::debug!(iteration = iterations, "reflect");
            simplex.replace_worst(reflected);
        } else {
            let outside = reflected.score < simplex.worst().score;
            let raw = if outside {
                combine(&centroid, &worst, 1.0 + c.rho, -c.rho)
            } else {
                combine(&centroid, &worst, 1.0 - c.rho, c.rho)
            };
            let contracted = obj.candidate(raw)?;
            if contracted.score < simplex.worst().score.min(reflected.score) {
                tracing::debug!(iteration = iterations, outside, "contract");
                simplex.replace_worst(contracted);
            } else {
                tracing::debug!(iteration = iterations, "shrink");
                let best = simplex.best().weights.clone();
                for i in 1..=n {
                    let w = lerp(&best, &simplex.vertices[i].weights, c.sigma);
                    simplex.vertices[i] = obj.candidate(w)?;
                }
            }
        }
    }

    simplex.sort();
    let Objective {
        evaluations,
        stale,
        ..
    } = obj;
    let best = simplex.best().clone();
    let applied: Vec<f64> = best.weights.iter().map(|&w| cfg.bounds.clamp(w)).collect();
    apply_weights(host, &applied, cfg.bounds)?;
    recompute_if_possible(host);

    tracing::info!(
        score = best.score,
        iterations,
        evaluations,
        converged,
        stale_evaluations = stale,
        "beam weights optimized"
    );
    Ok(SimplexReport {
        weights: applied,
        score: best.score,
        iterations,
        evaluations,
        converged,
        stale_evaluations: stale,
        history,
        skipped: false,
    })
}

#[cfg(test)]
mod tests;
