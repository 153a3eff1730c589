//! Box bounds plus fixed-sum constraint on a weight vector.

/// Sums at or below this are treated as collapsed.
pub(crate) const SUM_EPS: f64 = 1e-12;
/// Bound violation left over from rescaling that is accepted as drift.
const DRIFT_EPS: f64 = 1e-12;

/// Per-component weight bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self {
            min: 0.02,
            max: 1.02,
        }
    }
}

impl WeightBounds {
    #[inline]
    pub fn clamp(&self, w: f64) -> f64 {
        self.min.max(self.max.min(w))
    }

    #[inline]
    pub fn contains(&self, w: f64, eps: f64) -> bool {
        w >= self.min - eps && w <= self.max + eps
    }
}

/// Rescale `w` so it sums to `sum_target`; a collapsed vector becomes uniform.
pub fn renormalize(w: &mut [f64], sum_target: f64) {
    if w.is_empty() {
        return;
    }
    let s: f64 = w.iter().sum();
    if s <= SUM_EPS {
        w.fill(sum_target / w.len() as f64);
        return;
    }
    let k = sum_target / s;
    w.iter_mut().for_each(|x| *x *= k);
}

/// Clamp to `bounds` and rescale to `sum_target`, twice.
///
/// The second pass absorbs components pushed back out of bounds by the first
/// rescale. If a bound is still violated (a large rescale against a component
/// sitting on the opposite bound), the clamp/rescale fixed point is solved
/// directly: find `k` with `Σ clamp(k·vᵢ) = sum_target`.
pub fn project(w: &mut [f64], sum_target: f64, bounds: WeightBounds) {
    for _ in 0..2 {
        w.iter_mut().for_each(|x| *x = bounds.clamp(*x));
        renormalize(w, sum_target);
    }
    if w.iter().all(|&x| bounds.contains(x, DRIFT_EPS)) {
        return;
    }
    settle(w, sum_target, bounds);
}

fn settle(w: &mut [f64], sum_target: f64, bounds: WeightBounds) {
    let v: Vec<f64> = w.iter().map(|&x| bounds.clamp(x)).collect();
    let total = |k: f64| v.iter().map(|&x| bounds.clamp(k * x)).sum::<f64>();

    let (mut lo, mut hi) = (0.0, 1.0);
    while total(hi) < sum_target && hi < 1e12 {
        lo = hi;
        hi *= 2.0;
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if total(mid) < sum_target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    for (dst, &x) in w.iter_mut().zip(&v) {
        *dst = bounds.clamp(hi * x);
    }
}
