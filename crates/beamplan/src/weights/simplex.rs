//! Nelder–Mead simplex state: vertices paired with their scores.

use nalgebra::DVector;

/// Weight vector with its objective score (lower is better).
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub weights: DVector<f64>,
    pub score: f64,
}

/// `n + 1` vertices; after `sort`, index 0 is best and index `n` is worst.
#[derive(Clone, Debug, Default)]
pub(crate) struct Simplex {
    pub vertices: Vec<Vertex>,
}

impl Simplex {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(cap),
        }
    }

    pub fn push(&mut self, v: Vertex) {
        self.vertices.push(v);
    }

    /// Stable ascending sort by score.
    pub fn sort(&mut self) {
        self.vertices.sort_by(|a, b| a.score.total_cmp(&b.score));
    }

    pub fn best(&self) -> &Vertex {
        &self.vertices[0]
    }

    pub fn worst(&self) -> &Vertex {
        &self.vertices[self.vertices.len() - 1]
    }

    pub fn second_worst(&self) -> &Vertex {
        &self.vertices[self.vertices.len() - 2]
    }

    /// Score spread between worst and best; equal scores (also two infinities) give 0.
    pub fn spread(&self) -> f64 {
        let (lo, hi) = (self.best().score, self.worst().score);
        if lo == hi {
            0.0
        } else {
            hi - lo
        }
    }

    /// Centroid of every vertex except the worst.
    pub fn centroid(&self) -> DVector<f64> {
        let m = self.vertices.len() - 1;
        let dim = self.vertices[0].weights.len();
        let sum = self.vertices[..m]
            .iter()
            .fold(DVector::zeros(dim), |acc, v| acc + &v.weights);
        sum / m as f64
    }

    pub fn replace_worst(&mut self, v: Vertex) {
        let last = self.vertices.len() - 1;
        self.vertices[last] = v;
    }
}

/// `ca·a + cb·b`.
#[inline]
pub(crate) fn combine(a: &DVector<f64>, b: &DVector<f64>, ca: f64, cb: f64) -> DVector<f64> {
    a * ca + b * cb
}

/// `a + t·(b − a)`.
#[inline]
pub(crate) fn lerp(a: &DVector<f64>, b: &DVector<f64>, t: f64) -> DVector<f64> {
    a + (b - a) * t
}
