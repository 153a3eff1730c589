//! Millimetre and fixed-point polygon sets.
//!
//! - `PolygonSet`: closed polylines in millimetres, as returned by outline
//!   extraction. Contours may be holes or disjoint islands; order is irrelevant.
//! - `IntPolygonSet`: the same contours on an exact integer grid of
//!   `SCALE` subunits per millimetre. Boolean operations only ever see this form.

use nalgebra::Vector2;

use super::cfg::SCALE;

/// Closed polyline in millimetres (first vertex is not repeated).
pub type Polygon = Vec<Vector2<f64>>;

/// Ordered collection of closed polylines in millimetres.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolygonSet {
    pub contours: Vec<Polygon>,
}

impl PolygonSet {
    pub fn new(contours: Vec<Polygon>) -> Self {
        Self { contours }
    }

    /// Single contour from `(x, y)` pairs.
    pub fn from_xy(points: &[(f64, f64)]) -> Self {
        Self {
            contours: vec![points.iter().map(|&(x, y)| Vector2::new(x, y)).collect()],
        }
    }

    /// Axis-aligned rectangle spanned by two opposite corners (any order).
    pub fn rect(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let (x_lo, x_hi) = (x1.min(x2), x1.max(x2));
        let (y_lo, y_hi) = (y1.min(y2), y1.max(y2));
        Self::from_xy(&[(x_lo, y_lo), (x_hi, y_lo), (x_hi, y_hi), (x_lo, y_hi)])
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn push(&mut self, contour: Polygon) {
        self.contours.push(contour);
    }

    /// Rotate every vertex about the origin by `deg` degrees (counterclockwise).
    pub fn rotated(&self, deg: f64) -> Self {
        let (s, c) = deg.to_radians().sin_cos();
        Self {
            contours: self
                .contours
                .iter()
                .map(|poly| {
                    poly.iter()
                        .map(|p| Vector2::new(c * p.x - s * p.y, s * p.x + c * p.y))
                        .collect()
                })
                .collect(),
        }
    }
}

/// Fixed-point polygon set on the `SCALE` grid.
///
/// Invariant: every contour has at least 3 vertices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntPolygonSet {
    pub contours: Vec<Vec<[i64; 2]>>,
}

impl IntPolygonSet {
    /// Scale to subunits and round each coordinate; contours with fewer than
    /// 3 vertices are dropped. An absent set converts to the empty set.
    pub fn from_mm(set: Option<&PolygonSet>) -> Self {
        let Some(set) = set else {
            return Self::default();
        };
        let contours = set
            .contours
            .iter()
            .filter(|poly| poly.len() >= 3)
            .map(|poly| {
                poly.iter()
                    .map(|p| [(p.x * SCALE).round() as i64, (p.y * SCALE).round() as i64])
                    .collect()
            })
            .collect();
        Self { contours }
    }

    /// Build from raw subunit contours, dropping degenerate ones.
    pub(crate) fn from_subunits<I>(contours: I) -> Self
    where
        I: IntoIterator<Item = Vec<[f64; 2]>>,
    {
        let contours = contours
            .into_iter()
            .filter(|c| c.len() >= 3)
            .map(|c| {
                c.into_iter()
                    .map(|[x, y]| [x.round() as i64, y.round() as i64])
                    .collect()
            })
            .collect();
        Self { contours }
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.contours.iter().map(Vec::len).sum()
    }

    /// Back to millimetres (divide by `SCALE`).
    pub fn to_mm(&self) -> PolygonSet {
        PolygonSet {
            contours: self
                .contours
                .iter()
                .map(|c| {
                    c.iter()
                        .map(|&[x, y]| Vector2::new(x as f64 / SCALE, y as f64 / SCALE))
                        .collect()
                })
                .collect(),
        }
    }

    /// Every vertex of every contour, in millimetres.
    pub fn points_mm(&self) -> Vec<Vector2<f64>> {
        self.contours
            .iter()
            .flatten()
            .map(|&[x, y]| Vector2::new(x as f64 / SCALE, y as f64 / SCALE))
            .collect()
    }

    /// Contours as float subunit coordinates for the overlay engine.
    pub(crate) fn as_subunit_contours(&self) -> Vec<Vec<[f64; 2]>> {
        self.contours
            .iter()
            .map(|c| c.iter().map(|&[x, y]| [x as f64, y as f64]).collect())
            .collect()
    }
}

impl From<&PolygonSet> for IntPolygonSet {
    fn from(set: &PolygonSet) -> Self {
        Self::from_mm(Some(set))
    }
}
