//! Second-moment orientation of a polygon set.

use nalgebra::{Matrix2, Vector2};

use super::cfg::EIGEN_EPS;
use super::types::IntPolygonSet;
use crate::angle::normalize_180;

/// Orientation of the dominant axis of spread of the set's vertices, in [0, 180).
///
/// Uses the vertex covariance (Sxx, Sxy, Syy) about the vertex centroid and
/// the closed-form larger eigenvalue. When |Sxy| is negligible the eigenvector
/// is picked axis-aligned (x on ties), so a square yields 0°; that choice is
/// not unique. An empty set yields 0°.
pub fn principal_angle(set: &IntPolygonSet) -> f64 {
    let pts = set.points_mm();
    if pts.is_empty() {
        return 0.0;
    }
    let mean = pts.iter().fold(Vector2::<f64>::zeros(), |acc, p| acc + p) / pts.len() as f64;
    let cov: Matrix2<f64> = pts.iter().fold(Matrix2::zeros(), |acc, p| {
        let d = p - mean;
        acc + d * d.transpose()
    });
    let (sxx, sxy, syy) = (cov[(0, 0)], cov[(0, 1)], cov[(1, 1)]);
    let tr = cov.trace();
    let det = cov.determinant();
    let l_max = 0.5 * (tr + (tr * tr - 4.0 * det).max(0.0).sqrt());

    let v = if sxy.abs() > EIGEN_EPS {
        Vector2::new(1.0, (l_max - sxx) / sxy)
    } else if sxx >= syy {
        Vector2::new(1.0, 0.0)
    } else {
        Vector2::new(0.0, 1.0)
    };
    let v = v.normalize();
    normalize_180(v.y.atan2(v.x).to_degrees())
}
