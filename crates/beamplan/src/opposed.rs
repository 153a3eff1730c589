//! Opposed (lateral) tangent field derived from the medial one.
//!
//! Closed form, no search:
//! - collimator mirrored about 0°;
//! - jaws mirrored in X (`X1' = -X2`, `X2' = -X1`), Y unchanged;
//! - gantry rotated by `180 - 2δ`, where `δ = asin(|X2| / SAD)` is the
//!   divergence of the posterior jaw edge. The two posterior edges then lie
//!   on one plane instead of crossing at depth.

use crate::angle::normalize_360;
use crate::geometry::{BeamGeometry, RectAperture};

/// Source-to-axis distance in cm.
pub const SAD_CM: f64 = 100.0;

/// Divergence half-angle (degrees) of a jaw edge `edge_mm` from the central axis.
pub fn divergence_angle(edge_mm: f64) -> f64 {
    let half_aperture_cm = edge_mm.abs() / 10.0;
    let ratio = (half_aperture_cm / SAD_CM).clamp(0.0, 1.0);
    ratio.asin().to_degrees()
}

/// Mirror the X jaws about the central axis.
#[inline]
pub fn mirror_jaws(jaws: &RectAperture) -> RectAperture {
    RectAperture::new(-jaws.x2, jaws.y1, -jaws.x1, jaws.y2)
}

/// Geometry of the lateral field opposing `medial`.
///
/// `medial.jaws.x1` is the anterior edge, `x2` the posterior edge.
pub fn lateral_from_medial(medial: &BeamGeometry) -> BeamGeometry {
    let delta = divergence_angle(medial.jaws.x2);
    BeamGeometry {
        collimator_angle: normalize_360(-medial.collimator_angle),
        gantry_angle: normalize_360(medial.gantry_angle + 180.0 - 2.0 * delta),
        jaws: mirror_jaws(&medial.jaws),
        ..*medial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn medial() -> BeamGeometry {
        BeamGeometry {
            collimator_angle: 12.0,
            gantry_angle: 305.0,
            couch_angle: 0.0,
            jaws: RectAperture::new(-80.0, -100.0, 40.0, 120.0),
            isocenter: Vector3::new(10.0, -20.0, 5.0),
        }
    }

    #[test]
    fn mirrors_collimator_and_jaws() {
        let lat = lateral_from_medial(&medial());
        assert_eq!(lat.collimator_angle, 348.0);
        assert_eq!(lat.jaws, RectAperture::new(-40.0, -100.0, 80.0, 120.0));
        assert_eq!(lat.isocenter, medial().isocenter);
        assert_eq!(lat.couch_angle, 0.0);
    }

    #[test]
    fn gantry_corrected_for_divergence() {
        let lat = lateral_from_medial(&medial());
        let delta = (4.0f64 / 100.0).asin().to_degrees();
        let expected = normalize_360(305.0 + 180.0 - 2.0 * delta);
        assert!((lat.gantry_angle - expected).abs() < 1e-12);
        assert!((lat.gantry_angle - 120.4151).abs() < 1e-3);
    }

    #[test]
    fn midline_posterior_edge_is_plain_opposition() {
        let g = BeamGeometry {
            gantry_angle: 300.0,
            jaws: RectAperture::new(-90.0, -100.0, 0.0, 100.0),
            ..BeamGeometry::default()
        };
        let lat = lateral_from_medial(&g);
        assert_eq!(divergence_angle(0.0), 0.0);
        assert_eq!(lat.gantry_angle, 120.0);
    }

    #[test]
    fn twice_restores_jaws_and_collimator() {
        let m = medial();
        let back = lateral_from_medial(&lateral_from_medial(&m));
        assert_eq!(back.jaws.x_range(), m.jaws.x_range());
        assert_eq!(back.jaws, m.jaws);
        assert!((back.collimator_angle - normalize_360(m.collimator_angle)).abs() < 1e-12);
    }

    #[test]
    fn ratio_is_clamped() {
        assert!((divergence_angle(5000.0) - 90.0).abs() < 1e-9);
        assert!(lateral_from_medial(&BeamGeometry {
            jaws: RectAperture::new(0.0, 0.0, 5000.0, 1.0),
            ..BeamGeometry::default()
        })
        .gantry_angle
            .is_finite());
    }
}
