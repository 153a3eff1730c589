//! Beam geometry descriptor.
//!
//! `BeamGeometry` is a plain value: search steps take a copy, vary one
//! parameter, and hand the result back. Nothing in here talks to a host.

use nalgebra::Vector3;

use crate::poly::PolygonSet;

/// Rectangular jaw aperture at isocenter, in millimetres.
///
/// Corner order is not enforced: `x1 > x2` is a valid value and consumers
/// normalize through `x_range`/`y_range` where they need ordered bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectAperture {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl RectAperture {
    #[inline]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// `(min, max)` of the X edges.
    #[inline]
    pub fn x_range(&self) -> (f64, f64) {
        (self.x1.min(self.x2), self.x1.max(self.x2))
    }

    /// `(min, max)` of the Y edges.
    #[inline]
    pub fn y_range(&self) -> (f64, f64) {
        (self.y1.min(self.y2), self.y1.max(self.y2))
    }

    /// Aperture outline in the collimator frame.
    pub fn outline(&self) -> PolygonSet {
        PolygonSet::rect(self.x1, self.y1, self.x2, self.y2)
    }
}

impl Default for RectAperture {
    fn default() -> Self {
        Self::new(-5.0, -5.0, 5.0, 5.0)
    }
}

/// Geometry of a beam that has not been realized in a plan yet.
///
/// Angles are raw degrees; callers normalize where a canonical form matters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamGeometry {
    pub collimator_angle: f64,
    pub gantry_angle: f64,
    pub couch_angle: f64,
    pub jaws: RectAperture,
    pub isocenter: Vector3<f64>,
}

impl Default for BeamGeometry {
    fn default() -> Self {
        Self {
            collimator_angle: 0.0,
            gantry_angle: 0.0,
            couch_angle: 0.0,
            jaws: RectAperture::default(),
            isocenter: Vector3::zeros(),
        }
    }
}

impl BeamGeometry {
    #[inline]
    pub fn with_gantry(self, gantry_angle: f64) -> Self {
        Self {
            gantry_angle,
            ..self
        }
    }

    #[inline]
    pub fn with_collimator(self, collimator_angle: f64) -> Self {
        Self {
            collimator_angle,
            ..self
        }
    }

    #[inline]
    pub fn with_jaws(self, jaws: RectAperture) -> Self {
        Self { jaws, ..self }
    }
}
