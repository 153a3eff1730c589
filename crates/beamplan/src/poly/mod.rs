//! Polygon operations on fixed-point contour sets.
//!
//! Purpose
//! - Convert millimetre outlines to an exact integer grid (`IntPolygonSet`).
//! - Even-odd intersection area, offset (`inflate`), margin band (`ring`),
//!   and the principal axis of a set.
//!
//! The boolean engine is `i_overlay`; nothing here clips by hand.

mod cfg;
mod clip;
mod moments;
mod types;

pub use cfg::{CLEAN_TOLERANCE_MM, SCALE};
pub use clip::{area_mm, inflate, intersect, overlap_area_mm, ring, simplify_mm};
pub use moments::principal_angle;
pub use types::{IntPolygonSet, Polygon, PolygonSet};
