//! Fixed-point and tolerance defaults for polygon operations.
//!
//! Policy
//! - Defaults are fixed constants. Call sites that need a different tolerance
//!   pass it explicitly (see `simplify_mm`).

/// Integer subunits per millimetre (0.01 mm resolution).
pub const SCALE: f64 = 100.0;
/// Simplification tolerance applied by `overlap_area_mm(.., clean = true)`.
pub const CLEAN_TOLERANCE_MM: f64 = 0.5;
/// Angular step of round joins produced by `inflate`, in radians.
pub(crate) const ROUND_JOIN_STEP_RAD: f64 = 0.1;
/// Below this |Sxy| the covariance is treated as diagonal.
pub(crate) const EIGEN_EPS: f64 = 1e-12;
