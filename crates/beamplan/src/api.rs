//! Curated internal API (UNSTABLE).
//!
//! Important
//! - This is not a public API. It is a convenience surface for the CLI, the
//!   benches and integration tests. Breaking changes are allowed.

// Angles
pub use crate::angle::{fold_to_45, normalize_180, normalize_360, reduce_90};
// Polygon sets
pub use crate::poly::{
    area_mm, inflate, intersect, overlap_area_mm, principal_angle, ring, simplify_mm,
    IntPolygonSet, Polygon, PolygonSet, CLEAN_TOLERANCE_MM, SCALE,
};
// Geometry steps
pub use crate::collimator::{align_collimator, collimator_for_axis, collimator_for_shape};
pub use crate::gantry::{
    search_gantry_angle, AngleRange, GantryCfg, GantrySearch, Laterality, SearchOutcome,
};
pub use crate::opposed::{divergence_angle, lateral_from_medial, mirror_jaws, SAD_CM};
// Beam weights
pub use crate::weights::{
    apply_weights, equalize, optimize, project, recompute_if_possible, NelderMeadCoeffs,
    SimplexCfg, SimplexReport, WeightBounds,
};
// Session, seams and the in-memory host
pub use crate::builder::BeamBuilder;
pub use crate::geometry::{BeamGeometry, RectAperture};
pub use crate::host::{
    DoseHost, FieldHost, FieldRequest, MachineParams, TransientField, TRANSIENT_FIELD_ID,
};
pub use crate::mlc::{open_to_field, LeafPositions, LEAF_PAIRS};
pub use crate::phantom::{
    breast_isocenter, breast_phantom, FieldHandle, Phantom, PlanField, SlicedStructure, AVOID_ID,
    TARGET_ID,
};
