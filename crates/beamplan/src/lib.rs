//! Tangential beam planning core.
//!
//! Components
//! - `angle`: angle normalization and folding.
//! - `poly`: fixed-point polygon sets, even-odd overlap, offsets, principal axis.
//! - `gantry`, `collimator`, `opposed`: the three geometry steps of a tangent pair.
//! - `weights`: constrained Nelder–Mead over beam weights.
//! - `host`: the planning-system seams; `phantom` is an in-memory implementation.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API.
//! - `api` and `prelude` are the curated import surfaces.

pub mod angle;
pub mod api;
pub mod builder;
pub mod collimator;
pub mod error;
pub mod gantry;
pub mod geometry;
pub mod host;
pub mod mlc;
pub mod opposed;
pub mod phantom;
pub mod poly;
pub mod weights;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{HostError, PlanError};
pub use nalgebra::{Vector2 as Vec2, Vector3 as Vec3};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::builder::BeamBuilder;
    pub use crate::error::{HostError, PlanError};
    pub use crate::gantry::{GantryCfg, Laterality};
    pub use crate::geometry::{BeamGeometry, RectAperture};
    pub use crate::host::{DoseHost, FieldHost, MachineParams};
    pub use crate::poly::{IntPolygonSet, PolygonSet};
    pub use crate::weights::SimplexCfg;
    pub use nalgebra::{Vector2 as Vec2, Vector3 as Vec3};
}
