//! Collimator rotation aligned to a field shape.
//!
//! A rectangular collimator has edge pairs 90° apart, so only the principal
//! axis angle modulo 90 matters. Folding into [-45, 45) keeps small shape
//! changes near a quadrant boundary from swinging the collimator by ~90°.

use crate::angle::{fold_to_45, normalize_360, reduce_90};
use crate::error::{HostError, PlanError};
use crate::geometry::BeamGeometry;
use crate::host::{FieldHost, FieldRequest, MachineParams, TransientField, TRANSIENT_FIELD_ID};
use crate::poly::{principal_angle, IntPolygonSet, PolygonSet};

/// Collimator angle in [0, 360) for a principal axis `theta` (degrees).
pub fn collimator_for_axis(theta: f64, fold: bool) -> f64 {
    let phi = reduce_90(theta);
    let phi = if fold { fold_to_45(phi) } else { phi };
    normalize_360(phi)
}

/// Collimator angle aligning the aperture to the polygon set's principal axis.
pub fn collimator_for_shape(shape: &IntPolygonSet, fold: bool) -> f64 {
    collimator_for_axis(principal_angle(shape), fold)
}

/// Realize `geometry` as a transient field, ask `shape` for the polygon set to
/// align to, remove the field, and return the collimator angle for that shape.
///
/// An empty shape aligns to 0°.
pub fn align_collimator<H, F>(
    host: &mut H,
    machine: &MachineParams,
    geometry: &BeamGeometry,
    shape: F,
    fold: bool,
) -> Result<f64, PlanError>
where
    H: FieldHost,
    F: FnOnce(&mut H, &H::Field) -> Result<PolygonSet, HostError>,
{
    let request = FieldRequest::open(TRANSIENT_FIELD_ID, *geometry, machine);
    let mut field = TransientField::create(host, &request)?;
    let shape = field.with(shape).transpose()?.unwrap_or_default();
    field.release()?;

    let int = IntPolygonSet::from(&shape);
    let theta = principal_angle(&int);
    let angle = collimator_for_axis(theta, fold);
    tracing::info!(theta, collimator = angle, fold, "collimator aligned");
    Ok(angle)
}
