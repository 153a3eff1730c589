//! Collaborator seams: the planning host as seen by the search and
//! optimization code.
//!
//! - `FieldHost`: create/remove fields and extract structure outlines.
//! - `DoseHost`: per-field weights and dose recomputation.
//! - `TransientField`: scoped field that is removed on every exit path.
//!
//! The host is always passed explicitly; nothing here holds global state.

use crate::error::HostError;
use crate::geometry::BeamGeometry;
use crate::mlc::{open_to_field, LeafPositions};
use crate::poly::PolygonSet;

/// Identifier used for fields that only live inside a search step.
pub const TRANSIENT_FIELD_ID: &str = "_transient";

/// Treatment machine parameters attached to every field request.
#[derive(Clone, Debug, PartialEq)]
pub struct MachineParams {
    pub machine_id: String,
    pub energy: String,
    pub dose_rate: u32,
    pub technique: String,
}

impl Default for MachineParams {
    fn default() -> Self {
        Self {
            machine_id: "TrueBeam".to_string(),
            energy: "6X".to_string(),
            dose_rate: 600,
            technique: "STATIC".to_string(),
        }
    }
}

/// Everything a host needs to add an MLC field to the plan.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldRequest {
    pub id: String,
    pub geometry: BeamGeometry,
    pub leaves: LeafPositions,
    pub machine: MachineParams,
}

impl FieldRequest {
    /// Open-field request: leaves retracted to the jaw X edges.
    pub fn open(id: &str, geometry: BeamGeometry, machine: &MachineParams) -> Self {
        Self {
            id: id.to_string(),
            leaves: open_to_field(&geometry.jaws),
            geometry,
            machine: machine.clone(),
        }
    }
}

/// Field creation, removal and outline extraction.
pub trait FieldHost {
    type Field;

    fn add_field(&mut self, request: &FieldRequest) -> Result<Self::Field, HostError>;

    /// Remove a field from the plan. Removing an already-removed field must
    /// not alter the plan (an error is acceptable).
    fn remove_field(&mut self, field: Self::Field) -> Result<(), HostError>;

    /// Outline of `structure` in the field's view; `Ok(None)` when the
    /// structure does not intersect the field.
    fn structure_outline(
        &mut self,
        field: &Self::Field,
        structure: &str,
        projected: bool,
    ) -> Result<Option<PolygonSet>, HostError>;
}

/// Beam weights and dose for the non-setup fields of a plan, in plan order.
pub trait DoseHost {
    fn treatment_weights(&self) -> Vec<f64>;
    fn set_treatment_weight(&mut self, index: usize, weight: f64) -> Result<(), HostError>;
    fn dose_is_valid(&self) -> bool;
    fn calculate_dose(&mut self) -> Result<(), HostError>;
    /// Maximum of the current 3D dose, if any dose exists.
    fn max_dose(&self) -> Option<f64>;
}

/// A field that exists only for the lifetime of this guard.
///
/// Dropping the guard removes the field; a removal failure during drop is
/// logged. `release` removes it eagerly and reports the failure instead.
pub struct TransientField<'h, H: FieldHost> {
    host: &'h mut H,
    field: Option<H::Field>,
}

impl<'h, H: FieldHost> TransientField<'h, H> {
    pub fn create(host: &'h mut H, request: &FieldRequest) -> Result<Self, HostError> {
        let field = host.add_field(request)?;
        Ok(Self {
            host,
            field: Some(field),
        })
    }

    /// Projected outline of `structure` through this field.
    pub fn outline(&mut self, structure: &str) -> Result<Option<PolygonSet>, HostError> {
        match self.field.as_ref() {
            Some(field) => self.host.structure_outline(field, structure, true),
            None => Ok(None),
        }
    }

    /// Run `f` with the host and the live field.
    pub fn with<R>(&mut self, f: impl FnOnce(&mut H, &H::Field) -> R) -> Option<R> {
        let field = self.field.as_ref()?;
        Some(f(&mut *self.host, field))
    }

    pub fn release(mut self) -> Result<(), HostError> {
        match self.field.take() {
            Some(field) => self.host.remove_field(field),
            None => Ok(()),
        }
    }
}

impl<H: FieldHost> Drop for TransientField<'_, H> {
    fn drop(&mut self) {
        if let Some(field) = self.field.take() {
            if let Err(err) = self.host.remove_field(field) {
                tracing::warn!(%err, "failed to remove transient field");
            }
        }
    }
}
