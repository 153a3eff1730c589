//! Tangent-pair builder session.
//!
//! Owns the geometry of the next field and the machine parameters. Each
//! `set_*` step derives a new `BeamGeometry` and stores it as the next one;
//! nothing is committed to the plan until `create_next_field`.

use crate::collimator::align_collimator;
use crate::error::{HostError, PlanError};
use crate::gantry::{search_gantry_angle, GantryCfg, GantrySearch, Laterality};
use crate::geometry::BeamGeometry;
use crate::host::{FieldHost, FieldRequest, MachineParams, TransientField, TRANSIENT_FIELD_ID};
use crate::opposed::lateral_from_medial;
use crate::poly::PolygonSet;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BeamBuilder {
    machine: MachineParams,
    next: BeamGeometry,
}

impl BeamBuilder {
    /// Session starting from the default geometry.
    pub fn new(machine: MachineParams) -> Self {
        Self {
            machine,
            next: BeamGeometry::default(),
        }
    }

    pub fn with_geometry(machine: MachineParams, next: BeamGeometry) -> Self {
        Self { machine, next }
    }

    pub fn machine(&self) -> &MachineParams {
        &self.machine
    }

    pub fn next_geometry(&self) -> &BeamGeometry {
        &self.next
    }

    pub fn set_next_geometry(&mut self, next: BeamGeometry) {
        self.next = next;
    }

    /// Scan gantry angles for the medial tangent and store the best one.
    pub fn set_medial_gantry_angle<H: FieldHost>(
        &mut self,
        host: &mut H,
        target: &str,
        avoid: &str,
        side: Laterality,
        cfg: &GantryCfg,
    ) -> Result<GantrySearch, PlanError> {
        let search =
            search_gantry_angle(host, &self.machine, &self.next, target, avoid, side, cfg)?;
        self.next = self.next.with_gantry(search.angle);
        Ok(search)
    }

    /// Align the collimator to the shape returned by `shape` for a transient
    /// field with the next geometry; returns the stored angle.
    pub fn set_collimator_for_shape<H, F>(
        &mut self,
        host: &mut H,
        shape: F,
        fold: bool,
    ) -> Result<f64, PlanError>
    where
        H: FieldHost,
        F: FnOnce(&mut H, &H::Field) -> Result<PolygonSet, HostError>,
    {
        let angle = align_collimator(host, &self.machine, &self.next, shape, fold)?;
        self.next = self.next.with_collimator(angle);
        Ok(angle)
    }

    /// Replace the next geometry (taken as the medial tangent) by its opposed
    /// lateral field.
    pub fn set_lateral_from_medial(&mut self) -> BeamGeometry {
        self.next = lateral_from_medial(&self.next);
        self.next
    }

    /// Add a persistent open field with the next geometry.
    pub fn create_next_field<H: FieldHost>(
        &self,
        host: &mut H,
        id: &str,
    ) -> Result<H::Field, PlanError> {
        let request = FieldRequest::open(id, self.next, &self.machine);
        let field = host.add_field(&request)?;
        tracing::info!(
            id,
            gantry = self.next.gantry_angle,
            collimator = self.next.collimator_angle,
            "field created"
        );
        Ok(field)
    }

    /// Scoped field with the next geometry; removed when dropped.
    pub fn transient_field<'h, H: FieldHost>(
        &self,
        host: &'h mut H,
    ) -> Result<TransientField<'h, H>, PlanError> {
        let request = FieldRequest::open(TRANSIENT_FIELD_ID, self.next, &self.machine);
        Ok(TransientField::create(host, &request)?)
    }
}
