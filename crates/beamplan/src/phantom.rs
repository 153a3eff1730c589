//! In-memory planning host.
//!
//! Purpose
//! - Stand-in for a treatment planning system: holds structures, fields,
//!   weights and a toy dose model so the search and optimization code can run
//!   end to end without one.
//!
//! Coordinates
//! - Patient axial plane: `x` towards patient left, `y` anterior, `z` superior
//!   (mm). Gantry angle `g` puts the source at `(sin g, cos g)`, so the beam
//!   travels along `-(sin g, cos g)`.
//! - Beam's-eye view (BEV): `u = (cos g, -sin g)·(p - iso)`, `v = z - iso_z`.
//!   Outlines are parallel projections of the structure slices.
//!
//! Dose model
//! - Every vertex of the dose structure is a dose point. A treatment field
//!   with weight `w` deposits `dose_per_weight · w · exp(-mu · depth)` there,
//!   `depth` measured from the first dose point the beam meets. The plan's
//!   max dose is the hottest dose point.

use std::collections::BTreeMap;
use std::fmt;

use nalgebra::{Vector2, Vector3};

use crate::error::HostError;
use crate::gantry::Laterality;
use crate::geometry::{BeamGeometry, RectAperture};
use crate::host::{DoseHost, FieldHost, FieldRequest, MachineParams};
use crate::mlc::LeafPositions;
use crate::poly::{intersect, IntPolygonSet, Polygon, PolygonSet};

/// Linear attenuation per mm of depth.
pub const DEFAULT_MU: f64 = 0.005;
/// Dose (Gy) delivered at zero depth by unit weight.
pub const DEFAULT_DOSE_PER_WEIGHT: f64 = 2.0;

/// Structure given as axial slices `(z, contour)`, sorted by `z`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlicedStructure {
    pub slices: Vec<(f64, Polygon)>,
}

impl SlicedStructure {
    /// Constant cross-section between `z0` and `z1`.
    pub fn prism(contour: Polygon, z0: f64, z1: f64) -> Self {
        Self::from_slices(vec![(z0, contour.clone()), (z1, contour)])
    }

    pub fn from_slices(mut slices: Vec<(f64, Polygon)>) -> Self {
        slices.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { slices }
    }

    /// Every vertex as a 3D point.
    pub fn points(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        self.slices
            .iter()
            .flat_map(|(z, c)| c.iter().map(move |p| Vector3::new(p.x, p.y, *z)))
    }

    /// BEV silhouette for `geometry`; `None` with fewer than two non-empty slices.
    ///
    /// Each slice projects to an interval on `u`; the silhouette joins the
    /// lower ends bottom-up and the upper ends top-down.
    pub fn silhouette(&self, geometry: &BeamGeometry) -> Option<PolygonSet> {
        let u_axis = bev_u_axis(geometry.gantry_angle);
        let iso = geometry.isocenter;
        let spans: Vec<(f64, f64, f64)> = self
            .slices
            .iter()
            .filter_map(|(z, c)| {
                let us = c.iter().map(|p| (p - iso.xy()).dot(&u_axis));
                let (lo, hi) = us.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), u| {
                    (lo.min(u), hi.max(u))
                });
                (lo <= hi).then_some((z - iso.z, lo, hi))
            })
            .collect();
        if spans.len() < 2 {
            return None;
        }
        let mut contour: Polygon = spans.iter().map(|&(v, lo, _)| Vector2::new(lo, v)).collect();
        contour.extend(spans.iter().rev().map(|&(v, _, hi)| Vector2::new(hi, v)));
        Some(PolygonSet::new(vec![contour]))
    }
}

/// BEV horizontal axis in the axial plane.
#[inline]
pub fn bev_u_axis(gantry_deg: f64) -> Vector2<f64> {
    let (s, c) = gantry_deg.to_radians().sin_cos();
    Vector2::new(c, -s)
}

/// Beam travel direction in the axial plane.
#[inline]
pub fn beam_direction(gantry_deg: f64) -> Vector2<f64> {
    let (s, c) = gantry_deg.to_radians().sin_cos();
    Vector2::new(-s, -c)
}

/// Opaque field handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldHandle(u64);

impl fmt::Display for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Field as stored in the phantom plan.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanField {
    pub handle: FieldHandle,
    pub id: String,
    pub geometry: BeamGeometry,
    pub leaves: LeafPositions,
    pub machine: MachineParams,
    pub setup: bool,
    pub weight: f64,
}

/// In-memory plan implementing `FieldHost` and `DoseHost`.
#[derive(Clone, Debug)]
pub struct Phantom {
    structures: BTreeMap<String, SlicedStructure>,
    fields: Vec<PlanField>,
    next_handle: u64,
    dose_structure: Option<String>,
    dose: Option<f64>,
    dose_valid: bool,
    allow_dose_calc: bool,
    mu: f64,
    dose_per_weight: f64,
    created: usize,
    dose_calcs: usize,
}

impl Default for Phantom {
    fn default() -> Self {
        Self {
            structures: BTreeMap::new(),
            fields: Vec::new(),
            next_handle: 1,
            dose_structure: None,
            dose: None,
            dose_valid: false,
            allow_dose_calc: true,
            mu: DEFAULT_MU,
            dose_per_weight: DEFAULT_DOSE_PER_WEIGHT,
            created: 0,
            dose_calcs: 0,
        }
    }
}

impl Phantom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structure(mut self, id: &str, structure: SlicedStructure) -> Self {
        self.insert_structure(id, structure);
        self
    }

    pub fn insert_structure(&mut self, id: &str, structure: SlicedStructure) {
        self.structures.insert(id.to_string(), structure);
        self.dose_valid = false;
    }

    pub fn structure(&self, id: &str) -> Option<&SlicedStructure> {
        self.structures.get(id)
    }

    /// Structure whose vertices are the dose points.
    pub fn set_dose_structure(&mut self, id: &str) {
        self.dose_structure = Some(id.to_string());
        self.dose_valid = false;
    }

    /// Disallow recomputation; `calculate_dose` then fails and the last dose stays.
    pub fn set_allow_dose_calc(&mut self, allow: bool) {
        self.allow_dose_calc = allow;
    }

    /// Add a setup field. Setup fields carry no weight and deposit no dose.
    pub fn add_setup_field(&mut self, id: &str, geometry: BeamGeometry) -> FieldHandle {
        let request = FieldRequest::open(id, geometry, &MachineParams::default());
        self.push_field(&request, true)
    }

    pub fn fields(&self) -> &[PlanField] {
        &self.fields
    }

    pub fn field(&self, handle: FieldHandle) -> Option<&PlanField> {
        self.fields.iter().find(|f| f.handle == handle)
    }

    pub fn field_by_id(&self, id: &str) -> Option<&PlanField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Remove every field, setup fields included.
    pub fn remove_all_fields(&mut self) {
        self.fields.clear();
        self.dose_valid = false;
    }

    /// Fields ever added through `FieldHost::add_field`.
    pub fn created_fields(&self) -> usize {
        self.created
    }

    /// Successful dose calculations so far.
    pub fn dose_calculations(&self) -> usize {
        self.dose_calcs
    }

    fn push_field(&mut self, request: &FieldRequest, setup: bool) -> FieldHandle {
        let handle = FieldHandle(self.next_handle);
        self.next_handle += 1;
        self.fields.push(PlanField {
            handle,
            id: request.id.clone(),
            geometry: request.geometry,
            leaves: request.leaves,
            machine: request.machine.clone(),
            setup,
            weight: if setup { 0.0 } else { 1.0 },
        });
        self.dose_valid = false;
        handle
    }

    fn treatment_fields(&self) -> impl Iterator<Item = &PlanField> {
        self.fields.iter().filter(|f| !f.setup)
    }

    /// Hottest dose point for the current weights; `None` without dose points
    /// or treatment fields.
    fn evaluate_dose(&self) -> Option<f64> {
        let points: Vec<Vector3<f64>> = self
            .dose_structure
            .as_deref()
            .and_then(|id| self.structures.get(id))
            .map(|s| s.points().collect())
            .unwrap_or_default();
        let fields: Vec<&PlanField> = self.treatment_fields().collect();
        if points.is_empty() || fields.is_empty() {
            return None;
        }
        let mut dose = vec![0.0; points.len()];
        for f in fields {
            let d = beam_direction(f.geometry.gantry_angle);
            let along: Vec<f64> = points.iter().map(|p| p.xy().dot(&d)).collect();
            let entry = along.iter().copied().fold(f64::INFINITY, f64::min);
            for (acc, t) in dose.iter_mut().zip(&along) {
                *acc += self.dose_per_weight * f.weight * (-self.mu * (t - entry)).exp();
            }
        }
        dose.into_iter().reduce(f64::max)
    }
}

fn aperture_in_bev(jaws: &RectAperture, collimator_deg: f64) -> IntPolygonSet {
    IntPolygonSet::from(&jaws.outline().rotated(collimator_deg))
}

impl FieldHost for Phantom {
    type Field = FieldHandle;

    fn add_field(&mut self, request: &FieldRequest) -> Result<FieldHandle, HostError> {
        let (x_lo, x_hi) = request.geometry.jaws.x_range();
        let (y_lo, y_hi) = request.geometry.jaws.y_range();
        if x_hi - x_lo <= 0.0 || y_hi - y_lo <= 0.0 {
            return Err(HostError::Rejected(format!("{}: jaws enclose no area", request.id)));
        }
        if self.fields.iter().any(|f| f.id == request.id) {
            return Err(HostError::Rejected(format!("{}: id already in plan", request.id)));
        }
        self.created += 1;
        Ok(self.push_field(request, false))
    }

    fn remove_field(&mut self, field: FieldHandle) -> Result<(), HostError> {
        let idx = self
            .fields
            .iter()
            .position(|f| f.handle == field)
            .ok_or_else(|| HostError::UnknownField(field.to_string()))?;
        self.fields.remove(idx);
        self.dose_valid = false;
        Ok(())
    }

    /// `projected` outlines are clipped to the rotated jaw aperture; otherwise
    /// the full silhouette is returned.
    fn structure_outline(
        &mut self,
        field: &FieldHandle,
        structure: &str,
        projected: bool,
    ) -> Result<Option<PolygonSet>, HostError> {
        let f = self
            .field(*field)
            .ok_or_else(|| HostError::UnknownField(field.to_string()))?;
        let s = self
            .structures
            .get(structure)
            .ok_or_else(|| HostError::UnknownStructure(structure.to_string()))?;
        let Some(silhouette) = s.silhouette(&f.geometry) else {
            return Ok(None);
        };
        if !projected {
            return Ok(Some(silhouette));
        }
        let aperture = aperture_in_bev(&f.geometry.jaws, f.geometry.collimator_angle);
        let clipped = intersect(&IntPolygonSet::from(&silhouette), &aperture);
        Ok((!clipped.is_empty()).then(|| clipped.to_mm()))
    }
}

impl DoseHost for Phantom {
    fn treatment_weights(&self) -> Vec<f64> {
        self.treatment_fields().map(|f| f.weight).collect()
    }

    fn set_treatment_weight(&mut self, index: usize, weight: f64) -> Result<(), HostError> {
        let count = self.treatment_fields().count();
        let field = self
            .fields
            .iter_mut()
            .filter(|f| !f.setup)
            .nth(index)
            .ok_or(HostError::FieldIndex { index, count })?;
        field.weight = weight;
        self.dose_valid = false;
        Ok(())
    }

    fn dose_is_valid(&self) -> bool {
        self.dose_valid
    }

    fn calculate_dose(&mut self) -> Result<(), HostError> {
        if !self.allow_dose_calc {
            return Err(HostError::DoseCalculation("plan is locked".to_string()));
        }
        self.dose = self.evaluate_dose();
        self.dose_valid = true;
        self.dose_calcs += 1;
        Ok(())
    }

    fn max_dose(&self) -> Option<f64> {
        self.dose
    }
}

/// Structure ids used by `breast_phantom`.
pub const TARGET_ID: &str = "CTV";
pub const AVOID_ID: &str = "Lung";

/// Whole-breast target over the ipsilateral lung, separated by a chest wall
/// that runs along the beam line of a 300° gantry (left) or 60° (right).
///
/// The target leans laterally towards superior so its BEV silhouette is
/// tilted.
pub fn breast_phantom(side: Laterality) -> Phantom {
    let sign = match side {
        Laterality::Left => 1.0,
        Laterality::Right => -1.0,
    };
    let contour = |pts: &[(f64, f64)], shift: f64| -> Polygon {
        pts.iter()
            .map(|&(x, y)| Vector2::new(sign * (x + shift), y))
            .collect()
    };
    const CTV: [(f64, f64); 7] = [
        (20.0, 55.0),
        (60.0, 85.0),
        (110.0, 75.0),
        (145.0, 35.0),
        (155.0, -15.0),
        (110.0, 5.0),
        (60.0, 30.0),
    ];
    const LUNG: [(f64, f64); 7] = [
        (25.0, 35.0),
        (70.0, 10.0),
        (115.0, -15.0),
        (140.0, -40.0),
        (135.0, -110.0),
        (70.0, -120.0),
        (25.0, -70.0),
    ];
    let ctv = SlicedStructure::from_slices(
        [-60.0, -20.0, 20.0, 60.0]
            .iter()
            .map(|&z| (z, contour(&CTV[..], 0.1 * z)))
            .collect(),
    );
    let lung = SlicedStructure::prism(contour(&LUNG[..], 0.0), -90.0, 90.0);
    let mut phantom = Phantom::new()
        .with_structure(TARGET_ID, ctv)
        .with_structure(AVOID_ID, lung);
    phantom.set_dose_structure(TARGET_ID);
    phantom
}

/// Isocenter used with `breast_phantom`.
pub fn breast_isocenter(side: Laterality) -> Vector3<f64> {
    let x = match side {
        Laterality::Left => 90.0,
        Laterality::Right => -90.0,
    };
    Vector3::new(x, 40.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly::area_mm;

    fn square(half: f64) -> Polygon {
        PolygonSet::rect(-half, -half, half, half).contours.remove(0)
    }

    fn geometry(gantry: f64) -> BeamGeometry {
        BeamGeometry {
            gantry_angle: gantry,
            jaws: RectAperture::new(-100.0, -100.0, 100.0, 100.0),
            ..BeamGeometry::default()
        }
    }

    #[test]
    fn prism_silhouette_is_width_by_height() {
        let s = SlicedStructure::prism(square(10.0), -30.0, 30.0);
        let sil = s.silhouette(&geometry(0.0)).unwrap();
        let area = area_mm(&IntPolygonSet::from(&sil));
        assert!((area - 20.0 * 60.0).abs() < 1e-6);
        // Diagonal view of a square is wider by sqrt(2).
        let sil = s.silhouette(&geometry(45.0)).unwrap();
        let area = area_mm(&IntPolygonSet::from(&sil));
        assert!((area - 20.0 * 2f64.sqrt() * 60.0).abs() < 0.1);
    }

    #[test]
    fn single_slice_has_no_silhouette() {
        let s = SlicedStructure::from_slices(vec![(0.0, square(5.0))]);
        assert!(s.silhouette(&geometry(0.0)).is_none());
    }

    #[test]
    fn projected_outline_is_clipped_to_jaws() {
        let mut ph = Phantom::new()
            .with_structure("box", SlicedStructure::prism(square(50.0), -50.0, 50.0));
        let g = geometry(0.0).with_jaws(RectAperture::new(-10.0, -20.0, 10.0, 20.0));
        let f = ph.add_field(&FieldRequest::open("A", g, &MachineParams::default())).unwrap();
        let full = ph.structure_outline(&f, "box", false).unwrap().unwrap();
        let clipped = ph.structure_outline(&f, "box", true).unwrap().unwrap();
        assert!((area_mm(&IntPolygonSet::from(&full)) - 10_000.0).abs() < 1e-6);
        assert!((area_mm(&IntPolygonSet::from(&clipped)) - 800.0).abs() < 1e-6);
        assert_eq!(
            ph.structure_outline(&f, "nope", true),
            Err(HostError::UnknownStructure("nope".into()))
        );
    }

    #[test]
    fn outline_outside_aperture_is_absent() {
        let mut ph =
            Phantom::new().with_structure("box", SlicedStructure::prism(square(5.0), -5.0, 5.0));
        let g = BeamGeometry {
            isocenter: Vector3::new(0.0, 0.0, 500.0),
            ..geometry(0.0)
        };
        let f = ph.add_field(&FieldRequest::open("A", g, &MachineParams::default())).unwrap();
        assert_eq!(ph.structure_outline(&f, "box", true), Ok(None));
        assert!(ph.structure_outline(&f, "box", false).unwrap().is_some());
    }

    #[test]
    fn field_lifecycle() {
        let mut ph = Phantom::new();
        let req = FieldRequest::open("A", geometry(10.0), &MachineParams::default());
        let a = ph.add_field(&req).unwrap();
        assert!(matches!(ph.add_field(&req), Err(HostError::Rejected(_))));
        ph.remove_field(a).unwrap();
        assert_eq!(ph.remove_field(a), Err(HostError::UnknownField(a.to_string())));
        assert!(ph.fields().is_empty());

        let flat = geometry(0.0).with_jaws(RectAperture::new(1.0, -5.0, 1.0, 5.0));
        let err = ph.add_field(&FieldRequest::open("B", flat, &MachineParams::default()));
        assert!(matches!(err, Err(HostError::Rejected(_))));
        assert_eq!(ph.created_fields(), 1);
    }

    #[test]
    fn setup_fields_are_not_weighted() {
        let mut ph = breast_phantom(Laterality::Left);
        ph.add_setup_field("CBCT", BeamGeometry::default());
        ph.add_field(&FieldRequest::open("M", geometry(300.0), &MachineParams::default()))
            .unwrap();
        assert_eq!(ph.treatment_weights(), vec![1.0]);
        ph.set_treatment_weight(0, 0.4).unwrap();
        assert_eq!(ph.field_by_id("M").unwrap().weight, 0.4);
        assert_eq!(ph.field_by_id("CBCT").unwrap().weight, 0.0);
        assert_eq!(
            ph.set_treatment_weight(1, 0.4),
            Err(HostError::FieldIndex { index: 1, count: 1 })
        );
        ph.remove_all_fields();
        assert!(ph.treatment_weights().is_empty());
    }

    #[test]
    fn dose_follows_weights_and_validity() {
        let mut ph = breast_phantom(Laterality::Left);
        assert_eq!(ph.max_dose(), None);
        let m = FieldRequest::open("M", geometry(300.0), &MachineParams::default());
        ph.add_field(&m).unwrap();
        assert!(!ph.dose_is_valid());
        ph.calculate_dose().unwrap();
        // Entry point receives the full unit-weight dose.
        assert!((ph.max_dose().unwrap() - DEFAULT_DOSE_PER_WEIGHT).abs() < 1e-12);

        ph.set_treatment_weight(0, 0.5).unwrap();
        assert!(!ph.dose_is_valid());
        ph.set_allow_dose_calc(false);
        assert!(matches!(ph.calculate_dose(), Err(HostError::DoseCalculation(_))));
        assert!((ph.max_dose().unwrap() - DEFAULT_DOSE_PER_WEIGHT).abs() < 1e-12);
        ph.set_allow_dose_calc(true);
        ph.calculate_dose().unwrap();
        assert!((ph.max_dose().unwrap() - 0.5 * DEFAULT_DOSE_PER_WEIGHT).abs() < 1e-12);
        assert_eq!(ph.dose_calculations(), 2);
    }

    #[test]
    fn breast_phantom_is_mirrored() {
        let left = breast_phantom(Laterality::Left);
        let right = breast_phantom(Laterality::Right);
        let l: Vec<_> = left.structure(TARGET_ID).unwrap().points().collect();
        let r: Vec<_> = right.structure(TARGET_ID).unwrap().points().collect();
        assert_eq!(l.len(), r.len());
        for (a, b) in l.iter().zip(&r) {
            assert!((a.x + b.x).abs() < 1e-12 && a.y == b.y && a.z == b.z);
        }
        assert_eq!(breast_isocenter(Laterality::Right).x, -90.0);
    }

    #[test]
    fn beam_axes_are_orthogonal() {
        for g in [0.0, 37.0, 300.0] {
            assert!(bev_u_axis(g).dot(&beam_direction(g)).abs() < 1e-12);
        }
        let d = beam_direction(90.0);
        assert!((d.x + 1.0).abs() < 1e-12 && d.y.abs() < 1e-12);
    }
}
