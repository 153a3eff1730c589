//! Tangent-pair workflow on the phantom host.

use anyhow::{Context, Result};
use beamplan::api::{
    area_mm, breast_phantom, equalize, inflate, optimize, ring, BeamBuilder, BeamGeometry,
    DoseHost, FieldHandle, FieldHost, GantryCfg, IntPolygonSet, MachineParams, Phantom,
    SearchOutcome, SimplexCfg, AVOID_ID, TARGET_ID,
};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::scenario::{Scenario, Side};

pub const MEDIAL_ID: &str = "MED";
pub const LATERAL_ID: &str = "LAT";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldReport {
    pub id: String,
    pub gantry_deg: f64,
    pub collimator_deg: f64,
    pub couch_deg: f64,
    pub jaws_mm: [f64; 4],
    pub isocenter_mm: [f64; 3],
}

impl FieldReport {
    fn new(id: &str, g: &BeamGeometry) -> Self {
        Self {
            id: id.to_string(),
            gantry_deg: g.gantry_angle,
            collimator_deg: g.collimator_angle,
            couch_deg: g.couch_angle,
            jaws_mm: [g.jaws.x1, g.jaws.y1, g.jaws.x2, g.jaws.y2],
            isocenter_mm: [g.isocenter.x, g.isocenter.y, g.isocenter.z],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchReport {
    pub angle_deg: f64,
    pub overlap_mm2: Option<f64>,
    pub fallback: bool,
    pub angles_scanned: usize,
    pub angles_with_outlines: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeightsReport {
    pub weights: Vec<f64>,
    pub max_dose_gy: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
    pub stale_evaluations: usize,
    pub skipped: bool,
    pub history: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanReport {
    pub side: Side,
    pub search: SearchReport,
    pub medial: FieldReport,
    pub lateral: FieldReport,
    pub target_area_mm2: f64,
    pub margin_band_mm2: f64,
    pub weights: WeightsReport,
}

/// Report plus the per-angle scan trace.
pub struct PlanRun {
    pub report: PlanReport,
    pub trace: Vec<(f64, Option<f64>)>,
}

/// Run the full workflow for `scenario` against a fresh phantom.
pub fn run_plan(scenario: &Scenario) -> Result<PlanRun> {
    let side = scenario.laterality();
    let mut host = breast_phantom(side);
    let mut builder = BeamBuilder::with_geometry(
        MachineParams::from(&scenario.machine),
        BeamGeometry {
            jaws: scenario.jaws(),
            isocenter: scenario.isocenter(),
            ..BeamGeometry::default()
        },
    );

    let gantry_cfg = GantryCfg::from(scenario.gantry);
    let search = builder
        .set_medial_gantry_angle(&mut host, TARGET_ID, AVOID_ID, side, &gantry_cfg)
        .context("medial gantry search")?;
    builder
        .set_collimator_for_shape(
            &mut host,
            |h: &mut Phantom, f: &FieldHandle| {
                Ok(h.structure_outline(f, TARGET_ID, false)?.unwrap_or_default())
            },
            scenario.fold_to_45,
        )
        .context("collimator alignment")?;
    let medial = *builder.next_geometry();
    let medial_field = builder.create_next_field(&mut host, MEDIAL_ID)?;
    let lateral = builder.set_lateral_from_medial();
    builder.create_next_field(&mut host, LATERAL_ID)?;

    let outline = host
        .structure_outline(&medial_field, TARGET_ID, true)?
        .unwrap_or_default();
    let target = IntPolygonSet::from(&outline);
    let target_area_mm2 = area_mm(&target);
    let margin_band_mm2 = area_mm(&ring(&target, scenario.margin_mm));
    tracing::info!(
        target_area_mm2,
        margin_band_mm2,
        inflated_mm2 = area_mm(&inflate(&target, scenario.margin_mm)),
        "target outline in medial field"
    );

    equalize(&mut host, scenario.total_weight)?;
    if scenario.lock_dose {
        host.calculate_dose()?;
        host.set_allow_dose_calc(false);
    }
    let simplex_cfg = SimplexCfg::from(scenario.simplex);
    let opt = optimize(&mut host, &simplex_cfg).context("beam weight optimization")?;

    let report = PlanReport {
        side: scenario.side,
        search: SearchReport {
            angle_deg: search.angle,
            overlap_mm2: search.overlap_mm2,
            fallback: search.outcome == SearchOutcome::Fallback,
            angles_scanned: search.scanned.len(),
            angles_with_outlines: search.scanned.iter().filter(|(_, o)| o.is_some()).count(),
        },
        medial: FieldReport::new(MEDIAL_ID, &medial),
        lateral: FieldReport::new(LATERAL_ID, &lateral),
        target_area_mm2,
        margin_band_mm2,
        weights: WeightsReport {
            weights: opt.weights,
            max_dose_gy: opt.score,
            iterations: opt.iterations,
            evaluations: opt.evaluations,
            converged: opt.converged,
            stale_evaluations: opt.stale_evaluations,
            skipped: opt.skipped,
            history: opt.history,
        },
    };
    Ok(PlanRun {
        report,
        trace: search.scanned,
    })
}

/// Write the gantry scan trace as CSV (`gantry_deg`, `overlap_mm2`; empty
/// overlap where an outline was absent).
pub fn write_trace(path: &Path, trace: &[(f64, Option<f64>)]) -> Result<()> {
    let angles: Vec<f64> = trace.iter().map(|&(a, _)| a).collect();
    let overlaps: Vec<Option<f64>> = trace.iter().map(|&(_, o)| o).collect();
    let mut df = df!(
        "gantry_deg" => angles,
        "overlap_mm2" => overlaps,
    )?;
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
