//! Print the tangent pair chosen for the phantom breast on either side.
//!
//! Usage:
//!   cargo run -p beamplan --example tangent_pair -- left
//!   cargo run -p beamplan --example tangent_pair -- right

use beamplan::api::{
    breast_isocenter, breast_phantom, equalize, optimize, BeamBuilder, BeamGeometry, FieldHost,
    GantryCfg, Laterality, MachineParams, RectAperture, SimplexCfg, AVOID_ID, TARGET_ID,
};

fn main() {
    let side = match std::env::args().nth(1).as_deref() {
        Some("right") => Laterality::Right,
        Some("left") | None => Laterality::Left,
        Some(other) => {
            eprintln!("usage: tangent_pair [left|right], got {other}");
            return;
        }
    };
    let jaws = match side {
        Laterality::Left => RectAperture::new(-100.0, -100.0, 0.0, 100.0),
        Laterality::Right => RectAperture::new(100.0, -100.0, 0.0, 100.0),
    };
    let mut host = breast_phantom(side);
    let mut builder = BeamBuilder::with_geometry(
        MachineParams::default(),
        BeamGeometry {
            jaws,
            isocenter: breast_isocenter(side),
            ..BeamGeometry::default()
        },
    );

    let search = builder
        .set_medial_gantry_angle(&mut host, TARGET_ID, AVOID_ID, side, &GantryCfg::default())
        .unwrap();
    println!(
        "medial gantry {:>5.1}  overlap {:?} mm²  ({:?})",
        search.angle, search.overlap_mm2, search.outcome
    );
    let coll = builder
        .set_collimator_for_shape(
            &mut host,
            |h, f| Ok(h.structure_outline(f, TARGET_ID, false)?.unwrap_or_default()),
            true,
        )
        .unwrap();
    println!("collimator    {coll:>5.1}");
    builder.create_next_field(&mut host, "MED").unwrap();
    let lat = builder.set_lateral_from_medial();
    builder.create_next_field(&mut host, "LAT").unwrap();
    println!(
        "lateral gantry {:>5.1}  collimator {:>5.1}",
        lat.gantry_angle, lat.collimator_angle
    );

    equalize(&mut host, 1.0).unwrap();
    let report = optimize(&mut host, &SimplexCfg::default()).unwrap();
    println!(
        "weights {:?}  max dose {:.4} Gy  ({} evaluations)",
        report.weights, report.score, report.evaluations
    );
}
