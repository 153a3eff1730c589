//! Gantry angle search for a tangential field.
//!
//! Scans a side-dependent angle range in 1° steps. At each angle a transient
//! field is created, the target and avoidance outlines are read through it,
//! and their overlap area is measured. The angle with the smallest overlap
//! wins; ties keep the earliest angle.

use crate::error::PlanError;
use crate::geometry::BeamGeometry;
use crate::host::{FieldHost, FieldRequest, MachineParams, TransientField, TRANSIENT_FIELD_ID};
use crate::poly::{overlap_area_mm, IntPolygonSet};

/// Side of the patient the target lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Laterality {
    Left,
    Right,
}

/// Half-open integer angle range `[start, end)` in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AngleRange {
    pub start: i32,
    pub end: i32,
}

/// Search ranges per side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GantryCfg {
    pub left: AngleRange,
    pub right: AngleRange,
}

impl Default for GantryCfg {
    fn default() -> Self {
        Self {
            left: AngleRange {
                start: 290,
                end: 330,
            },
            right: AngleRange { start: 30, end: 70 },
        }
    }
}

impl GantryCfg {
    pub fn range(&self, side: Laterality) -> AngleRange {
        match side {
            Laterality::Left => self.left,
            Laterality::Right => self.right,
        }
    }
}

/// How the returned angle was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// At least one angle produced both outlines.
    Found,
    /// No angle produced both outlines; the range start is returned.
    Fallback,
}

/// Result of a gantry scan.
#[derive(Clone, Debug, PartialEq)]
pub struct GantrySearch {
    /// Best angle in raw degrees.
    pub angle: f64,
    /// Overlap at `angle` in mm², `None` on fallback.
    pub overlap_mm2: Option<f64>,
    pub outcome: SearchOutcome,
    /// Every scanned angle with its overlap (`None` where an outline was absent).
    pub scanned: Vec<(f64, Option<f64>)>,
}

/// Find the gantry angle minimizing the projected overlap of `target` and
/// `avoid`. `template` supplies every other geometry parameter.
///
/// Each transient field is removed before the next angle is tried, also when
/// outline extraction fails (the error is returned after cleanup).
pub fn search_gantry_angle<H: FieldHost>(
    host: &mut H,
    machine: &MachineParams,
    template: &BeamGeometry,
    target: &str,
    avoid: &str,
    side: Laterality,
    cfg: &GantryCfg,
) -> Result<GantrySearch, PlanError> {
    let range = cfg.range(side);
    let mut best: Option<(f64, f64)> = None;
    let mut scanned = Vec::with_capacity(range.end.saturating_sub(range.start).max(0) as usize);

    for ang in range.start..range.end {
        let angle = f64::from(ang);
        let request = FieldRequest::open(TRANSIENT_FIELD_ID, template.with_gantry(angle), machine);
        let mut field = TransientField::create(host, &request)?;
        let target_outline = field.outline(target)?;
        let avoid_outline = field.outline(avoid)?;
        field.release()?;

        let (Some(t), Some(a)) = (target_outline, avoid_outline) else {
            tracing::debug!(angle, "outline absent, angle skipped");
            scanned.push((angle, None));
            continue;
        };
        let overlap = overlap_area_mm(&IntPolygonSet::from(&t), &IntPolygonSet::from(&a), false);
        tracing::debug!(angle, overlap_mm2 = overlap, "gantry candidate");
        scanned.push((angle, Some(overlap)));
        if best.map_or(true, |(_, b)| overlap < b) {
            best = Some((angle, overlap));
        }
    }

    let result = match best {
        Some((angle, overlap)) => {
            tracing::info!(angle, overlap_mm2 = overlap, ?side, "gantry angle selected");
            GantrySearch {
                angle,
                overlap_mm2: Some(overlap),
                outcome: SearchOutcome::Found,
                scanned,
            }
        }
        None => {
            let angle = f64::from(range.start);
            tracing::warn!(angle, ?side, "no angle produced both outlines, using range start");
            GantrySearch {
                angle,
                overlap_mm2: None,
                outcome: SearchOutcome::Fallback,
                scanned,
            }
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::poly::PolygonSet;

    /// Target fixed at [0,20]²; avoidance square slides with the gantry angle.
    struct Sliding {
        live: usize,
        created: usize,
        offset: fn(f64) -> Option<f64>,
        fail_at: Option<f64>,
    }

    impl Sliding {
        fn new(offset: fn(f64) -> Option<f64>) -> Self {
            Self {
                live: 0,
                created: 0,
                offset,
                fail_at: None,
            }
        }
    }

    impl FieldHost for Sliding {
        type Field = f64;
        fn add_field(&mut self, request: &FieldRequest) -> Result<f64, HostError> {
            self.live += 1;
            self.created += 1;
            Ok(request.geometry.gantry_angle)
        }
        fn remove_field(&mut self, _field: f64) -> Result<(), HostError> {
            self.live -= 1;
            Ok(())
        }
        fn structure_outline(
            &mut self,
            field: &f64,
            structure: &str,
            _projected: bool,
        ) -> Result<Option<PolygonSet>, HostError> {
            if self.fail_at == Some(*field) {
                return Err(HostError::Outline(structure.to_string()));
            }
            match structure {
                "target" => Ok(Some(PolygonSet::rect(0.0, 0.0, 20.0, 20.0))),
                _ => Ok((self.offset)(*field).map(|d| PolygonSet::rect(d, 0.0, d + 20.0, 20.0))),
            }
        }
    }

    fn run(host: &mut Sliding, side: Laterality) -> Result<GantrySearch, PlanError> {
        search_gantry_angle(
            host,
            &MachineParams::default(),
            &BeamGeometry::default(),
            "target",
            "avoid",
            side,
            &GantryCfg::default(),
        )
    }

    #[test]
    fn finds_unique_minimum() {
        let mut host = Sliding::new(|g| Some(19.0 - 0.25 * (g - 47.0).abs()));
        let res = run(&mut host, Laterality::Right).unwrap();
        assert_eq!(res.angle, 47.0);
        assert_eq!(res.outcome, SearchOutcome::Found);
        assert!((res.overlap_mm2.unwrap() - 20.0).abs() < 1e-6);
        assert_eq!(res.scanned.len(), 40);
        assert_eq!(host.live, 0);
        assert_eq!(host.created, 40);
    }

    #[test]
    fn finds_disjoint_angle_on_left() {
        let mut host = Sliding::new(|g| Some(if g == 312.0 { 25.0 } else { 10.0 }));
        let res = run(&mut host, Laterality::Left).unwrap();
        assert_eq!(res.angle, 312.0);
        assert_eq!(res.overlap_mm2, Some(0.0));
    }

    #[test]
    fn ties_keep_earliest_angle() {
        let mut host = Sliding::new(|g| Some(if g >= 50.0 { 30.0 } else { 5.0 }));
        let res = run(&mut host, Laterality::Right).unwrap();
        assert_eq!(res.angle, 50.0);
    }

    #[test]
    fn missing_outlines_skip_angles_and_clean_up() {
        let mut host = Sliding::new(|g| if g < 60.0 { None } else { Some(70.0 - g) });
        let res = run(&mut host, Laterality::Right).unwrap();
        // Offset shrinks as the angle grows, so the first valid angle overlaps least.
        assert_eq!(res.angle, 60.0);
        assert_eq!(res.scanned.iter().filter(|(_, o)| o.is_none()).count(), 30);
        assert_eq!(host.live, 0);
    }

    #[test]
    fn falls_back_to_range_start() {
        let mut host = Sliding::new(|_| None);
        let res = run(&mut host, Laterality::Left).unwrap();
        assert_eq!(res.angle, 290.0);
        assert_eq!(res.outcome, SearchOutcome::Fallback);
        assert_eq!(res.overlap_mm2, None);
        assert_eq!(host.live, 0);
        assert_eq!(host.created, 40);
    }

    #[test]
    fn outline_failure_propagates_without_leaking() {
        let mut host = Sliding::new(|_| Some(5.0));
        host.fail_at = Some(35.0);
        let err = run(&mut host, Laterality::Right).unwrap_err();
        assert!(matches!(err, PlanError::Host(HostError::Outline(_))));
        assert_eq!(host.live, 0);
        assert_eq!(host.created, 6);
    }
}
