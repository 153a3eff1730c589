//! Boolean overlay, offset and simplification on `IntPolygonSet`.
//!
//! All fills are even-odd. Contours are handed to `i_overlay` as float
//! subunit coordinates; since every input vertex lies on the integer grid the
//! overlay sees exact values. Areas are measured with `geo`.

use geo::{Area, Coord, LineString, Polygon as GeoPolygon, Simplify};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use i_overlay::mesh::outline::offset::OutlineOffset;
use i_overlay::mesh::style::{LineJoin, OutlineStyle};

use super::cfg::{CLEAN_TOLERANCE_MM, ROUND_JOIN_STEP_RAD, SCALE};
use super::types::IntPolygonSet;

/// Overlay output: shapes, each an outer contour followed by its holes.
type Shapes = Vec<Vec<Vec<[f64; 2]>>>;

fn line_string(contour: &[[f64; 2]]) -> LineString<f64> {
    contour.iter().map(|&[x, y]| Coord { x, y }).collect()
}

/// Sum of the absolute areas of every contour in `shapes`, in subunits².
/// Holes count positively alongside their outer contour.
fn contour_area_sum(shapes: &Shapes) -> f64 {
    shapes
        .iter()
        .flatten()
        .map(|c| GeoPolygon::new(line_string(c), vec![]).unsigned_area())
        .sum()
}

/// Area of overlay shapes in subunits², holes subtracted from their outer contour.
fn shapes_area(shapes: &Shapes) -> f64 {
    shapes
        .iter()
        .filter_map(|shape| {
            let (outer, holes) = shape.split_first()?;
            let poly = GeoPolygon::new(
                line_string(outer),
                holes.iter().map(|h| line_string(h)).collect(),
            );
            Some(poly.unsigned_area())
        })
        .sum()
}

/// Resolve an even-odd contour soup into oriented shapes (outer + holes).
fn resolve(set: &IntPolygonSet) -> Shapes {
    let none: Vec<Vec<[f64; 2]>> = Vec::new();
    set.as_subunit_contours()
        .overlay(&none, OverlayRule::Subject, FillRule::EvenOdd)
}

fn overlay(a: &IntPolygonSet, b: &IntPolygonSet, rule: OverlayRule) -> Shapes {
    a.as_subunit_contours()
        .overlay(&b.as_subunit_contours(), rule, FillRule::EvenOdd)
}

/// Area enclosed by `set` under even-odd fill, in mm².
pub fn area_mm(set: &IntPolygonSet) -> f64 {
    if set.is_empty() {
        return 0.0;
    }
    shapes_area(&resolve(set)) / (SCALE * SCALE)
}

/// Drop vertices that deviate less than `tolerance_mm` from the simplified
/// outline (Ramer–Douglas–Peucker on each closed contour). Lossy.
pub fn simplify_mm(set: &IntPolygonSet, tolerance_mm: f64) -> IntPolygonSet {
    let eps = tolerance_mm * SCALE;
    IntPolygonSet::from_subunits(set.as_subunit_contours().iter().map(|c| {
        let closed = GeoPolygon::new(line_string(c), vec![]).simplify(&eps);
        let mut pts: Vec<[f64; 2]> = closed.exterior().coords().map(|p| [p.x, p.y]).collect();
        // Drop the repeated closing vertex.
        pts.pop();
        pts
    }))
}

/// Intersection area of `a` and `b` in mm²: the absolute areas of every
/// contour of the even-odd intersection, summed. A hole inside the
/// intersection adds its area rather than subtracting it, so this differs
/// from `area_mm(&intersect(a, b))` whenever the intersection has holes.
///
/// Returns exactly 0.0 if either set is empty or the intersection is empty.
/// With `clean`, both sets are first simplified at `CLEAN_TOLERANCE_MM`, which
/// can shift the result slightly near thin features.
pub fn overlap_area_mm(a: &IntPolygonSet, b: &IntPolygonSet, clean: bool) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let cleaned;
    let (a, b) = if clean {
        cleaned = (
            simplify_mm(a, CLEAN_TOLERANCE_MM),
            simplify_mm(b, CLEAN_TOLERANCE_MM),
        );
        (&cleaned.0, &cleaned.1)
    } else {
        (a, b)
    };
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shapes = overlay(a, b, OverlayRule::Intersect);
    if shapes.is_empty() {
        return 0.0;
    }
    contour_area_sum(&shapes) / (SCALE * SCALE)
}

/// Even-odd intersection of `a` and `b`.
pub fn intersect(a: &IntPolygonSet, b: &IntPolygonSet) -> IntPolygonSet {
    if a.is_empty() || b.is_empty() {
        return IntPolygonSet::default();
    }
    let shapes = overlay(a, b, OverlayRule::Intersect);
    IntPolygonSet::from_subunits(shapes.into_iter().flatten())
}

/// Offset `set` outward by `mm_delta` (inward when negative) with round joins.
pub fn inflate(set: &IntPolygonSet, mm_delta: f64) -> IntPolygonSet {
    if set.is_empty() {
        return IntPolygonSet::default();
    }
    let style =
        OutlineStyle::new(mm_delta * SCALE).line_join(LineJoin::Round(ROUND_JOIN_STEP_RAD));
    let shapes = resolve(set).outline(style);
    IntPolygonSet::from_subunits(shapes.into_iter().flatten())
}

/// Band added by `inflate(set, mm_delta)`: inflated region minus `set`.
pub fn ring(set: &IntPolygonSet, mm_delta: f64) -> IntPolygonSet {
    let grown = inflate(set, mm_delta);
    if grown.is_empty() {
        return grown;
    }
    let shapes = overlay(&grown, set, OverlayRule::Difference);
    IntPolygonSet::from_subunits(shapes.into_iter().flatten())
}
