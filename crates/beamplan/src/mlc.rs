//! Millennium 120 multi-leaf collimator: open-field leaf positions.
//!
//! Only the open (jaw-defined) field is produced; conformal leaf shaping is
//! not modelled.

use crate::geometry::RectAperture;

/// Number of opposed leaf pairs.
pub const LEAF_PAIRS: usize = 60;

/// Leaf edges along Y at isocenter (mm): row 0 lower edge, row 1 upper edge.
/// 10 mm outer leaves, 5 mm central leaves over [-100, 100].
pub const LEAF_BOUNDARIES: [[f64; LEAF_PAIRS]; 2] = [
    [
        -200.0, -190.0, -180.0, -170.0, -160.0, -150.0, -140.0, -130.0, -120.0, -110.0, -100.0,
        -95.0, -90.0, -85.0, -80.0, -75.0, -70.0, -65.0, -60.0, -55.0, -50.0, -45.0, -40.0, -35.0,
        -30.0, -25.0, -20.0, -15.0, -10.0, -5.0, 0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0,
        40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0, 100.0, 110.0,
        120.0, 130.0, 140.0, 150.0, 160.0, 170.0, 180.0, 190.0,
    ],
    [
        -190.0, -180.0, -170.0, -160.0, -150.0, -140.0, -130.0, -120.0, -110.0, -100.0, -95.0,
        -90.0, -85.0, -80.0, -75.0, -70.0, -65.0, -60.0, -55.0, -50.0, -45.0, -40.0, -35.0, -30.0,
        -25.0, -20.0, -15.0, -10.0, -5.0, 0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0,
        45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0, 100.0, 110.0, 120.0,
        130.0, 140.0, 150.0, 160.0, 170.0, 180.0, 190.0, 200.0,
    ],
];

/// Leaf bank positions along X at isocenter (mm). Bank A ≤ bank B.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeafPositions {
    pub bank_a: [f32; LEAF_PAIRS],
    pub bank_b: [f32; LEAF_PAIRS],
}

impl LeafPositions {
    /// Leaf pair indices whose Y span overlaps the open interval `(y_lo, y_hi)`.
    pub fn pairs_within(y_lo: f64, y_hi: f64) -> impl Iterator<Item = usize> {
        (0..LEAF_PAIRS)
            .filter(move |&i| LEAF_BOUNDARIES[1][i] > y_lo && LEAF_BOUNDARIES[0][i] < y_hi)
    }
}

/// Open every leaf pair to the jaw X edges, whatever their corner order.
pub fn open_to_field(jaws: &RectAperture) -> LeafPositions {
    let (x_lo, x_hi) = jaws.x_range();
    LeafPositions {
        bank_a: [x_lo as f32; LEAF_PAIRS],
        bank_b: [x_hi as f32; LEAF_PAIRS],
    }
}
