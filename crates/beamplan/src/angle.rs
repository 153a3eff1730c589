//! Angle normalization helpers (degrees).
//!
//! - `normalize_360`: any angle into [0, 360).
//! - `normalize_180`: any angle into [0, 180); axes are undirected.
//! - `fold_to_45`: any angle into [-45, 45); rectangular apertures repeat every 90°.
//!
//! All three are total on finite input and idempotent on their own output.

/// Map `a` into [0, 360).
#[inline]
pub fn normalize_360(a: f64) -> f64 {
    let r = a.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to the modulus itself.
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Map `a` into [0, 180).
#[inline]
pub fn normalize_180(a: f64) -> f64 {
    let a = normalize_360(a);
    if a >= 180.0 {
        a - 180.0
    } else {
        a
    }
}

/// Map `a` into [-45, 45).
///
/// Reducing modulo 90 directly is equivalent to `normalize_360` followed by
/// the modulo-90 fold, since 360 is a multiple of 90.
#[inline]
pub fn fold_to_45(a: f64) -> f64 {
    let r = (a + 45.0).rem_euclid(90.0);
    let r = if r >= 90.0 { 0.0 } else { r };
    r - 45.0
}

/// Reduce `a` into [0, 90).
#[inline]
pub fn reduce_90(a: f64) -> f64 {
    let r = a.rem_euclid(90.0);
    if r >= 90.0 {
        0.0
    } else {
        r
    }
}
