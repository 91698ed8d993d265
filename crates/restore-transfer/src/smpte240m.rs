//! SMPTE 240M transfer curve.
//!
//! Same shape as BT.709 with different constants.

const ALPHA: f32 = 1.1115;
const BETA: f32 = 0.0228;
const POWER: f32 = 0.45;
const SLOPE: f32 = 4.0;

/// Encodes linear light with the SMPTE 240M curve.
#[inline]
pub fn oetf(l: f32) -> f32 {
    if l < BETA {
        SLOPE * l
    } else {
        ALPHA * l.powf(POWER) - (ALPHA - 1.0)
    }
}

/// Inverse of [`oetf`].
#[inline]
pub fn eotf(v: f32) -> f32 {
    if v < SLOPE * BETA {
        v / SLOPE
    } else {
        ((v + (ALPHA - 1.0)) / ALPHA).powf(1.0 / POWER)
    }
}
