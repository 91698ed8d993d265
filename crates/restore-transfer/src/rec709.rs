//! BT.709 camera transfer curve.
//!
//! BT.601 (SMPTE 170M) and BT.2020 share the same OETF, so one module
//! serves all three characteristics. The inverse here is the exact inverse
//! of the OETF, not the BT.1886 display EOTF.
//!
//! # Reference
//!
//! ITU-R BT.709-6, ITU-R BT.2020-2

const ALPHA: f32 = 1.099_296_8;
const BETA: f32 = 0.018_053_97;
const POWER: f32 = 0.45;
const SLOPE: f32 = 4.5;

/// Encodes linear light with the BT.709 curve.
///
/// # Formula
///
/// ```text
/// L < beta:  V = 4.5 * L
/// otherwise: V = alpha * L^0.45 - (alpha - 1)
/// ```
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
