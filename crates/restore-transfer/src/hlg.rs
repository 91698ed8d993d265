//! ARIB STD-B67 Hybrid Log-Gamma.
//!
//! Square-root segment for shadows, logarithmic segment for highlights.
//! Linear side is scene-relative [0, 1].
//!
//! # Reference
//!
//! ITU-R BT.2100-2

const A: f32 = 0.178_832_77;
const B: f32 = 0.284_668_92; // 1 - 4*A
const C: f32 = 0.559_910_7; // 0.5 - A*ln(4*A)

/// Encodes scene light to an HLG signal.
#[inline]
pub fn oetf(e: f32) -> f32 {
    if e <= 0.0 {
        0.0
    } else if e <= 1.0 / 12.0 {
        (3.0 * e).sqrt()
    } else {
        A * (12.0 * e - B).ln() + C
    }
}

/// Decodes an HLG signal to scene light.
#[inline]
pub fn eotf(ep: f32) -> f32 {
    if ep <= 0.0 {
        0.0
    } else if ep <= 0.5 {
        ep * ep / 3.0
    } else {
        (((ep - C) / A).exp() + B) / 12.0
    }
}
