//! SMPTE ST 2084 Perceptual Quantizer.
//!
//! Linear values here are relative to the 10000 cd/m2 PQ peak, so both the
//! encoded and the linear side live in [0, 1]. Use [`L_MAX`] to convert to
//! absolute luminance.
//!
//! # Reference
//!
//! SMPTE ST 2084:2014

/// Peak luminance in cd/m2 represented by linear 1.0.
pub const L_MAX: f32 = 10000.0;

const M1: f32 = 2610.0 / 16384.0;
const M2: f32 = 2523.0 / 4096.0 * 128.0;
const C1: f32 = 3424.0 / 4096.0;
const C2: f32 = 2413.0 / 4096.0 * 32.0;
const C3: f32 = 2392.0 / 4096.0 * 32.0;

/// Decodes a PQ signal to relative linear light.
///
/// # Example
///
/// ```rust
/// use restore_transfer::pq::{eotf, L_MAX};
///
/// // Reference white, 100 cd/m2
/// let nits = eotf(0.508) * L_MAX;
/// assert!((nits - 100.0).abs() < 1.0);
/// ```
#[inline]
pub fn eotf(v: f32) -> f32 {
    if v <= 0.0 {
        return 0.0;
    }

    let vp = v.powf(1.0 / M2);
    let num = (vp - C1).max(0.0);
    let den = C2 - C3 * vp;

    (num / den).powf(1.0 / M1)
}

/// Encodes relative linear light to a PQ signal.
#[inline]
pub fn oetf(l: f32) -> f32 {
    if l <= 0.0 {
        return 0.0;
    }

    let yp = l.min(1.0).powf(M1);
    ((C1 + C2 * yp) / (1.0 + C3 * yp)).powf(M2)
}
