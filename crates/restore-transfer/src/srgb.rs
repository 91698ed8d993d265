//! IEC 61966-2-1 (sRGB) transfer curve.
//!
//! Piecewise: a linear toe near black joined to a 2.4 power segment.
//! This is the curve `restore-io` tags decoded PNG/JPEG rasters with.
//!
//! # Reference
//!
//! IEC 61966-2-1:1999

const K0: f32 = 0.04045;
const PHI: f32 = 12.92;
const ALPHA: f32 = 0.055;
const GAMMA: f32 = 2.4;

/// Decodes an sRGB encoded value to linear light.
///
/// # Formula
///
/// ```text
/// V <= 0.04045: L = V / 12.92
/// otherwise:    L = ((V + 0.055) / 1.055)^2.4
/// ```
///
/// # Example
///
/// ```rust
/// use restore_transfer::srgb::eotf;
///
/// assert!((eotf(0.5) - 0.214).abs() < 0.01);
/// ```
#[inline]
pub fn eotf(v: f32) -> f32 {
    if v <= K0 {
        v / PHI
    } else {
        ((v + ALPHA) / (1.0 + ALPHA)).powf(GAMMA)
    }
}

/// Encodes linear light with the sRGB curve.
#[inline]
pub fn oetf(l: f32) -> f32 {
    if l <= K0 / PHI {
        l * PHI
    } else {
        (1.0 + ALPHA) * l.powf(1.0 / GAMMA) - ALPHA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for i in 0..=100 {
            let v = i as f32 / 100.0;
            let back = oetf(eotf(v));
            assert!((v - back).abs() < 1e-5, "v={}, back={}", v, back);
        }
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(eotf(0.0), 0.0);
        assert!((eotf(1.0) - 1.0).abs() < 1e-6);
        assert_eq!(oetf(0.0), 0.0);
        assert!((oetf(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_toe_is_linear() {
        assert!((eotf(0.02) - 0.02 / 12.92).abs() < 1e-9);
    }
}
