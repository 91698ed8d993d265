//! Pure power-law transfer curves.
//!
//! - 2.2: BT.470 System M
//! - 2.8: BT.470 System B, G
//!
//! Negative inputs map to 0.

/// Decodes with an arbitrary gamma: `v^gamma`.
///
/// # Example
///
/// ```rust
/// use restore_transfer::gamma::gamma_eotf;
///
/// let linear = gamma_eotf(0.5, 2.2);
/// assert!((linear - 0.2176).abs() < 1e-3);
/// ```
#[inline]
pub fn gamma_eotf(v: f32, gamma: f32) -> f32 {
    if v <= 0.0 { 0.0 } else { v.powf(gamma) }
}

/// Encodes with an arbitrary gamma: `l^(1/gamma)`.
#[inline]
pub fn gamma_oetf(l: f32, gamma: f32) -> f32 {
    if l <= 0.0 { 0.0 } else { l.powf(1.0 / gamma) }
}

/// BT.470 M decode (gamma 2.2).
#[inline]
pub fn eotf_22(v: f32) -> f32 {
    gamma_eotf(v, 2.2)
}

/// BT.470 M encode (gamma 2.2).
#[inline]
pub fn oetf_22(l: f32) -> f32 {
    gamma_oetf(l, 2.2)
}

/// BT.470 BG decode (gamma 2.8).
#[inline]
pub fn eotf_28(v: f32) -> f32 {
    gamma_eotf(v, 2.8)
}

/// BT.470 BG encode (gamma 2.8).
#[inline]
pub fn oetf_28(l: f32) -> f32 {
    gamma_oetf(l, 2.8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_22() {
        for i in 0..=50 {
            let v = i as f32 / 50.0;
            assert!((oetf_22(eotf_22(v)) - v).abs() < 1e-5);
        }
    }

    #[test]
    fn test_roundtrip_28() {
        for i in 0..=50 {
            let v = i as f32 / 50.0;
            assert!((oetf_28(eotf_28(v)) - v).abs() < 1e-4);
        }
    }

    #[test]
    fn test_negative_clamps() {
        assert_eq!(gamma_eotf(-0.5, 2.2), 0.0);
        assert_eq!(gamma_oetf(-0.5, 2.2), 0.0);
    }
}
