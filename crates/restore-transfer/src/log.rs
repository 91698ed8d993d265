//! Logarithmic transfer curves from H.273.
//!
//! - Log100: 100:1 range, `V = 1 + log10(L) / 2`
//! - Log316: 316.22777:1 range, `V = 1 + log10(L) / 2.5`
//!
//! Linear values below the range floor encode to 0.

const LOG100_FLOOR: f32 = 0.01;
const LOG316_FLOOR: f32 = 0.003_162_277_7;

/// Log100 encode.
#[inline]
pub fn log100_oetf(l: f32) -> f32 {
    if l < LOG100_FLOOR { 0.0 } else { 1.0 + l.log10() / 2.0 }
}

/// Log100 decode. Encoded 0 maps to the range floor.
#[inline]
pub fn log100_eotf(v: f32) -> f32 {
    10f32.powf((v - 1.0) * 2.0)
}

/// Log316 encode.
#[inline]
pub fn log316_oetf(l: f32) -> f32 {
    if l < LOG316_FLOOR { 0.0 } else { 1.0 + l.log10() / 2.5 }
}

/// Log316 decode. Encoded 0 maps to the range floor.
#[inline]
pub fn log316_eotf(v: f32) -> f32 {
    10f32.powf((v - 1.0) * 2.5)
}
