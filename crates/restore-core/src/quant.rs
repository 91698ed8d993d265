//! Quantization descriptors for integer and float planes.
//!
//! A [`Quantization`] fixes how integer samples map to a normalized float
//! domain:
//!
//! ```text
//! fl = (d - neutral) / (ceil - floor)
//! d  = fl * (ceil - floor) + neutral      (rounded half up)
//! ```
//!
//! Luma and RGB planes have `neutral == floor` and normalize to `[0, 1]`.
//! Chroma planes have `floor < neutral` and normalize to about `[-0.5, 0.5]`.
//! Full-range chroma has an odd `floor + ceil`, so its neutral sits half a
//! code off center; it uses a clipped mapping that keeps the round trip exact.

use serde::{Deserialize, Serialize};

use crate::color::{QuantRange, TransferChar};
use crate::error::{Error, Result};

/// Integer sample type of [`crate::Plane`].
pub type Sample = u32;

/// Highest supported bit depth.
pub const MAX_BIT_DEPTH: u8 = 24;

/// Quantization parameters of an integer plane.
///
/// Immutable once built: every constructor checks
/// `floor <= neutral <= ceil <= 2^bit_depth - 1` and `1 <= bit_depth <= 24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "QuantizationRepr")]
pub struct Quantization {
    bit_depth: u8,
    floor: Sample,
    neutral: Sample,
    ceil: Sample,
    transfer: TransferChar,
}

/// Unchecked serialized form, validated through [`Quantization::new`].
#[derive(Deserialize)]
struct QuantizationRepr {
    bit_depth: u8,
    floor: Sample,
    neutral: Sample,
    ceil: Sample,
    transfer: TransferChar,
}

impl TryFrom<QuantizationRepr> for Quantization {
    type Error = Error;

    fn try_from(r: QuantizationRepr) -> Result<Self> {
        Self::new(r.bit_depth, r.floor, r.neutral, r.ceil, r.transfer)
    }
}

impl Quantization {
    /// Builds a descriptor from explicit parameters.
    pub fn new(
        bit_depth: u8,
        floor: Sample,
        neutral: Sample,
        ceil: Sample,
        transfer: TransferChar,
    ) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidQuantization {
            bit_depth,
            floor,
            neutral,
            ceil,
            reason: reason.to_string(),
        };

        if bit_depth == 0 || bit_depth > MAX_BIT_DEPTH {
            return Err(invalid("bit depth must be within 1..=24"));
        }
        if floor > neutral || neutral > ceil {
            return Err(invalid("requires floor <= neutral <= ceil"));
        }
        if ceil > max_value(bit_depth) {
            return Err(invalid("ceil exceeds the bit depth"));
        }

        Ok(Self {
            bit_depth,
            floor,
            neutral,
            ceil,
            transfer,
        })
    }

    /// Conventional parameters for a luma or chroma plane.
    ///
    /// Full range spans `[0, 2^b - 1]` with chroma neutral at `2^(b-1)`.
    /// Limited range scales the 8-bit `16..235` (luma) and `16..240`
    /// (chroma) levels and needs at least 8 bits.
    pub fn standard(
        bit_depth: u8,
        chroma: bool,
        range: QuantRange,
        transfer: TransferChar,
    ) -> Result<Self> {
        if bit_depth == 0 || bit_depth > MAX_BIT_DEPTH {
            return Err(Error::InvalidQuantization {
                bit_depth,
                floor: 0,
                neutral: 0,
                ceil: 0,
                reason: "bit depth must be within 1..=24".into(),
            });
        }

        match range {
            QuantRange::Pc => {
                let ceil = max_value(bit_depth);
                let neutral = if chroma { 1 << (bit_depth - 1) } else { 0 };
                Self::new(bit_depth, 0, neutral, ceil, transfer)
            }
            QuantRange::Tv => {
                if bit_depth < 8 {
                    return Err(Error::InvalidQuantization {
                        bit_depth,
                        floor: 0,
                        neutral: 0,
                        ceil: 0,
                        reason: "limited range needs at least 8 bits".into(),
                    });
                }
                let shift = bit_depth - 8;
                let floor = 16 << shift;
                if chroma {
                    Self::new(bit_depth, floor, 128 << shift, 240 << shift, transfer)
                } else {
                    Self::new(bit_depth, floor, floor, 235 << shift, transfer)
                }
            }
        }
    }

    /// Full-range luma descriptor.
    pub fn full(bit_depth: u8, transfer: TransferChar) -> Result<Self> {
        Self::standard(bit_depth, false, QuantRange::Pc, transfer)
    }

    /// Same parameters under a different transfer characteristic.
    #[inline]
    pub fn with_transfer(self, transfer: TransferChar) -> Self {
        Self { transfer, ..self }
    }

    /// Bits per sample.
    #[inline]
    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    /// Lower clamp bound.
    #[inline]
    pub fn floor(&self) -> Sample {
        self.floor
    }

    /// Zero point.
    #[inline]
    pub fn neutral(&self) -> Sample {
        self.neutral
    }

    /// Upper clamp bound.
    #[inline]
    pub fn ceil(&self) -> Sample {
        self.ceil
    }

    /// Transfer characteristic of the samples.
    #[inline]
    pub fn transfer(&self) -> TransferChar {
        self.transfer
    }

    /// `ceil - floor`. Zero for a degenerate plane.
    #[inline]
    pub fn value_range(&self) -> Sample {
        self.ceil - self.floor
    }

    /// Largest value representable at this bit depth.
    #[inline]
    pub fn max_value(&self) -> Sample {
        max_value(self.bit_depth)
    }

    /// `true` when the plane is signed around a neutral above floor.
    #[inline]
    pub fn is_chroma(&self) -> bool {
        self.floor < self.neutral
    }

    /// Full-range chroma, where `floor + ceil` is odd.
    #[inline]
    pub fn is_pc_chroma(&self) -> bool {
        self.is_chroma() && (self.floor + self.ceil) % 2 == 1
    }

    /// Range of the matching float domain.
    pub fn float_range(&self) -> FloatRange {
        if self.is_chroma() {
            FloatRange::chroma(self.transfer)
        } else {
            FloatRange::unit(self.transfer)
        }
    }

    /// Normalizes an integer sample.
    #[inline]
    pub fn get_fl(&self, d: Sample) -> f32 {
        let range = self.value_range();
        if range == 0 {
            return 0.0;
        }
        let fl = (d as f32 - self.neutral as f32) / range as f32;
        if self.is_pc_chroma() {
            fl.clamp(-0.5, 0.5)
        } else {
            fl
        }
    }

    /// Maps a normalized value back to an integer sample, rounding half up.
    ///
    /// Negative results saturate at 0. No clamping to `[floor, ceil]`;
    /// use [`Quantization::quantize`] on the scaled value for that.
    #[inline]
    pub fn get_d(&self, fl: f32) -> Sample {
        let half = if self.is_pc_chroma() { 0.499_999 } else { 0.5 };
        (fl * self.value_range() as f32 + self.neutral as f32 + half) as Sample
    }

    /// Rounds to nearest and clamps to `[floor, ceil]`.
    #[inline]
    pub fn quantize(&self, x: f32) -> Sample {
        if x <= self.floor as f32 {
            self.floor
        } else if x >= self.ceil as f32 {
            self.ceil
        } else {
            (x + 0.5) as Sample
        }
    }
}

impl Default for Quantization {
    /// 16-bit full-range luma, BT.709 transfer.
    fn default() -> Self {
        Self {
            bit_depth: 16,
            floor: 0,
            neutral: 0,
            ceil: 65535,
            transfer: TransferChar::Bt709,
        }
    }
}

/// Largest value of a `bit_depth`-bit sample.
#[inline]
pub fn max_value(bit_depth: u8) -> Sample {
    ((1u64 << bit_depth) - 1) as Sample
}

/// Value range of a float plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    /// Lower clamp bound
    pub floor: f32,
    /// Zero point
    pub neutral: f32,
    /// Upper clamp bound
    pub ceil: f32,
    /// Transfer characteristic of the samples
    pub transfer: TransferChar,
}

impl FloatRange {
    /// `[0, 1]`, neutral 0.
    pub fn unit(transfer: TransferChar) -> Self {
        Self {
            floor: 0.0,
            neutral: 0.0,
            ceil: 1.0,
            transfer,
        }
    }

    /// `[-0.5, 0.5]`, neutral 0.
    pub fn chroma(transfer: TransferChar) -> Self {
        Self {
            floor: -0.5,
            neutral: 0.0,
            ceil: 0.5,
            transfer,
        }
    }

    /// `ceil - floor`.
    #[inline]
    pub fn value_range(&self) -> f32 {
        self.ceil - self.floor
    }

    /// `true` for a signed range.
    #[inline]
    pub fn is_chroma(&self) -> bool {
        self.floor < self.neutral
    }

    /// Clamps to `[floor, ceil]` without rounding.
    #[inline]
    pub fn quantize(&self, x: f32) -> f32 {
        x.clamp(self.floor, self.ceil)
    }

    /// Same range under a different transfer characteristic.
    #[inline]
    pub fn with_transfer(self, transfer: TransferChar) -> Self {
        Self { transfer, ..self }
    }
}

impl Default for FloatRange {
    fn default() -> Self {
        Self::unit(TransferChar::Bt709)
    }
}
