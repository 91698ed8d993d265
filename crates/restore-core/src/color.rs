//! Color metadata carried by planes and frames.
//!
//! The enums follow ITU-T H.273 naming: a frame records its pixel layout,
//! chroma siting, primaries, transfer characteristic and YUV matrix, and
//! every plane records the transfer characteristic its samples are
//! encoded under.
//!
//! Only two of these drive computation:
//! - [`TransferChar`] - decoding/encoding through `restore-transfer`
//! - [`ColorMatrix`] - luma coefficients for [`crate::Plane::y_from`]
//!
//! The rest is descriptive and round-trips through frames unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

use restore_transfer::{gamma, hlg, log, pq, rec709, smpte240m, srgb};

/// Named channel of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Red
    R,
    /// Green
    G,
    /// Blue
    B,
    /// Luma
    Y,
    /// Blue-difference chroma
    U,
    /// Red-difference chroma
    V,
    /// Alpha
    A,
}

impl Channel {
    /// Chroma channels are signed around a neutral value.
    #[inline]
    pub fn is_chroma(self) -> bool {
        matches!(self, Channel::U | Channel::V)
    }
}

/// Which planes a frame holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PixelType {
    /// Luma only
    Y,
    /// Single U plane
    U,
    /// Single V plane
    V,
    /// YUV, no subsampling
    Yuv444,
    /// YUV, chroma halved horizontally
    Yuv422,
    /// YUV, chroma halved in both directions
    Yuv420,
    /// YUV, chroma quartered horizontally
    Yuv411,
    /// Single red plane
    R,
    /// Single green plane
    G,
    /// Single blue plane
    B,
    /// Full RGB triple
    #[default]
    Rgb,
}

impl PixelType {
    /// Channels present, in plane order.
    pub fn channels(self) -> &'static [Channel] {
        match self {
            PixelType::Y => &[Channel::Y],
            PixelType::U => &[Channel::U],
            PixelType::V => &[Channel::V],
            PixelType::Yuv444 | PixelType::Yuv422 | PixelType::Yuv420 | PixelType::Yuv411 => {
                &[Channel::Y, Channel::U, Channel::V]
            }
            PixelType::R => &[Channel::R],
            PixelType::G => &[Channel::G],
            PixelType::B => &[Channel::B],
            PixelType::Rgb => &[Channel::R, Channel::G, Channel::B],
        }
    }

    /// `true` for the YUV family, including the single Y/U/V planes.
    #[inline]
    pub fn is_yuv(self) -> bool {
        matches!(
            self,
            PixelType::Y
                | PixelType::U
                | PixelType::V
                | PixelType::Yuv444
                | PixelType::Yuv422
                | PixelType::Yuv420
                | PixelType::Yuv411
        )
    }

    /// `true` for the RGB family, including the single R/G/B planes.
    #[inline]
    pub fn is_rgb(self) -> bool {
        !self.is_yuv()
    }

    /// Horizontal and vertical chroma subsampling as right shifts.
    #[inline]
    pub fn chroma_shift(self) -> (u32, u32) {
        match self {
            PixelType::Yuv422 => (1, 0),
            PixelType::Yuv420 => (1, 1),
            PixelType::Yuv411 => (2, 0),
            _ => (0, 0),
        }
    }

    /// Geometry of a plane for `channel` in a `width x height` frame.
    ///
    /// Chroma dimensions round up, so odd sizes keep their last column/row.
    pub fn plane_size(self, channel: Channel, width: usize, height: usize) -> (usize, usize) {
        if !channel.is_chroma() {
            return (width, height);
        }
        let (sw, sh) = self.chroma_shift();
        (
            (width + (1 << sw) - 1) >> sw,
            (height + (1 << sh) - 1) >> sh,
        )
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelType::Y => "Y",
            PixelType::U => "U",
            PixelType::V => "V",
            PixelType::Yuv444 => "YUV444",
            PixelType::Yuv422 => "YUV422",
            PixelType::Yuv420 => "YUV420",
            PixelType::Yuv411 => "YUV411",
            PixelType::R => "R",
            PixelType::G => "G",
            PixelType::B => "B",
            PixelType::Rgb => "RGB",
        };
        f.write_str(name)
    }
}

/// Siting of subsampled chroma relative to luma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChromaPlacement {
    /// Centered between luma samples
    Mpeg1,
    /// Co-sited horizontally, centered vertically
    #[default]
    Mpeg2,
    /// DV 4:2:0 siting
    Dv,
}

/// Quantization range convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuantRange {
    /// Limited ("studio") range: 16-235 luma, 16-240 chroma at 8 bits
    Tv,
    /// Full range
    #[default]
    Pc,
}

/// Color primaries (H.273 `ColourPrimaries`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorPrim {
    /// ITU-R BT.709 / sRGB
    #[default]
    Bt709,
    /// Unknown
    Unspecified,
    /// ITU-R BT.470 System M
    Bt470M,
    /// ITU-R BT.470 System B, G / BT.601 625
    Bt470Bg,
    /// SMPTE 170M / BT.601 525
    Smpte170M,
    /// SMPTE 240M
    Smpte240M,
    /// Generic film (illuminant C)
    Film,
    /// ITU-R BT.2020
    Bt2020,
    /// SMPTE ST 428-1 (CIE XYZ)
    St428,
    /// SMPTE RP 431-2 (DCI-P3)
    DciP3,
    /// SMPTE EG 432-1 (Display P3)
    DisplayP3,
}

/// Transfer characteristic (H.273 `TransferCharacteristics`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferChar {
    /// ITU-R BT.709
    #[default]
    Bt709,
    /// Unknown, treated as BT.709
    Unspecified,
    /// ITU-R BT.470 System M, gamma 2.2
    Bt470M,
    /// ITU-R BT.470 System B, G, gamma 2.8
    Bt470Bg,
    /// SMPTE 170M (BT.601)
    Smpte170M,
    /// SMPTE 240M
    Smpte240M,
    /// Linear light
    Linear,
    /// Logarithmic, 100:1
    Log100,
    /// Logarithmic, 316.22777:1
    Log316,
    /// IEC 61966-2-1 (sRGB)
    Srgb,
    /// ITU-R BT.2020, 10 bit
    Bt2020Bit10,
    /// ITU-R BT.2020, 12 bit
    Bt2020Bit12,
    /// SMPTE ST 2084 (PQ)
    St2084,
    /// ARIB STD-B67 (HLG)
    AribB67,
}

impl TransferChar {
    /// Decodes a normalized sample to linear light.
    pub fn to_linear(self, v: f32) -> f32 {
        match self {
            TransferChar::Bt709
            | TransferChar::Unspecified
            | TransferChar::Smpte170M
            | TransferChar::Bt2020Bit10
            | TransferChar::Bt2020Bit12 => rec709::eotf(v),
            TransferChar::Bt470M => gamma::eotf_22(v),
            TransferChar::Bt470Bg => gamma::eotf_28(v),
            TransferChar::Smpte240M => smpte240m::eotf(v),
            TransferChar::Linear => v,
            TransferChar::Log100 => log::log100_eotf(v),
            TransferChar::Log316 => log::log316_eotf(v),
            TransferChar::Srgb => srgb::eotf(v),
            TransferChar::St2084 => pq::eotf(v),
            TransferChar::AribB67 => hlg::eotf(v),
        }
    }

    /// Encodes linear light to a normalized sample.
    pub fn from_linear(self, l: f32) -> f32 {
        match self {
            TransferChar::Bt709
            | TransferChar::Unspecified
            | TransferChar::Smpte170M
            | TransferChar::Bt2020Bit10
            | TransferChar::Bt2020Bit12 => rec709::oetf(l),
            TransferChar::Bt470M => gamma::oetf_22(l),
            TransferChar::Bt470Bg => gamma::oetf_28(l),
            TransferChar::Smpte240M => smpte240m::oetf(l),
            TransferChar::Linear => l,
            TransferChar::Log100 => log::log100_oetf(l),
            TransferChar::Log316 => log::log316_oetf(l),
            TransferChar::Srgb => srgb::oetf(l),
            TransferChar::St2084 => pq::oetf(l),
            TransferChar::AribB67 => hlg::oetf(l),
        }
    }

    /// `true` when two characteristics share the same curve.
    pub fn same_curve(self, other: TransferChar) -> bool {
        self.canonical() == other.canonical()
    }

    fn canonical(self) -> TransferChar {
        match self {
            TransferChar::Unspecified
            | TransferChar::Smpte170M
            | TransferChar::Bt2020Bit10
            | TransferChar::Bt2020Bit12 => TransferChar::Bt709,
            other => other,
        }
    }

    /// Re-expresses an encoded sample from `self` to `dst`.
    #[inline]
    pub fn convert(self, v: f32, dst: TransferChar) -> f32 {
        if self.same_curve(dst) {
            v
        } else {
            dst.from_linear(self.to_linear(v))
        }
    }
}

/// YUV matrix coefficients (H.273 `MatrixCoefficients`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMatrix {
    /// Identity, Y carries green
    Gbr,
    /// ITU-R BT.709
    #[default]
    Bt709,
    /// Unknown, treated as BT.709
    Unspecified,
    /// US FCC 73.682
    Fcc,
    /// ITU-R BT.470 System B, G / BT.601 625
    Bt470Bg,
    /// SMPTE 170M / BT.601 525
    Smpte170M,
    /// SMPTE 240M
    Smpte240M,
    /// YCgCo
    YCgCo,
    /// ITU-R BT.2020 non-constant luminance
    Bt2020Ncl,
    /// ITU-R BT.2020 constant luminance
    Bt2020Cl,
}

impl ColorMatrix {
    /// Luma weights `[Kr, Kg, Kb]`, summing to 1.
    pub fn luma_coefficients(self) -> [f32; 3] {
        let (kr, kb) = match self {
            ColorMatrix::Gbr => return [0.0, 1.0, 0.0],
            ColorMatrix::YCgCo => return [0.25, 0.5, 0.25],
            ColorMatrix::Bt709 | ColorMatrix::Unspecified => (0.2126, 0.0722),
            ColorMatrix::Fcc => (0.30, 0.11),
            ColorMatrix::Bt470Bg | ColorMatrix::Smpte170M => (0.299, 0.114),
            ColorMatrix::Smpte240M => (0.212, 0.087),
            ColorMatrix::Bt2020Ncl | ColorMatrix::Bt2020Cl => (0.2627, 0.0593),
        };
        [kr, 1.0 - kr - kb, kb]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_channels_per_pixel_type() {
        assert_eq!(PixelType::Rgb.channels(), &[Channel::R, Channel::G, Channel::B]);
        assert_eq!(PixelType::Yuv420.channels().len(), 3);
        assert_eq!(PixelType::Y.channels(), &[Channel::Y]);
        assert!(PixelType::Yuv411.is_yuv());
        assert!(PixelType::G.is_rgb());
    }

    #[test]
    fn test_chroma_plane_size_rounds_up() {
        assert_eq!(PixelType::Yuv420.plane_size(Channel::U, 5, 3), (3, 2));
        assert_eq!(PixelType::Yuv422.plane_size(Channel::V, 5, 3), (3, 3));
        assert_eq!(PixelType::Yuv411.plane_size(Channel::U, 9, 2), (3, 2));
        assert_eq!(PixelType::Yuv420.plane_size(Channel::Y, 5, 3), (5, 3));
    }

    #[test]
    fn test_luma_coefficients_sum_to_one() {
        for m in [
            ColorMatrix::Bt709,
            ColorMatrix::Fcc,
            ColorMatrix::Bt470Bg,
            ColorMatrix::Smpte240M,
            ColorMatrix::Bt2020Ncl,
            ColorMatrix::YCgCo,
            ColorMatrix::Gbr,
        ] {
            let k = m.luma_coefficients();
            assert_abs_diff_eq!(k[0] + k[1] + k[2], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_transfer_convert_same_curve_is_exact() {
        let v = 0.37;
        assert_eq!(TransferChar::Bt709.convert(v, TransferChar::Bt2020Bit10), v);
        assert_eq!(TransferChar::Srgb.convert(v, TransferChar::Srgb), v);
    }

    #[test]
    fn test_transfer_convert_roundtrip() {
        for i in 0..=20 {
            let v = i as f32 / 20.0;
            let there = TransferChar::Srgb.convert(v, TransferChar::Linear);
            let back = TransferChar::Linear.convert(there, TransferChar::Srgb);
            assert_abs_diff_eq!(v, back, epsilon = 1e-5);
        }
    }
}
