//! Interleaved RGB rasters and bit-depth remapping into frame planes.
//!
//! Decoders produce a [`Raster`] at 8 or 16 bits; [`Raster::into_frame`]
//! remaps samples into full-range planes at the requested depth:
//!
//! | Source | Target | Mapping |
//! |--------|--------|---------|
//! | 8 | 8, 16 | copy, `x * 257` |
//! | 16 | 16, 8 | copy, `(x + 128) / 257` |
//! | any | other | lookup table through normalized value |
//!
//! [`Raster::from_frame`] goes the other way, always to 8 bits.

use restore_core::{
    Frame, FrameFormat, Plane, Quantization, Sample, TransferChar, MAX_BIT_DEPTH,
};
use tracing::trace;

use crate::{IoError, IoResult};

/// Decoded RGB samples, row-major, interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Bits per sample, 8 or 16
    pub depth: u8,
    /// `width * height * 3` samples
    pub samples: Vec<u16>,
}

impl Raster {
    /// Builds a raster, checking the sample count.
    pub fn new(width: usize, height: usize, depth: u8, samples: Vec<u16>) -> IoResult<Self> {
        if depth != 8 && depth != 16 {
            return Err(IoError::UnsupportedBitDepth(format!("{}-bit raster", depth)));
        }
        if samples.len() != width * height * 3 {
            return Err(IoError::DecodeError(format!(
                "expected {} samples for {}x{} RGB, got {}",
                width * height * 3,
                width,
                height,
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            depth,
            samples,
        })
    }

    /// Builds an 8-bit raster from RGB bytes.
    pub fn from_rgb8(width: usize, height: usize, bytes: &[u8]) -> IoResult<Self> {
        Self::new(width, height, 8, bytes.iter().map(|&b| b as u16).collect())
    }

    /// Expands single-channel samples to RGB.
    pub fn from_gray(width: usize, height: usize, depth: u8, gray: &[u16]) -> IoResult<Self> {
        Self::new(width, height, depth, gray.iter().flat_map(|&g| [g, g, g]).collect())
    }

    /// Converts gray, gray+alpha, RGB or RGBA samples (`stride` channels) to RGB.
    pub fn from_interleaved(
        width: usize,
        height: usize,
        depth: u8,
        samples: &[u16],
        stride: usize,
    ) -> IoResult<Self> {
        match stride {
            1 => Self::from_gray(width, height, depth, samples),
            2 => {
                let gray: Vec<u16> = samples.chunks_exact(2).map(|ga| ga[0]).collect();
                Self::from_gray(width, height, depth, &gray)
            }
            3 => Self::new(width, height, depth, samples.to_vec()),
            4 => Self::new(
                width,
                height,
                depth,
                samples
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect(),
            ),
            n => Err(IoError::DecodeError(format!("unsupported channel count: {}", n))),
        }
    }

    /// Remaps into an sRGB-tagged full-range RGB frame of `bit_depth`.
    pub fn into_frame(self, frame_num: usize, bit_depth: u8) -> IoResult<Frame> {
        trace!(
            width = self.width,
            height = self.height,
            src_depth = self.depth,
            bit_depth,
            "raster::into_frame"
        );
        check_depth(bit_depth)?;
        let format = FrameFormat::rgb(self.width, self.height, bit_depth)
            .with_transfer(TransferChar::Srgb);
        let mut frame = Frame::new(frame_num, format)?;
        let (r, g, b) = frame.rgb_mut()?;
        let quant = *r.quant();
        let map = DepthMap::new(self.depth, quant);
        for (i, px) in self.samples.chunks_exact(3).enumerate() {
            r[i] = map.get(px[0]);
            g[i] = map.get(px[1]);
            b[i] = map.get(px[2]);
        }
        Ok(frame)
    }

    /// Quantizes an RGB frame to an 8-bit raster.
    pub fn from_frame(frame: &Frame) -> IoResult<Self> {
        trace!(
            width = frame.width(),
            height = frame.height(),
            bit_depth = frame.bit_depth(),
            "raster::from_frame"
        );
        let (r, g, b) = frame.rgb()?;
        let (r8, g8, b8) = (to_u8(r), to_u8(g), to_u8(b));
        let samples = r8
            .iter()
            .zip(&g8)
            .zip(&b8)
            .flat_map(|((&r, &g), &b)| [r as u16, g as u16, b as u16])
            .collect();
        Self::new(frame.width(), frame.height(), 8, samples)
    }

    /// Samples as bytes; meaningful for 8-bit rasters.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.samples.iter().map(|&s| s.min(255) as u8).collect()
    }
}

fn check_depth(bit_depth: u8) -> IoResult<()> {
    if bit_depth == 0 || bit_depth > MAX_BIT_DEPTH {
        return Err(IoError::UnsupportedBitDepth(format!(
            "{}-bit frames (supported 1..={})",
            bit_depth, MAX_BIT_DEPTH
        )));
    }
    Ok(())
}

/// Source sample to plane sample.
enum DepthMap {
    Copy,
    Scale257,
    Div257,
    Lut(Vec<Sample>),
}

impl DepthMap {
    fn new(src_depth: u8, quant: Quantization) -> Self {
        let full = quant.floor() == 0;
        match (src_depth, quant.ceil()) {
            (8, 255) | (16, 65535) if full => DepthMap::Copy,
            (8, 65535) if full => DepthMap::Scale257,
            (16, 255) if full => DepthMap::Div257,
            _ => {
                let levels = 1u32 << src_depth;
                let top = (levels - 1) as f32;
                DepthMap::Lut(
                    (0..levels)
                        .map(|k| quant.get_d(k as f32 / top).clamp(quant.floor(), quant.ceil()))
                        .collect(),
                )
            }
        }
    }

    #[inline]
    fn get(&self, v: u16) -> Sample {
        match self {
            DepthMap::Copy => v as Sample,
            DepthMap::Scale257 => v as Sample * 257,
            DepthMap::Div257 => ((v as Sample + 128) / 257).min(255),
            DepthMap::Lut(lut) => lut[(v as usize).min(lut.len() - 1)],
        }
    }
}

/// Plane samples to bytes.
pub fn to_u8(plane: &Plane) -> Vec<u8> {
    let q = *plane.quant();
    match (q.floor(), q.ceil()) {
        (0, 255) => plane.data().iter().map(|&v| v.min(255) as u8).collect(),
        (0, 65535) => plane
            .data()
            .iter()
            .map(|&v| ((v + 128) / 257).min(255) as u8)
            .collect(),
        _ if q.bit_depth() <= 16 => {
            let lut: Vec<u8> = (0..=q.max_value()).map(|k| fl_to_u8(q.get_fl(k))).collect();
            plane
                .data()
                .iter()
                .map(|&v| lut[(v as usize).min(lut.len() - 1)])
                .collect()
        }
        _ => plane.data().iter().map(|&v| fl_to_u8(q.get_fl(v))).collect(),
    }
}

#[inline]
fn fl_to_u8(fl: f32) -> u8 {
    (fl * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}
