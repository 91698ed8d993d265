//! Fixed-point sample plane.
//!
//! A [`Plane`] is a contiguous row-major buffer of [`Sample`]s with
//! `stride == width`, tagged with the [`Quantization`] its values live in.
//! Cloning deep-copies; `std::mem::take` leaves an empty 0x0 plane.

use rayon::prelude::*;
use std::ops::{Index, IndexMut};

use crate::color::{Channel, QuantRange, TransferChar};
use crate::error::{Error, Result};
use crate::exec::{PlaneBuf, PlaneBufMut};
use crate::frame::Frame;
use crate::plane_fl::PlaneFl;
use crate::quant::{Quantization, Sample};

/// Integer plane with quantization metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<Sample>,
    quant: Quantization,
}

/// Checked `width * height`.
pub(crate) fn area(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .ok_or_else(|| Error::invalid_dimensions(width, height, "size overflows usize"))
}

impl Plane {
    /// Creates a plane filled with `value`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] if `width * height` overflows
    /// - [`Error::InvalidQuantization`] if `value` is not representable
    pub fn new(value: Sample, width: usize, height: usize, quant: Quantization) -> Result<Self> {
        if value > quant.max_value() {
            return Err(Error::InvalidQuantization {
                bit_depth: quant.bit_depth(),
                floor: quant.floor(),
                neutral: quant.neutral(),
                ceil: quant.ceil(),
                reason: format!("fill value {} exceeds the bit depth", value),
            });
        }
        let len = area(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![value; len],
            quant,
        })
    }

    /// Creates a plane with conventional quantization for `bit_depth`.
    pub fn with_depth(
        value: Sample,
        width: usize,
        height: usize,
        bit_depth: u8,
        chroma: bool,
        range: QuantRange,
        transfer: TransferChar,
    ) -> Result<Self> {
        let quant = Quantization::standard(bit_depth, chroma, range, transfer)?;
        Self::new(value, width, height, quant)
    }

    /// Same geometry and quantization as `src`, filled with its neutral value.
    pub fn like(src: &Plane) -> Self {
        Self {
            width: src.width,
            height: src.height,
            data: vec![src.quant.neutral(); src.data.len()],
            quant: src.quant,
        }
    }

    /// Quantizes a float plane into `quant`.
    ///
    /// Values are mapped with [`Quantization::get_d`] and clamped to
    /// `[floor, ceil]`. The transfer characteristic is taken from `quant`
    /// as is; no curve conversion happens here.
    pub fn from_float(src: &PlaneFl, quant: Quantization) -> Self {
        let (lo, hi) = (quant.floor(), quant.ceil());
        let data = src
            .data()
            .par_iter()
            .map(|&fl| quant.get_d(fl).clamp(lo, hi))
            .collect();
        Self {
            width: src.width(),
            height: src.height(),
            data,
            quant,
        }
    }

    /// Luma of an RGB frame, weighted by the frame's matrix coefficients.
    ///
    /// The result shares the quantization of the frame's red plane.
    pub fn y_from(frame: &Frame) -> Result<Self> {
        let (r, g, b) = frame.rgb()?;
        let [kr, kg, kb] = frame.format().color_matrix.luma_coefficients();
        let quant = r.quant;
        let data = r
            .data
            .par_iter()
            .zip(g.data.par_iter())
            .zip(b.data.par_iter())
            .map(|((&r, &g), &b)| quant.quantize(kr * r as f32 + kg * g as f32 + kb * b as f32))
            .collect();
        Ok(Self {
            width: r.width,
            height: r.height,
            data,
            quant,
        })
    }

    /// Color-managed copy of `src` under another transfer characteristic.
    ///
    /// Samples are decoded with the source curve and re-encoded with
    /// `dst`; quantization is otherwise kept. Chroma planes carry no
    /// transfer-encoded light and are copied unchanged.
    pub fn convert_from(src: &Plane, dst: TransferChar) -> Self {
        let quant = src.quant.with_transfer(dst);
        let from = src.quant.transfer();

        if src.quant.is_chroma() || from.same_curve(dst) {
            return Self {
                quant,
                ..src.clone()
            };
        }

        let map = |d: Sample| -> Sample {
            let fl = src.quant.get_fl(d).clamp(0.0, 1.0);
            quant.get_d(from.convert(fl, dst)).clamp(quant.floor(), quant.ceil())
        };

        let data = if quant.bit_depth() <= 16 {
            let top = quant.max_value();
            let lut: Vec<Sample> = (0..=top).map(map).collect();
            src.data.par_iter().map(|&d| lut[d.min(top) as usize]).collect()
        } else {
            src.data.par_iter().map(|&d| map(d)).collect()
        };

        Self {
            width: src.width,
            height: src.height,
            data,
            quant,
        }
    }

    /// Width in samples.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row stride in samples; always equal to the width.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` for a 0-area plane.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Quantization descriptor.
    #[inline]
    pub fn quant(&self) -> &Quantization {
        &self.quant
    }

    /// Bits per sample.
    #[inline]
    pub fn bit_depth(&self) -> u8 {
        self.quant.bit_depth()
    }

    /// Lower clamp bound.
    #[inline]
    pub fn floor(&self) -> Sample {
        self.quant.floor()
    }

    /// Zero point.
    #[inline]
    pub fn neutral(&self) -> Sample {
        self.quant.neutral()
    }

    /// Upper clamp bound.
    #[inline]
    pub fn ceil(&self) -> Sample {
        self.quant.ceil()
    }

    /// `ceil - floor`.
    #[inline]
    pub fn value_range(&self) -> Sample {
        self.quant.value_range()
    }

    /// Transfer characteristic of the samples.
    #[inline]
    pub fn transfer(&self) -> TransferChar {
        self.quant.transfer()
    }

    /// Rounds and clamps to this plane's `[floor, ceil]`.
    #[inline]
    pub fn quantize(&self, x: f32) -> Sample {
        self.quant.quantize(x)
    }

    /// All samples, row-major.
    #[inline]
    pub fn data(&self) -> &[Sample] {
        &self.data
    }

    /// All samples, mutable.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [Sample] {
        &mut self.data
    }

    /// Sample at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Sample {
        self.data[y * self.width + x]
    }

    /// Sets the sample at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: Sample) {
        self.data[y * self.width + x] = v;
    }

    /// One row of samples.
    #[inline]
    pub fn row(&self, y: usize) -> &[Sample] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Reallocates to `width x height`; every sample resets to neutral.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        let len = area(width, height)?;
        self.width = width;
        self.height = height;
        self.data = vec![self.quant.neutral(); len];
        Ok(())
    }

    /// Moves samples into another quantization.
    ///
    /// With `scale`, each sample goes through the affine map taking the
    /// old `(neutral, range)` onto the new one, rounded half up; with
    /// `clip` the result is clamped to the new `[floor, ceil]`. Results
    /// always stay within `[0, 2^bit_depth - 1]`. Without `scale` only
    /// the descriptor changes. Requantizing to the current parameters is
    /// the identity.
    pub fn requantize(&mut self, quant: Quantization, scale: bool, clip: bool) {
        if quant == self.quant {
            return;
        }
        let old = self.quant;
        self.quant = quant;
        if !scale {
            let max = quant.max_value();
            self.data.par_iter_mut().for_each(|d| *d = (*d).min(max));
            return;
        }

        let (lo, hi) = if clip {
            (quant.floor() as f64, quant.ceil() as f64)
        } else {
            (0.0, quant.max_value() as f64)
        };
        let gain = if old.value_range() == 0 {
            0.0
        } else {
            quant.value_range() as f64 / old.value_range() as f64
        };
        let offset = quant.neutral() as f64 - old.neutral() as f64 * gain + 0.5;

        self.data.par_iter_mut().for_each(|d| {
            let v = (*d as f64 * gain + offset).floor();
            *d = v.clamp(lo, hi) as Sample;
        });
    }

    /// Smallest sample, or floor for an empty plane.
    pub fn min(&self) -> Sample {
        self.data.par_iter().copied().min().unwrap_or(self.quant.floor())
    }

    /// Largest sample, or floor for an empty plane.
    pub fn max(&self) -> Sample {
        self.data.par_iter().copied().max().unwrap_or(self.quant.floor())
    }

    /// `(min, max)` in one pass.
    pub fn min_max(&self) -> (Sample, Sample) {
        if self.data.is_empty() {
            return (self.quant.floor(), self.quant.floor());
        }
        self.data
            .par_iter()
            .fold(|| (Sample::MAX, 0), |(lo, hi), &v| (lo.min(v), hi.max(v)))
            .reduce(|| (Sample::MAX, 0), |a, b| (a.0.min(b.0), a.1.max(b.1)))
    }

    /// Arithmetic mean of all samples.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.data.par_iter().map(|&v| v as f64).sum();
        sum / self.data.len() as f64
    }

    /// Population variance of all samples.
    pub fn variance(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let sum: f64 = self
            .data
            .par_iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum();
        sum / self.data.len() as f64
    }

    /// Checks this plane against the geometry and quantization a frame expects.
    pub(crate) fn check_against(
        &self,
        channel: Channel,
        width: usize,
        height: usize,
        bit_depth: u8,
    ) -> Result<()> {
        if (self.width, self.height) != (width, height) {
            return Err(Error::plane_mismatch(
                channel,
                format!(
                    "size {}x{} where {}x{} is expected",
                    self.width, self.height, width, height
                ),
            ));
        }
        if self.quant.bit_depth() != bit_depth {
            return Err(Error::plane_mismatch(
                channel,
                format!(
                    "bit depth {} where {} is expected",
                    self.quant.bit_depth(),
                    bit_depth
                ),
            ));
        }
        if channel != Channel::A && self.quant.is_chroma() != channel.is_chroma() {
            return Err(Error::plane_mismatch(
                channel,
                "chroma quantization does not match the channel",
            ));
        }
        Ok(())
    }
}

impl Index<usize> for Plane {
    type Output = Sample;

    #[inline]
    fn index(&self, i: usize) -> &Sample {
        &self.data[i]
    }
}

impl IndexMut<usize> for Plane {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut Sample {
        &mut self.data[i]
    }
}

impl PlaneBuf for Plane {
    type Elem = Sample;

    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn samples(&self) -> &[Sample] {
        &self.data
    }
}

impl PlaneBufMut for Plane {
    #[inline]
    fn samples_mut(&mut self) -> &mut [Sample] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorMatrix;
    use crate::frame::{Frame, FrameFormat};

    fn q8() -> Quantization {
        Quantization::full(8, TransferChar::Bt709).unwrap()
    }

    #[test]
    fn test_new_and_like() {
        let p = Plane::new(10, 4, 3, q8()).unwrap();
        assert_eq!(p.len(), 12);
        assert_eq!(p.stride(), 4);
        assert!(p.data().iter().all(|&v| v == 10));

        let c = Plane::with_depth(0, 2, 2, 8, true, QuantRange::Pc, TransferChar::Bt709).unwrap();
        let l = Plane::like(&c);
        assert!(l.data().iter().all(|&v| v == 128));
        assert_eq!(l.quant(), c.quant());
    }

    #[test]
    fn test_new_rejects_overflowing_value() {
        assert!(Plane::new(256, 1, 1, q8()).is_err());
        assert!(Plane::new(0, usize::MAX, 2, q8()).unwrap_err().is_dimension_error());
    }

    #[test]
    fn test_take_leaves_empty() {
        let mut p = Plane::new(3, 2, 2, q8()).unwrap();
        let moved = std::mem::take(&mut p);
        assert!(p.is_empty());
        assert_eq!(moved.len(), 4);
    }

    #[test]
    fn test_resize_resets_to_neutral() {
        let mut p = Plane::new(200, 2, 2, q8()).unwrap();
        p.resize(3, 5).unwrap();
        assert_eq!((p.width(), p.height()), (3, 5));
        assert!(p.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_requantize_identity() {
        let mut p = Plane::new(0, 16, 16, q8()).unwrap();
        for (i, d) in p.data_mut().iter_mut().enumerate() {
            *d = i as Sample;
        }
        let before = p.clone();
        p.requantize(q8(), true, true);
        assert_eq!(p, before);
    }

    #[test]
    fn test_requantize_8_to_16() {
        let mut p = Plane::new(255, 1, 1, q8()).unwrap();
        p[0] = 255;
        let q16 = Quantization::full(16, TransferChar::Bt709).unwrap();
        p.requantize(q16, true, false);
        assert_eq!(p[0], 65535);
        assert_eq!(p.bit_depth(), 16);
    }

    #[test]
    fn test_requantize_pc_to_tv_clips() {
        let mut p = Plane::new(0, 3, 1, q8()).unwrap();
        p.data_mut().copy_from_slice(&[0, 128, 255]);
        let tv = Quantization::standard(8, false, QuantRange::Tv, TransferChar::Bt709).unwrap();
        p.requantize(tv, true, true);
        assert_eq!(p.data(), &[16, 126, 235]);
    }

    #[test]
    fn test_requantize_without_scale_keeps_samples() {
        let mut p = Plane::new(77, 2, 1, q8()).unwrap();
        let tv = Quantization::standard(8, false, QuantRange::Tv, TransferChar::Bt709).unwrap();
        p.requantize(tv, false, false);
        assert_eq!(p.data(), &[77, 77]);
        assert_eq!(p.floor(), 16);
    }

    #[test]
    fn test_statistics() {
        let mut p = Plane::new(0, 4, 1, q8()).unwrap();
        p.data_mut().copy_from_slice(&[1, 2, 3, 6]);
        assert_eq!(p.min(), 1);
        assert_eq!(p.max(), 6);
        assert_eq!(p.min_max(), (1, 6));
        assert_eq!(p.mean(), 3.0);
        assert_eq!(p.variance(), 3.5);
    }

    #[test]
    fn test_float_roundtrip() {
        let mut p = Plane::new(0, 16, 16, q8()).unwrap();
        for (i, d) in p.data_mut().iter_mut().enumerate() {
            *d = i as Sample;
        }
        let fl = PlaneFl::from_plane(&p);
        let back = Plane::from_float(&fl, *p.quant());
        assert_eq!(back, p);
    }

    #[test]
    fn test_convert_from_same_curve_is_copy() {
        let p = Plane::new(99, 2, 2, q8()).unwrap();
        let c = Plane::convert_from(&p, TransferChar::Bt2020Bit10);
        assert_eq!(c.data(), p.data());
        assert_eq!(c.transfer(), TransferChar::Bt2020Bit10);
    }

    #[test]
    fn test_convert_from_keeps_endpoints() {
        let mut p = Plane::new(0, 2, 1, q8().with_transfer(TransferChar::Srgb)).unwrap();
        p[1] = 255;
        let lin = Plane::convert_from(&p, TransferChar::Linear);
        assert_eq!(lin.data(), &[0, 255]);
        // Mid grey darkens in linear light.
        let mid = Plane::new(128, 1, 1, q8().with_transfer(TransferChar::Srgb)).unwrap();
        assert!(Plane::convert_from(&mid, TransferChar::Linear)[0] < 128);
    }

    #[test]
    fn test_convert_from_clamps_out_of_range_samples() {
        let mut p = Plane::new(0, 2, 1, q8().with_transfer(TransferChar::Srgb)).unwrap();
        p.set(0, 0, 300);
        p.set(1, 0, 255);
        let lin = Plane::convert_from(&p, TransferChar::Linear);
        assert_eq!(lin.data(), &[255, 255]);
    }

    #[test]
    fn test_y_from_rgb_frame() {
        let format = FrameFormat::rgb(1, 1, 8).with_color_matrix(ColorMatrix::Bt709);
        let mut frame = Frame::new(0, format).unwrap();
        {
            let (r, g, b) = frame.rgb_mut().unwrap();
            r[0] = 255;
            g[0] = 0;
            b[0] = 0;
        }
        let y = Plane::y_from(&frame).unwrap();
        assert_eq!(y[0], 54);
    }
}
