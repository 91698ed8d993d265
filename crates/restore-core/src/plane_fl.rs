//! Floating-point sample plane.
//!
//! [`PlaneFl`] mirrors [`Plane`] with `f32` samples and a [`FloatRange`].
//! Algorithms convert integer planes into this domain, compute, and
//! quantize back with [`Plane::from_float`].

use rayon::prelude::*;
use std::ops::{Index, IndexMut};

use crate::color::TransferChar;
use crate::error::{Error, Result};
use crate::exec::{PlaneBuf, PlaneBufMut};
use crate::frame::Frame;
use crate::plane::{area, Plane};
use crate::quant::{FloatRange, Quantization};

/// Float plane with range metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaneFl {
    width: usize,
    height: usize,
    data: Vec<f32>,
    range: FloatRange,
}

impl PlaneFl {
    /// Creates a plane filled with `value`.
    pub fn new(value: f32, width: usize, height: usize, range: FloatRange) -> Result<Self> {
        let len = area(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![value; len],
            range,
        })
    }

    /// `[0, 1]` plane under BT.709, filled with `value`.
    pub fn unit(value: f32, width: usize, height: usize) -> Result<Self> {
        Self::new(value, width, height, FloatRange::unit(TransferChar::Bt709))
    }

    /// Same geometry and range as `src`, filled with its neutral value.
    pub fn like(src: &PlaneFl) -> Self {
        Self {
            width: src.width,
            height: src.height,
            data: vec![src.range.neutral; src.data.len()],
            range: src.range,
        }
    }

    /// Same geometry as an integer plane, matching float range, filled with neutral.
    pub fn like_plane(src: &Plane) -> Self {
        let range = src.quant().float_range();
        Self {
            width: src.width(),
            height: src.height(),
            data: vec![range.neutral; src.len()],
            range,
        }
    }

    /// Normalizes an integer plane with [`Quantization::get_fl`].
    pub fn from_plane(src: &Plane) -> Self {
        let quant = *src.quant();
        let data = src.data().par_iter().map(|&d| quant.get_fl(d)).collect();
        Self {
            width: src.width(),
            height: src.height(),
            data,
            range: quant.float_range(),
        }
    }

    /// Normalizes an integer plane and re-expresses it under `dst`.
    ///
    /// Chroma planes are normalized without curve conversion.
    pub fn from_plane_as(src: &Plane, dst: TransferChar) -> Self {
        let mut out = Self::from_plane(src);
        if !out.range.is_chroma() {
            let from = src.transfer();
            if !from.same_curve(dst) {
                out.data
                    .par_iter_mut()
                    .for_each(|v| *v = from.convert(v.clamp(0.0, 1.0), dst));
            }
        }
        out.range.transfer = dst;
        out
    }

    /// Quantizes into an integer plane; shorthand for [`Plane::from_float`].
    pub fn to_plane(&self, quant: Quantization) -> Plane {
        Plane::from_float(self, quant)
    }

    /// Normalized luma of an RGB frame, weighted by the matrix coefficients.
    pub fn y_from(frame: &Frame) -> Result<Self> {
        let (r, g, b) = frame.rgb()?;
        let [kr, kg, kb] = frame.format().color_matrix.luma_coefficients();
        let quant = *r.quant();
        let data = r
            .data()
            .par_iter()
            .zip(g.data().par_iter())
            .zip(b.data().par_iter())
            .map(|((&r, &g), &b)| {
                kr * quant.get_fl(r) + kg * quant.get_fl(g) + kb * quant.get_fl(b)
            })
            .collect();
        Ok(Self {
            width: r.width(),
            height: r.height(),
            data,
            range: quant.float_range(),
        })
    }

    /// Color-managed copy of `src` under another transfer characteristic.
    ///
    /// Values are clamped to the range before conversion. Chroma planes
    /// are copied unchanged.
    pub fn convert_from(src: &PlaneFl, dst: TransferChar) -> Self {
        let from = src.range.transfer;
        let range = src.range.with_transfer(dst);
        if src.range.is_chroma() || from.same_curve(dst) {
            return Self {
                range,
                ..src.clone()
            };
        }
        let data = src
            .data
            .par_iter()
            .map(|&v| from.convert(src.range.quantize(v), dst))
            .collect();
        Self {
            width: src.width,
            height: src.height,
            data,
            range,
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

    /// Range descriptor.
    #[inline]
    pub fn range(&self) -> &FloatRange {
        &self.range
    }

    /// Transfer characteristic of the samples.
    #[inline]
    pub fn transfer(&self) -> TransferChar {
        self.range.transfer
    }

    /// Replaces the range descriptor without touching samples.
    pub fn set_range(&mut self, range: FloatRange) {
        self.range = range;
    }

    /// Clamps to `[floor, ceil]` without rounding.
    #[inline]
    pub fn quantize(&self, x: f32) -> f32 {
        self.range.quantize(x)
    }

    /// All samples, row-major.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// All samples, mutable.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Sample at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Sets the sample at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        self.data[y * self.width + x] = v;
    }

    /// Reallocates to `width x height`; every sample resets to neutral.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        let len = area(width, height)?;
        self.width = width;
        self.height = height;
        self.data = vec![self.range.neutral; len];
        Ok(())
    }

    /// Checks that `other` has the same geometry.
    pub fn check_same_size(&self, other: &PlaneFl) -> Result<()> {
        if (self.width, self.height) != (other.width, other.height) {
            return Err(Error::dimension_mismatch(
                (self.width, self.height),
                (other.width, other.height),
            ));
        }
        Ok(())
    }

    /// Smallest sample; the range floor for an empty plane.
    pub fn min(&self) -> f32 {
        self.min_max().0
    }

    /// Largest sample; the range floor for an empty plane.
    pub fn max(&self) -> f32 {
        self.min_max().1
    }

    /// `(min, max)` in one pass.
    pub fn min_max(&self) -> (f32, f32) {
        if self.data.is_empty() {
            return (self.range.floor, self.range.floor);
        }
        self.data
            .par_iter()
            .fold(
                || (f32::INFINITY, f32::NEG_INFINITY),
                |(lo, hi), &v| (lo.min(v), hi.max(v)),
            )
            .reduce(
                || (f32::INFINITY, f32::NEG_INFINITY),
                |a, b| (a.0.min(b.0), a.1.max(b.1)),
            )
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
}

impl Index<usize> for PlaneFl {
    type Output = f32;

    #[inline]
    fn index(&self, i: usize) -> &f32 {
        &self.data[i]
    }
}

impl IndexMut<usize> for PlaneFl {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        &mut self.data[i]
    }
}

impl PlaneBuf for PlaneFl {
    type Elem = f32;

    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn samples(&self) -> &[f32] {
        &self.data
    }
}

impl PlaneBufMut for PlaneFl {
    #[inline]
    fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}
