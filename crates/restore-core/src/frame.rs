//! Multi-plane frames.
//!
//! A [`Frame`] owns one [`Plane`] per channel of its [`PixelType`], plus an
//! optional alpha plane, and a [`FrameFormat`] describing the color metadata
//! all planes share.
//!
//! # Plane geometry
//!
//! Luma and RGB planes are `width x height`. Chroma planes follow the
//! subsampling of the pixel type, rounding up:
//!
//! | Pixel type | Chroma size |
//! |------------|-------------|
//! | YUV444 | `w x h` |
//! | YUV422 | `ceil(w/2) x h` |
//! | YUV420 | `ceil(w/2) x ceil(h/2)` |
//! | YUV411 | `ceil(w/4) x h` |
//!
//! Frames assembled from existing planes are validated against the format
//! with [`Frame::from_planes`].
//!
//! # Example
//!
//! ```rust
//! use restore_core::{Frame, FrameFormat, PixelType};
//!
//! let format = FrameFormat::rgb(640, 480, 16);
//! let frame = Frame::new(0, format).unwrap();
//! assert_eq!(frame.pixel_type(), PixelType::Rgb);
//! assert_eq!(frame.r().unwrap().len(), 640 * 480);
//! assert!(frame.y().is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::color::{
    Channel, ChromaPlacement, ColorMatrix, ColorPrim, PixelType, QuantRange, TransferChar,
};
use crate::error::{Error, Result};
use crate::plane::Plane;
use crate::quant::{Quantization, MAX_BIT_DEPTH};

/// Shape and color metadata of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameFormat {
    /// Which planes the frame holds
    pub pixel_type: PixelType,
    /// Luma/RGB width
    pub width: usize,
    /// Luma/RGB height
    pub height: usize,
    /// Bits per sample, 1..=24
    pub bit_depth: u8,
    /// Quantization range convention
    pub quant_range: QuantRange,
    /// Chroma siting
    pub chroma_placement: ChromaPlacement,
    /// Color primaries
    pub color_prim: ColorPrim,
    /// Transfer characteristic of luma/RGB planes
    pub transfer: TransferChar,
    /// YUV matrix coefficients
    pub color_matrix: ColorMatrix,
}

impl FrameFormat {
    /// Full-range RGB format under BT.709.
    pub fn rgb(width: usize, height: usize, bit_depth: u8) -> Self {
        Self {
            pixel_type: PixelType::Rgb,
            width,
            height,
            bit_depth,
            quant_range: QuantRange::Pc,
            chroma_placement: ChromaPlacement::Mpeg2,
            color_prim: ColorPrim::Bt709,
            transfer: TransferChar::Bt709,
            color_matrix: ColorMatrix::Bt709,
        }
    }

    /// Limited-range YUV format under BT.709.
    pub fn yuv(pixel_type: PixelType, width: usize, height: usize, bit_depth: u8) -> Self {
        Self {
            pixel_type,
            quant_range: QuantRange::Tv,
            ..Self::rgb(width, height, bit_depth)
        }
    }

    /// Replaces the transfer characteristic.
    pub fn with_transfer(mut self, transfer: TransferChar) -> Self {
        self.transfer = transfer;
        self
    }

    /// Replaces the color matrix.
    pub fn with_color_matrix(mut self, color_matrix: ColorMatrix) -> Self {
        self.color_matrix = color_matrix;
        self
    }

    /// Replaces the primaries.
    pub fn with_color_prim(mut self, color_prim: ColorPrim) -> Self {
        self.color_prim = color_prim;
        self
    }

    /// Replaces the quantization range.
    pub fn with_quant_range(mut self, quant_range: QuantRange) -> Self {
        self.quant_range = quant_range;
        self
    }

    /// Geometry of the plane for `channel`.
    pub fn plane_size(&self, channel: Channel) -> (usize, usize) {
        self.pixel_type.plane_size(channel, self.width, self.height)
    }

    /// Conventional quantization for `channel`.
    pub fn quant_for(&self, channel: Channel) -> Result<Quantization> {
        if channel == Channel::A {
            return Quantization::full(self.bit_depth, TransferChar::Linear);
        }
        Quantization::standard(
            self.bit_depth,
            channel.is_chroma(),
            self.quant_range,
            self.transfer,
        )
    }
}

impl Default for FrameFormat {
    /// Empty 16-bit RGB.
    fn default() -> Self {
        Self::rgb(0, 0, 16)
    }
}

/// Owned set of planes sharing one format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    frame_num: usize,
    format: FrameFormat,
    planes: Vec<(Channel, Plane)>,
}

impl Frame {
    /// Allocates every plane of `format`, filled with its neutral value.
    pub fn new(frame_num: usize, format: FrameFormat) -> Result<Self> {
        if format.bit_depth == 0 || format.bit_depth > MAX_BIT_DEPTH {
            return Err(Error::InvalidQuantization {
                bit_depth: format.bit_depth,
                floor: 0,
                neutral: 0,
                ceil: 0,
                reason: "bit depth must be within 1..=24".into(),
            });
        }
        let mut planes = Vec::with_capacity(4);
        for &channel in format.pixel_type.channels() {
            let quant = format.quant_for(channel)?;
            let (w, h) = format.plane_size(channel);
            planes.push((channel, Plane::new(quant.neutral(), w, h, quant)?));
        }
        Ok(Self {
            frame_num,
            format,
            planes,
        })
    }

    /// Full-range RGB frame, all samples 0.
    pub fn new_rgb(frame_num: usize, width: usize, height: usize, bit_depth: u8) -> Result<Self> {
        Self::new(frame_num, FrameFormat::rgb(width, height, bit_depth))
    }

    /// Assembles a frame from existing planes.
    ///
    /// The channels must be exactly those of `format.pixel_type`, in order,
    /// optionally followed by [`Channel::A`]. Every plane must have the
    /// geometry and bit depth the format implies; chroma quantization must
    /// match chroma channels; the color planes must share one quantization
    /// tagged with the format's transfer characteristic.
    pub fn from_planes(
        frame_num: usize,
        format: FrameFormat,
        planes: Vec<(Channel, Plane)>,
    ) -> Result<Self> {
        check_planes(&format, &planes)?;
        Ok(Self {
            frame_num,
            format,
            planes,
        })
    }

    /// Re-checks the plane layout against the frame format.
    ///
    /// Planes handed out through [`Frame::plane_mut`] or
    /// [`Frame::planes_mut`] can be resized or re-quantized; filters call
    /// this before indexing planes in lockstep.
    pub fn validate(&self) -> Result<()> {
        check_planes(&self.format, &self.planes)
    }

    /// Same format and frame number as `src`, every plane neutral.
    pub fn like(src: &Frame) -> Self {
        Self {
            frame_num: src.frame_num,
            format: src.format,
            planes: src
                .planes
                .iter()
                .map(|(c, p)| (*c, Plane::like(p)))
                .collect(),
        }
    }

    /// Color-managed copy of `src` under another transfer characteristic.
    ///
    /// Luma/RGB planes are re-encoded; chroma and alpha are copied.
    pub fn convert_from(src: &Frame, dst: TransferChar) -> Self {
        let planes = src
            .planes
            .iter()
            .map(|(c, p)| {
                let plane = if *c == Channel::A {
                    p.clone()
                } else {
                    Plane::convert_from(p, dst)
                };
                (*c, plane)
            })
            .collect();
        Self {
            frame_num: src.frame_num,
            format: src.format.with_transfer(dst),
            planes,
        }
    }

    /// Adds an opaque full-range alpha plane if none exists.
    pub fn add_alpha(&mut self) -> Result<()> {
        if self.a().is_some() {
            return Ok(());
        }
        let quant = self.format.quant_for(Channel::A)?;
        let plane = Plane::new(quant.ceil(), self.format.width, self.format.height, quant)?;
        self.planes.push((Channel::A, plane));
        Ok(())
    }

    /// Drops the alpha plane, returning it.
    pub fn remove_alpha(&mut self) -> Option<Plane> {
        let pos = self.planes.iter().position(|(c, _)| *c == Channel::A)?;
        Some(self.planes.remove(pos).1)
    }

    /// Plane for `channel`, if present.
    #[inline]
    pub fn plane(&self, channel: Channel) -> Option<&Plane> {
        self.planes
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, p)| p)
    }

    /// Mutable plane for `channel`, if present.
    #[inline]
    pub fn plane_mut(&mut self, channel: Channel) -> Option<&mut Plane> {
        self.planes
            .iter_mut()
            .find(|(c, _)| *c == channel)
            .map(|(_, p)| p)
    }

    /// Red plane.
    pub fn r(&self) -> Option<&Plane> {
        self.plane(Channel::R)
    }

    /// Green plane.
    pub fn g(&self) -> Option<&Plane> {
        self.plane(Channel::G)
    }

    /// Blue plane.
    pub fn b(&self) -> Option<&Plane> {
        self.plane(Channel::B)
    }

    /// Luma plane.
    pub fn y(&self) -> Option<&Plane> {
        self.plane(Channel::Y)
    }

    /// Blue-difference plane.
    pub fn u(&self) -> Option<&Plane> {
        self.plane(Channel::U)
    }

    /// Red-difference plane.
    pub fn v(&self) -> Option<&Plane> {
        self.plane(Channel::V)
    }

    /// Alpha plane.
    pub fn a(&self) -> Option<&Plane> {
        self.plane(Channel::A)
    }

    /// The three color planes of an RGB frame.
    pub fn rgb(&self) -> Result<(&Plane, &Plane, &Plane)> {
        let missing = |channel| Error::MissingChannel {
            channel,
            pixel_type: self.format.pixel_type.to_string(),
        };
        Ok((
            self.r().ok_or_else(|| missing(Channel::R))?,
            self.g().ok_or_else(|| missing(Channel::G))?,
            self.b().ok_or_else(|| missing(Channel::B))?,
        ))
    }

    /// Mutable color planes of an RGB frame.
    pub fn rgb_mut(&mut self) -> Result<(&mut Plane, &mut Plane, &mut Plane)> {
        let pixel_type = self.format.pixel_type;
        let (mut r, mut g, mut b) = (None, None, None);
        for (c, p) in self.planes.iter_mut() {
            match c {
                Channel::R => r = Some(p),
                Channel::G => g = Some(p),
                Channel::B => b = Some(p),
                _ => {}
            }
        }
        let missing = |channel| Error::MissingChannel {
            channel,
            pixel_type: pixel_type.to_string(),
        };
        Ok((
            r.ok_or_else(|| missing(Channel::R))?,
            g.ok_or_else(|| missing(Channel::G))?,
            b.ok_or_else(|| missing(Channel::B))?,
        ))
    }

    /// All planes in order.
    #[inline]
    pub fn planes(&self) -> &[(Channel, Plane)] {
        &self.planes
    }

    /// All planes, mutable.
    ///
    /// Changing a plane's geometry or quantization here leaves a frame that
    /// [`Frame::validate`] rejects.
    #[inline]
    pub fn planes_mut(&mut self) -> &mut [(Channel, Plane)] {
        &mut self.planes
    }

    /// Consumes the frame, returning its planes.
    pub fn into_planes(self) -> Vec<(Channel, Plane)> {
        self.planes
    }

    /// Frame number.
    #[inline]
    pub fn frame_num(&self) -> usize {
        self.frame_num
    }

    /// Replaces the frame number.
    pub fn set_frame_num(&mut self, frame_num: usize) {
        self.frame_num = frame_num;
    }

    /// Format descriptor.
    #[inline]
    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    /// Luma/RGB width.
    #[inline]
    pub fn width(&self) -> usize {
        self.format.width
    }

    /// Luma/RGB height.
    #[inline]
    pub fn height(&self) -> usize {
        self.format.height
    }

    /// Pixel type.
    #[inline]
    pub fn pixel_type(&self) -> PixelType {
        self.format.pixel_type
    }

    /// Bits per sample.
    #[inline]
    pub fn bit_depth(&self) -> u8 {
        self.format.bit_depth
    }

    /// Quantization range convention.
    #[inline]
    pub fn quant_range(&self) -> QuantRange {
        self.format.quant_range
    }

    /// Chroma siting.
    #[inline]
    pub fn chroma_placement(&self) -> ChromaPlacement {
        self.format.chroma_placement
    }

    /// Color primaries.
    #[inline]
    pub fn color_prim(&self) -> ColorPrim {
        self.format.color_prim
    }

    /// Transfer characteristic.
    #[inline]
    pub fn transfer(&self) -> TransferChar {
        self.format.transfer
    }

    /// Matrix coefficients.
    #[inline]
    pub fn color_matrix(&self) -> ColorMatrix {
        self.format.color_matrix
    }

    /// `true` when the frame has no pixels, as the decode-failure placeholder.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.format.width == 0 || self.format.height == 0
    }
}


/// Layout checks shared by [`Frame::from_planes`] and [`Frame::validate`].
fn check_planes(format: &FrameFormat, planes: &[(Channel, Plane)]) -> Result<()> {
    let expected = format.pixel_type.channels();
    let has_alpha = planes.len() == expected.len() + 1;
    if planes.len() != expected.len() && !has_alpha {
        return Err(Error::other(format!(
            "{} frame needs {} planes, got {}",
            format.pixel_type,
            expected.len(),
            planes.len()
        )));
    }

    for (i, (channel, plane)) in planes.iter().enumerate() {
        let want = expected.get(i).copied().unwrap_or(Channel::A);
        if *channel != want {
            return Err(Error::plane_mismatch(
                *channel,
                format!("expected channel {:?} at position {}", want, i),
            ));
        }
        let (w, h) = format.plane_size(*channel);
        plane.check_against(*channel, w, h, format.bit_depth)?;
        if *channel != Channel::A && plane.transfer() != format.transfer && !channel.is_chroma()
        {
            return Err(Error::plane_mismatch(
                *channel,
                format!(
                    "transfer {:?} where {:?} is expected",
                    plane.transfer(),
                    format.transfer
                ),
            ));
        }
    }

    // Color planes of one kind share a descriptor.
    let mut luma: Option<&Quantization> = None;
    let mut chroma: Option<&Quantization> = None;
    for (channel, plane) in planes {
        if *channel == Channel::A {
            continue;
        }
        let slot = if channel.is_chroma() { &mut chroma } else { &mut luma };
        match slot {
            Some(q) if *q != plane.quant() => {
                return Err(Error::plane_mismatch(
                    *channel,
                    "quantization differs from the other planes",
                ));
            }
            Some(_) => {}
            None => *slot = Some(plane.quant()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rgb_frame() {
        let f = Frame::new_rgb(3, 4, 2, 8).unwrap();
        assert_eq!(f.frame_num(), 3);
        assert_eq!(f.planes().len(), 3);
        assert!(f.rgb().is_ok());
        assert!(f.u().is_none());
        assert_eq!(f.r().unwrap().ceil(), 255);
    }

    #[test]
    fn test_yuv_subsampling() {
        let f = Frame::new(0, FrameFormat::yuv(PixelType::Yuv420, 5, 3, 10)).unwrap();
        let y = f.y().unwrap();
        let u = f.u().unwrap();
        assert_eq!((y.width(), y.height()), (5, 3));
        assert_eq!((u.width(), u.height()), (3, 2));
        assert_eq!(u.neutral(), 512);
        assert_eq!(y.floor(), 64);
        assert!(u.data().iter().all(|&v| v == 512));

        let f = Frame::new(0, FrameFormat::yuv(PixelType::Yuv411, 9, 2, 8)).unwrap();
        let v = f.v().unwrap();
        assert_eq!((v.width(), v.height()), (3, 2));
    }

    #[test]
    fn test_rgb_on_yuv_frame_fails() {
        let f = Frame::new(0, FrameFormat::yuv(PixelType::Yuv444, 2, 2, 8)).unwrap();
        let err = f.rgb().unwrap_err();
        assert!(matches!(err, Error::MissingChannel { channel: Channel::R, .. }));
    }

    #[test]
    fn test_default_is_empty_rgb() {
        let f = Frame::default();
        assert!(f.is_empty());
        assert_eq!(f.pixel_type(), PixelType::Rgb);
    }

    #[test]
    fn test_add_alpha_is_opaque() {
        let mut f = Frame::new_rgb(0, 2, 2, 10).unwrap();
        f.add_alpha().unwrap();
        f.add_alpha().unwrap();
        assert_eq!(f.planes().len(), 4);
        assert!(f.a().unwrap().data().iter().all(|&v| v == 1023));
        assert!(f.remove_alpha().is_some());
        assert!(f.a().is_none());
    }

    #[test]
    fn test_from_planes_validates() {
        let format = FrameFormat::rgb(2, 2, 8);
        let q = format.quant_for(Channel::R).unwrap();
        let p = Plane::new(0, 2, 2, q).unwrap();

        let ok = Frame::from_planes(
            0,
            format,
            vec![(Channel::R, p.clone()), (Channel::G, p.clone()), (Channel::B, p.clone())],
        );
        assert!(ok.is_ok());

        let wrong_order = Frame::from_planes(
            0,
            format,
            vec![(Channel::G, p.clone()), (Channel::R, p.clone()), (Channel::B, p.clone())],
        );
        assert!(wrong_order.is_err());

        let small = Plane::new(0, 1, 2, q).unwrap();
        let wrong_size = Frame::from_planes(
            0,
            format,
            vec![(Channel::R, p.clone()), (Channel::G, small), (Channel::B, p.clone())],
        );
        assert!(matches!(wrong_size, Err(Error::PlaneMismatch { channel: Channel::G, .. })));

        let tv = Quantization::standard(8, false, QuantRange::Tv, TransferChar::Bt709).unwrap();
        let mixed = Frame::from_planes(
            0,
            format,
            vec![
                (Channel::R, p.clone()),
                (Channel::G, Plane::new(16, 2, 2, tv).unwrap()),
                (Channel::B, p.clone()),
            ],
        );
        assert!(mixed.is_err());

        let srgb = Plane::new(0, 2, 2, q.with_transfer(TransferChar::Srgb)).unwrap();
        let wrong_tc = Frame::from_planes(
            0,
            format,
            vec![(Channel::R, srgb.clone()), (Channel::G, srgb.clone()), (Channel::B, srgb)],
        );
        assert!(wrong_tc.is_err());
    }

    #[test]
    fn test_like_and_equality() {
        let mut f = Frame::new_rgb(1, 2, 2, 8).unwrap();
        f.plane_mut(Channel::G).unwrap()[0] = 9;
        let l = Frame::like(&f);
        assert_ne!(l, f);
        assert_eq!(l.format(), f.format());
        assert_eq!(l.g().unwrap()[0], 0);
        assert_eq!(f.clone(), f);
    }

    #[test]
    fn test_convert_from_updates_tag() {
        let f = Frame::new(0, FrameFormat::rgb(2, 1, 8).with_transfer(TransferChar::Srgb)).unwrap();
        let c = Frame::convert_from(&f, TransferChar::Linear);
        assert_eq!(c.transfer(), TransferChar::Linear);
        assert_eq!(c.r().unwrap().transfer(), TransferChar::Linear);
    }

    #[test]
    fn test_bad_bit_depth() {
        assert!(Frame::new_rgb(0, 1, 1, 0).is_err());
        assert!(Frame::new_rgb(0, 1, 1, 25).is_err());
    }

    #[test]
    fn test_validate_catches_plane_edits() {
        let mut f = Frame::new_rgb(0, 4, 4, 8).unwrap();
        assert!(f.validate().is_ok());

        f.plane_mut(Channel::G).unwrap().resize(1, 1).unwrap();
        assert!(matches!(f.validate(), Err(Error::PlaneMismatch { .. })));

        let mut f = Frame::new_rgb(0, 4, 4, 8).unwrap();
        let narrow = Quantization::new(8, 0, 0, 200, f.transfer()).unwrap();
        f.plane_mut(Channel::B).unwrap().requantize(narrow, true, true);
        assert!(matches!(f.validate(), Err(Error::PlaneMismatch { .. })));

        assert!(Frame::default().validate().is_err());
    }
}
