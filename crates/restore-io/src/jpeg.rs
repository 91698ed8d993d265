//! JPEG decoding and encoding.
//!
//! Gray and CMYK input is converted to RGB; 16-bit gray keeps its
//! precision. Output is 8-bit RGB at [`DEFAULT_QUALITY`] unless a quality
//! is given.

use crate::raster::Raster;
use crate::{IoError, IoResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Encoder quality used by [`write`].
pub const DEFAULT_QUALITY: u8 = 95;

/// Decodes a JPEG file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Raster> {
    let file = File::open(path.as_ref())?;
    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(file));
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;
    let (width, height) = (info.width as usize, info.height as usize);

    match info.pixel_format {
        jpeg_decoder::PixelFormat::RGB24 => Raster::from_rgb8(width, height, &pixels),
        jpeg_decoder::PixelFormat::L8 => {
            let gray: Vec<u16> = pixels.iter().map(|&g| g as u16).collect();
            Raster::from_gray(width, height, 8, &gray)
        }
        jpeg_decoder::PixelFormat::L16 => {
            let gray: Vec<u16> = pixels
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            Raster::from_gray(width, height, 16, &gray)
        }
        jpeg_decoder::PixelFormat::CMYK32 => {
            let rgb: Vec<u8> = pixels
                .chunks_exact(4)
                .flat_map(|cmyk| {
                    let k = 1.0 - cmyk[3] as f32 / 255.0;
                    let ink = |c: u8| ((1.0 - c as f32 / 255.0) * k * 255.0 + 0.5) as u8;
                    [ink(cmyk[0]), ink(cmyk[1]), ink(cmyk[2])]
                })
                .collect();
            Raster::from_rgb8(width, height, &rgb)
        }
    }
}

/// Encodes an 8-bit RGB raster at [`DEFAULT_QUALITY`].
pub fn write<P: AsRef<Path>>(path: P, raster: &Raster) -> IoResult<()> {
    write_with_quality(path, raster, DEFAULT_QUALITY)
}

/// Encodes an 8-bit RGB raster at `quality` (1..=100).
pub fn write_with_quality<P: AsRef<Path>>(path: P, raster: &Raster, quality: u8) -> IoResult<()> {
    use jpeg_encoder::{ColorType, Encoder};

    let too_large = |what: &str, v: usize| IoError::EncodeError(format!("{} {} exceeds 65535", what, v));
    let width = u16::try_from(raster.width).map_err(|_| too_large("width", raster.width))?;
    let height = u16::try_from(raster.height).map_err(|_| too_large("height", raster.height))?;

    let mut buffer = Vec::new();
    let encoder = Encoder::new(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode(&raster.to_rgb8(), width, height, ColorType::Rgb)
        .map_err(|e: jpeg_encoder::EncodingError| IoError::EncodeError(e.to_string()))?;
    std::fs::write(path.as_ref(), buffer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_flat_color() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.jpg");
        let raster = Raster::from_rgb8(16, 16, &[200u8, 100, 50].repeat(256)).unwrap();
        write(&path, &raster).unwrap();

        let loaded = read(&path).unwrap();
        assert_eq!((loaded.width, loaded.height, loaded.depth), (16, 16, 8));
        for px in loaded.samples.chunks_exact(3) {
            assert!(px[0].abs_diff(200) <= 4, "{px:?}");
            assert!(px[1].abs_diff(100) <= 4, "{px:?}");
            assert!(px[2].abs_diff(50) <= 4, "{px:?}");
        }
    }

    #[test]
    fn test_oversize_rejected() {
        let raster = Raster {
            width: 70000,
            height: 0,
            depth: 8,
            samples: Vec::new(),
        };
        let dir = tempfile::tempdir().unwrap();
        let err = write(dir.path().join("big.jpg"), &raster).unwrap_err();
        assert!(matches!(err, IoError::EncodeError(_)));
    }

    #[test]
    fn test_truncated_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();
        assert!(matches!(read(&path), Err(IoError::DecodeError(_))));
    }
}
