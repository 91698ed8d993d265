//! PNG decoding and encoding.
//!
//! Reads 8- and 16-bit gray, gray+alpha, RGB, RGBA and palette images
//! (palette and sub-byte gray are expanded by the decoder). Writes 8-bit
//! RGB with an sRGB chunk.

use crate::raster::Raster;
use crate::{IoError, IoResult};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Decodes a PNG file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Raster> {
    let file = File::open(path.as_ref())?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    let bytes = &buf[..info.buffer_size()];
    let (width, height) = (info.width as usize, info.height as usize);

    let stride = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        other => {
            return Err(IoError::DecodeError(format!(
                "unexpanded color type {:?}",
                other
            )));
        }
    };
    let (depth, samples): (u8, Vec<u16>) = match info.bit_depth {
        png::BitDepth::Eight => (8, bytes.iter().map(|&b| b as u16).collect()),
        png::BitDepth::Sixteen => (16, bytes_to_u16(bytes)),
        other => {
            return Err(IoError::UnsupportedBitDepth(format!("PNG {:?}", other)));
        }
    };

    Raster::from_interleaved(width, height, depth, &samples, stride)
}

/// Encodes an 8-bit RGB raster.
pub fn write<P: AsRef<Path>>(path: P, raster: &Raster) -> IoResult<()> {
    let width = u32::try_from(raster.width)
        .map_err(|_| IoError::EncodeError(format!("width {} too large", raster.width)))?;
    let height = u32::try_from(raster.height)
        .map_err(|_| IoError::EncodeError(format!("height {} too large", raster.height)))?;

    let file = File::create(path.as_ref())?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::default());
    encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    writer
        .write_image_data(&raster.to_rgb8())
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    Ok(())
}

/// Big-endian byte pairs to samples.
fn bytes_to_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: usize, h: usize) -> Raster {
        let bytes: Vec<u8> = (0..h)
            .flat_map(|y| (0..w).flat_map(move |x| [(x * 8) as u8, (y * 8) as u8, 128]))
            .collect();
        Raster::from_rgb8(w, h, &bytes).unwrap()
    }

    #[test]
    fn test_roundtrip_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        let raster = gradient(32, 16);
        write(&path, &raster).unwrap();
        let loaded = read(&path).unwrap();
        assert_eq!(loaded, raster);
    }

    #[test]
    fn test_read_gray16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray16.png");
        {
            let file = File::create(&path).unwrap();
            let mut enc = png::Encoder::new(BufWriter::new(file), 2, 1);
            enc.set_color(png::ColorType::Grayscale);
            enc.set_depth(png::BitDepth::Sixteen);
            let mut w = enc.write_header().unwrap();
            w.write_image_data(&[0x12, 0x34, 0xFF, 0xFF]).unwrap();
        }
        let loaded = read(&path).unwrap();
        assert_eq!(loaded.depth, 16);
        assert_eq!(loaded.samples, vec![0x1234, 0x1234, 0x1234, 0xFFFF, 0xFFFF, 0xFFFF]);
    }

    #[test]
    fn test_read_rgba_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgba.png");
        {
            let file = File::create(&path).unwrap();
            let mut enc = png::Encoder::new(BufWriter::new(file), 1, 1);
            enc.set_color(png::ColorType::Rgba);
            enc.set_depth(png::BitDepth::Eight);
            let mut w = enc.write_header().unwrap();
            w.write_image_data(&[10, 20, 30, 40]).unwrap();
        }
        assert_eq!(read(&path).unwrap().samples, vec![10, 20, 30]);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot really").unwrap();
        assert!(matches!(read(&path), Err(IoError::DecodeError(_))));
    }
}
