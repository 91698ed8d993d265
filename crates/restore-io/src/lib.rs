//! # restore-io
//!
//! PNG and JPEG marshalling for restore-rs frames.
//!
//! - [`read`] decodes a file into an sRGB-tagged RGB [`Frame`] at a chosen
//!   bit depth
//! - [`read_or_default`] does the same but logs failures and hands back a
//!   placeholder frame
//! - [`write`] quantizes a frame to 8-bit RGB and encodes it by extension
//!
//! Grayscale input is expanded to RGB and alpha is dropped.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use restore_io::{read, write};
//!
//! let frame = read("input.png", 0, 16)?;
//! write(&frame, "output.png")?;
//! ```
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Bit Depths |
//! |--------|------|-------|------------|
//! | PNG | Yes | Yes | read 8, 16; write 8 |
//! | JPEG | Yes | Yes | read 8, 16 gray; write 8 |
//!
//! # Feature Flags
//!
//! - `png` - PNG support (default)
//! - `jpeg` - JPEG support (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;
pub mod raster;

#[cfg(feature = "png")]
pub mod png;

#[cfg(feature = "jpeg")]
pub mod jpeg;

pub use detect::Format;
pub use error::{IoError, IoResult};
pub use raster::Raster;

use restore_core::Frame;
use std::path::Path;
use tracing::{debug, error, trace};

/// Decodes a file into a [`Raster`], detecting the format.
pub fn read_raster<P: AsRef<Path>>(path: P) -> IoResult<Raster> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    debug!(path = %path.display(), format = format.name(), "decoding");
    match format {
        #[cfg(feature = "png")]
        Format::Png => png::read(path),
        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::read(path),
        #[allow(unreachable_patterns)]
        _ => Err(IoError::UnsupportedFormat(format!(
            "{}: {} input",
            path.display(),
            format.name()
        ))),
    }
}

/// Reads an image as an RGB frame of `bit_depth` bits, tagged sRGB.
///
/// 8-bit sources map to 16-bit frames as `x * 257`; other remaps go
/// through a lookup table.
pub fn read<P: AsRef<Path>>(path: P, frame_num: usize, bit_depth: u8) -> IoResult<Frame> {
    trace!(path = %path.as_ref().display(), frame_num, bit_depth, "io::read");
    read_raster(path)?.into_frame(frame_num, bit_depth)
}

/// Like [`read`], but logs the failure and returns `Frame::default()`.
///
/// Callers can detect the placeholder with [`Frame::is_empty`].
pub fn read_or_default<P: AsRef<Path>>(path: P, frame_num: usize, bit_depth: u8) -> Frame {
    let path = path.as_ref();
    match read(path, frame_num, bit_depth) {
        Ok(frame) => frame,
        Err(e) => {
            error!(path = %path.display(), error = %e, "could not read image");
            Frame::default()
        }
    }
}

/// Writes the RGB planes of `frame` as 8-bit, choosing the codec by extension.
///
/// 16-bit samples map as `(x + 128) / 257`; other depths go through a
/// lookup table.
pub fn write<P: AsRef<Path>>(frame: &Frame, path: P) -> IoResult<()> {
    let path = path.as_ref();
    trace!(path = %path.display(), width = frame.width(), height = frame.height(), "io::write");
    let format = Format::from_extension(path);
    let raster = Raster::from_frame(frame)?;
    match format {
        #[cfg(feature = "png")]
        Format::Png => png::write(path, &raster),
        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::write(path, &raster),
        #[allow(unreachable_patterns)]
        _ => Err(IoError::UnsupportedFormat(format!(
            "{}: cannot encode {} output",
            path.display(),
            format.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restore_core::TransferChar;

    fn sample_frame() -> Frame {
        let mut f = Frame::new_rgb(7, 4, 3, 8).unwrap();
        let (r, g, b) = f.rgb_mut().unwrap();
        for y in 0..3 {
            for x in 0..4 {
                r.set(x, y, (x * 60) as u32);
                g.set(x, y, (y * 100) as u32);
                b.set(x, y, 200);
            }
        }
        f
    }

    #[test]
    fn test_png_frame_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let frame = sample_frame();
        write(&frame, &path).unwrap();

        let back = read(&path, 7, 8).unwrap();
        assert_eq!(back.transfer(), TransferChar::Srgb);
        assert_eq!(back.frame_num(), 7);
        assert_eq!(back.r(), frame.r());
        assert_eq!(back.g(), frame.g());
        assert_eq!(back.b(), frame.b());
    }

    #[test]
    fn test_read_at_16_bits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        write(&sample_frame(), &path).unwrap();
        let back = read(&path, 0, 16).unwrap();
        assert_eq!(back.bit_depth(), 16);
        assert_eq!(back.b().unwrap().get(0, 0), 200 * 257);
    }

    #[test]
    fn test_missing_file_yields_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let frame = read_or_default(dir.path().join("nope.png"), 3, 16);
        assert!(frame.is_empty());
        assert_eq!(frame, Frame::default());
    }

    #[test]
    fn test_unknown_output_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = write(&sample_frame(), dir.path().join("out.bmp")).unwrap_err();
        assert!(matches!(err, IoError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_unknown_input_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"plain bytes").unwrap();
        assert!(matches!(read(&path, 0, 8), Err(IoError::UnsupportedFormat(_))));
    }
}
