//! Error types for restore-core operations.
//!
//! # Overview
//!
//! The [`Error`] enum covers failures while building or combining planes
//! and frames:
//! - geometry problems (zero or overflowing dimensions, size mismatches)
//! - quantization descriptors that break `floor <= neutral <= ceil`
//! - frames assembled with missing or inconsistent planes
//!
//! # Usage
//!
//! ```rust
//! use restore_core::{Error, Result};
//!
//! fn check(width: usize, height: usize) -> Result<()> {
//!     if width == 0 || height == 0 {
//!         return Err(Error::invalid_dimensions(width, height, "zero area"));
//!     }
//!     Ok(())
//! }
//! assert!(check(0, 4).is_err());
//! ```

use crate::color::Channel;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the plane and frame types.
#[derive(Debug, Error)]
pub enum Error {
    /// Width/height are zero or overflow the buffer size computation.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Two planes that must share geometry do not.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First plane width
        a_width: usize,
        /// First plane height
        a_height: usize,
        /// Second plane width
        b_width: usize,
        /// Second plane height
        b_height: usize,
    },

    /// Quantization parameters break the range invariant.
    ///
    /// Requires `floor <= neutral <= ceil < 2^bit_depth` and a supported bit depth.
    #[error("invalid quantization: bit depth {bit_depth}, floor {floor}, neutral {neutral}, ceil {ceil} ({reason})")]
    InvalidQuantization {
        /// Bit depth
        bit_depth: u8,
        /// Lower clamp bound
        floor: u32,
        /// Zero point
        neutral: u32,
        /// Upper clamp bound
        ceil: u32,
        /// Which invariant failed
        reason: String,
    },

    /// The frame's pixel type does not carry the requested channel.
    #[error("channel {channel:?} is not present in a {pixel_type} frame")]
    MissingChannel {
        /// Requested channel
        channel: Channel,
        /// Pixel type of the frame
        pixel_type: String,
    },

    /// A plane handed to a frame disagrees with the frame format.
    #[error("plane {channel:?} does not match frame format: {reason}")]
    PlaneMismatch {
        /// Offending channel
        channel: Channel,
        /// What disagreed
        reason: String,
    },

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: usize, height: usize, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (usize, usize), b: (usize, usize)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Creates an [`Error::PlaneMismatch`] error.
    #[inline]
    pub fn plane_mismatch(channel: Channel, reason: impl Into<String>) -> Self {
        Self::PlaneMismatch {
            channel,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::Other`] error.
    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Returns `true` for geometry errors.
    #[inline]
    pub fn is_dimension_error(&self) -> bool {
        matches!(self, Self::InvalidDimensions { .. } | Self::DimensionMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::dimension_mismatch((100, 100), (200, 50));
        let msg = err.to_string();
        assert!(msg.contains("100x100"));
        assert!(msg.contains("200x50"));
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_missing_channel_message() {
        let err = Error::MissingChannel {
            channel: Channel::U,
            pixel_type: "RGB".into(),
        };
        assert!(err.to_string().contains("U"));
        assert!(!err.is_dimension_error());
    }
}
