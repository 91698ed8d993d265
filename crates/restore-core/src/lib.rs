//! # restore-core
//!
//! Pixel-buffer data model for restore-rs.
//!
//! - [`Quantization`], [`FloatRange`] - how samples map to normalized values
//! - [`Plane`] - fixed-point plane with quantization metadata
//! - [`PlaneFl`] - float plane with range metadata
//! - [`Frame`], [`FrameFormat`] - multi-plane frame with shared color metadata
//! - [`exec`] - parallel traversal over planes (`transform`, `convolute`)
//!
//! ## Crate Structure
//!
//! ```text
//! restore-transfer (curves)
//!    ^
//!    |
//! restore-core (this crate)
//!    ^
//!    +-- restore-ops (highlight and haze removal)
//!    +-- restore-io (PNG / JPEG marshalling)
//!    +-- restore-cli
//! ```
//!
//! ## Example
//!
//! ```rust
//! use restore_core::{Frame, PlaneFl, Plane};
//!
//! let frame = Frame::new_rgb(0, 4, 4, 8).unwrap();
//! let r = frame.r().unwrap();
//! let fl = PlaneFl::from_plane(r);
//! let back = Plane::from_float(&fl, *r.quant());
//! assert_eq!(&back, r);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod color;
pub mod error;
pub mod exec;
pub mod frame;
pub mod plane;
pub mod plane_fl;
pub mod quant;

pub use color::{
    Channel, ChromaPlacement, ColorMatrix, ColorPrim, PixelType, QuantRange, TransferChar,
};
pub use error::{Error, Result};
pub use exec::{Execution, PlaneBuf, PlaneBufMut, Window};
pub use frame::{Frame, FrameFormat};
pub use plane::Plane;
pub use plane_fl::PlaneFl;
pub use quant::{max_value, FloatRange, Quantization, Sample, MAX_BIT_DEPTH};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::color::{Channel, PixelType, QuantRange, TransferChar};
    pub use crate::error::{Error, Result};
    pub use crate::exec::{convolute, transform, Execution, PlaneBuf, PlaneBufMut};
    pub use crate::frame::{Frame, FrameFormat};
    pub use crate::plane::Plane;
    pub use crate::plane_fl::PlaneFl;
    pub use crate::quant::{FloatRange, Quantization, Sample};
}
