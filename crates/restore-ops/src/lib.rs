//! # restore-ops
//!
//! Restoration filters over restore-core frames.
//!
//! # Modules
//!
//! - [`highlight`] - specular highlight removal (iterative bilateral refinement)
//! - [`haze`] - haze removal (Retinex transmission estimate, radiance recovery)
//! - [`bilateral`] - joint bilateral smoothing, brute force or PBFIC
//! - [`gaussian`] - separable Gaussian blur
//! - [`histogram`] - quantile lookups
//!
//! Every filter reads its input frame by reference and returns a new frame
//! with the same format.
//!
//! # Common Operations
//!
//! ## Highlight removal
//!
//! ```rust,ignore
//! use restore_ops::highlight::{remove_highlights, HighlightParams};
//!
//! let out = remove_highlights(&frame, &HighlightParams::default())?;
//! if !out.converged {
//!     eprintln!("stopped after {} iterations", out.iterations);
//! }
//! ```
//!
//! ## Haze removal
//!
//! ```rust,ignore
//! use restore_ops::haze::{remove_haze, HazeParams, TMapEstimator};
//!
//! let params = HazeParams { strength: 0.7, ..Default::default() };
//! let out = remove_haze(&frame, &params, &TMapEstimator::Retinex)?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod bilateral;
pub mod gaussian;
pub mod haze;
pub mod highlight;
pub mod histogram;

pub use error::{OpsError, OpsResult, Stage};
pub use bilateral::{GuidedSmoother, JointBilateral};
pub use haze::{remove_haze, HazeParams, LumaMode, PostProcess, TMapEstimator};
pub use highlight::{remove_highlights, remove_highlights_with, HighlightOutput, HighlightParams};
