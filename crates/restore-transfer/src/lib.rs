//! # restore-transfer
//!
//! Transfer characteristics for quantized planes.
//!
//! Every sample stored in a `restore-core` plane is tagged with the curve it
//! was encoded under. This crate holds the curves themselves as plain `f32`
//! functions over normalized values, so the plane and frame types can
//! re-express samples under a different characteristic.
//!
//! # Terminology
//!
//! - **OETF** (Opto-Electronic Transfer Function): linear -> encoded
//! - **EOTF** (Electro-Optical Transfer Function): encoded -> linear
//!
//! # Supported Curves
//!
//! | Module | Characteristic | Range |
//! |--------|----------------|-------|
//! | [`rec709`] | BT.709 / BT.601 / BT.2020 camera curve | [0, 1] |
//! | [`srgb`] | IEC 61966-2-1 | [0, 1] |
//! | [`gamma`] | BT.470 M (2.2) and BT.470 BG (2.8) | [0, 1] |
//! | [`smpte240m`] | SMPTE 240M | [0, 1] |
//! | [`log`] | logarithmic, 100:1 and 316.22777:1 | [0, 1] |
//! | [`pq`] | SMPTE ST 2084, relative to 10000 cd/m2 | [0, 1] |
//! | [`hlg`] | ARIB STD-B67 | [0, 1] |
//!
//! # Usage
//!
//! ```rust
//! use restore_transfer::{rec709, srgb};
//!
//! // Re-express an sRGB sample under the BT.709 curve
//! let linear = srgb::eotf(0.5);
//! let encoded = rec709::oetf(linear);
//! assert!(encoded > 0.0 && encoded < 1.0);
//! ```
//!
//! # Used By
//!
//! - `restore-core` - `TransferChar::to_linear` / `TransferChar::from_linear`

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod gamma;
pub mod hlg;
pub mod log;
pub mod pq;
pub mod rec709;
pub mod smpte240m;
pub mod srgb;

pub use gamma::{gamma_eotf, gamma_oetf};
pub use hlg::{eotf as hlg_eotf, oetf as hlg_oetf};
pub use pq::{eotf as pq_eotf, oetf as pq_oetf};
pub use rec709::{eotf as rec709_eotf, oetf as rec709_oetf};
pub use srgb::{eotf as srgb_eotf, oetf as srgb_oetf};
