//! Haze removal.
//!
//! Four stages over float RGB planes in the processing transfer domain:
//!
//! 1. [`TMapEstimator`] - inverted transmission map (`1 - t` up to scale)
//! 2. [`atmospheric`] - global atmospheric light from the brightest map region
//! 3. [`recover`] - scene radiance `J = (I - A) / t + A`, blended by strength
//! 4. [`store`] - optional sharpening, quantile stretch, quantization
//!
//! Every stage takes its inputs by reference and returns owned results;
//! the output frame is only assembled after all of them succeed.
//!
//! # Example
//!
//! ```rust
//! use restore_core::Frame;
//! use restore_ops::haze::{remove_haze, HazeParams, TMapEstimator};
//!
//! let frame = Frame::new_rgb(0, 8, 8, 8).unwrap();
//! let params = HazeParams { sigmas: vec![2.0], ..Default::default() };
//! let out = remove_haze(&frame, &params, &TMapEstimator::Retinex).unwrap();
//! assert_eq!(out.format(), frame.format());
//! ```

pub mod atmospheric;
pub mod recover;
pub mod retinex;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, trace};

use restore_core::{Execution, Frame, PlaneFl, TransferChar};

use crate::{OpsError, OpsResult, Stage};

/// Lower clamp for luma and transmission values.
pub(crate) const EPS: f32 = 1e-6;

#[derive(Deserialize)]
#[serde(untagged)]
enum ModeRepr {
    Index(u8),
    Name(String),
}

/// Post-processing applied before quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "ModeRepr")]
pub enum PostProcess {
    /// Clip to range only
    None,
    /// Per-channel quantile stretch
    Stretch,
    /// Quantile stretch with thresholds measured on a Gaussian-smoothed copy
    SmoothedStretch,
    /// Unsharp mask, then quantile stretch
    #[default]
    SharpenStretch,
}

impl TryFrom<u8> for PostProcess {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, String> {
        match v {
            0 => Ok(Self::None),
            1 => Ok(Self::Stretch),
            2 => Ok(Self::SmoothedStretch),
            3 => Ok(Self::SharpenStretch),
            _ => Err(format!("post-process mode {} is not within 0..=3", v)),
        }
    }
}

impl FromStr for PostProcess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        if let Ok(i) = s.parse::<u8>() {
            return Self::try_from(i);
        }
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "stretch" => Ok(Self::Stretch),
            "smoothed-stretch" => Ok(Self::SmoothedStretch),
            "sharpen-stretch" => Ok(Self::SharpenStretch),
            other => Err(format!("unknown post-process mode '{}'", other)),
        }
    }
}

impl TryFrom<ModeRepr> for PostProcess {
    type Error = String;

    fn try_from(r: ModeRepr) -> Result<Self, String> {
        match r {
            ModeRepr::Index(i) => Self::try_from(i),
            ModeRepr::Name(s) => s.parse(),
        }
    }
}

/// How the luma reference for the transmission map is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "ModeRepr")]
pub enum LumaMode {
    /// `min(R, G, B)`
    Min,
    /// Matrix-weighted luma from the frame's color matrix
    #[default]
    Luma,
    /// `max(R, G, B)`
    Max,
}

impl TryFrom<u8> for LumaMode {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, String> {
        match v {
            0 => Ok(Self::Min),
            1 => Ok(Self::Luma),
            2 => Ok(Self::Max),
            _ => Err(format!("luma mode {} is not within 0..=2", v)),
        }
    }
}

impl FromStr for LumaMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        if let Ok(i) = s.parse::<u8>() {
            return Self::try_from(i);
        }
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(Self::Min),
            "luma" => Ok(Self::Luma),
            "max" => Ok(Self::Max),
            other => Err(format!("unknown luma mode '{}'", other)),
        }
    }
}

impl TryFrom<ModeRepr> for LumaMode {
    type Error = String;

    fn try_from(r: ModeRepr) -> Result<Self, String> {
        match r {
            ModeRepr::Index(i) => Self::try_from(i),
            ModeRepr::Name(s) => s.parse(),
        }
    }
}

/// Haze removal options.
///
/// Unset fields in a YAML config take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazeParams {
    /// Transfer characteristic the pipeline computes in
    pub transfer: TransferChar,
    /// Fraction of the brightest map pixels used for atmospheric light
    pub tmap_thr: f64,
    /// Upper bound of each atmospheric light component
    pub al_max: f32,
    /// Lower transmission clamp
    pub tmap_min: f32,
    /// Upper transmission clamp
    pub tmap_max: f32,
    /// Blend toward the fully dehazed radiance, 0 keeps the input
    pub strength: f32,
    /// Post-processing before quantization
    pub pp_mode: PostProcess,
    /// Gaussian sigma for smoothed/sharpened post-processing
    pub pp_sigma: f64,
    /// Fraction of samples clipped at the bottom by the stretch
    pub lower_thr: f64,
    /// Fraction of samples clipped at the top by the stretch
    pub upper_thr: f64,
    /// Histogram bins for quantile lookups
    pub hist_bins: usize,
    /// Luma reference for the Retinex estimator
    pub luma_mode: LumaMode,
    /// Retinex Gaussian scales in pixels
    pub sigmas: Vec<f64>,
    /// Traversal strategy
    pub execution: Execution,
}

impl Default for HazeParams {
    fn default() -> Self {
        Self {
            transfer: TransferChar::Bt709,
            tmap_thr: 0.001,
            al_max: 1.0,
            tmap_min: 0.1,
            tmap_max: 1.2,
            strength: 0.85,
            pp_mode: PostProcess::SharpenStretch,
            pp_sigma: 10.0,
            lower_thr: 0.05,
            upper_thr: 0.03,
            hist_bins: 1024,
            luma_mode: LumaMode::Luma,
            sigmas: vec![15.0, 80.0],
            execution: Execution::default(),
        }
    }
}

impl HazeParams {
    /// Checks every option against its domain.
    pub fn validate(&self) -> OpsResult<()> {
        let bad = |param, reason: String| Err(OpsError::invalid_parameter(Stage::Validate, param, reason));

        if !(0.0..=1.0).contains(&self.tmap_thr) {
            return bad("tmap_thr", format!("must be within [0, 1], got {}", self.tmap_thr));
        }
        if !(self.al_max > 0.0 && self.al_max.is_finite()) {
            return bad("al_max", format!("must be positive, got {}", self.al_max));
        }
        if !(self.tmap_min > 0.0 && self.tmap_min.is_finite()) {
            return bad("tmap_min", format!("must be positive, got {}", self.tmap_min));
        }
        if !(self.tmap_max >= self.tmap_min && self.tmap_max.is_finite()) {
            return bad(
                "tmap_max",
                format!("must be at least tmap_min ({}), got {}", self.tmap_min, self.tmap_max),
            );
        }
        if !(0.0..=1.0).contains(&self.strength) {
            return bad("strength", format!("must be within [0, 1], got {}", self.strength));
        }
        if !(self.pp_sigma > 0.0 && self.pp_sigma.is_finite()) {
            return bad("pp_sigma", format!("must be positive, got {}", self.pp_sigma));
        }
        if !(0.0..1.0).contains(&self.lower_thr) {
            return bad("lower_thr", format!("must be within [0, 1), got {}", self.lower_thr));
        }
        if !(0.0..1.0).contains(&self.upper_thr) {
            return bad("upper_thr", format!("must be within [0, 1), got {}", self.upper_thr));
        }
        if self.lower_thr + self.upper_thr >= 1.0 {
            return bad(
                "upper_thr",
                format!(
                    "lower_thr + upper_thr must stay below 1, got {}",
                    self.lower_thr + self.upper_thr
                ),
            );
        }
        if self.hist_bins < 2 {
            return bad("hist_bins", format!("must be at least 2, got {}", self.hist_bins));
        }
        if self.sigmas.is_empty() {
            return bad("sigmas", "needs at least one scale".to_string());
        }
        if let Some(s) = self.sigmas.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return bad("sigmas", format!("every scale must be positive, got {}", s));
        }
        Ok(())
    }
}

/// Float RGB planes handed to a transmission estimator.
pub type RgbPlanes = [PlaneFl; 3];

/// Custom transmission estimator: returns the inverted transmission map.
pub type TMapFn = dyn Fn(&RgbPlanes, &HazeParams) -> OpsResult<PlaneFl> + Send + Sync;

/// Strategy for the inverted transmission map.
#[derive(Clone, Default)]
pub enum TMapEstimator {
    /// Multi-scale Retinex over the luma reference
    #[default]
    Retinex,
    /// Caller-supplied estimator
    Custom(Arc<TMapFn>),
}

impl fmt::Debug for TMapEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retinex => f.write_str("Retinex"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl TMapEstimator {
    /// Wraps a closure as a custom estimator.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&RgbPlanes, &HazeParams) -> OpsResult<PlaneFl> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Runs the estimator.
    pub fn estimate(
        &self,
        rgb: &RgbPlanes,
        params: &HazeParams,
        frame: &Frame,
    ) -> OpsResult<PlaneFl> {
        let map = match self {
            Self::Retinex => retinex::tmap_inv(rgb, params, frame.color_matrix())?,
            Self::Custom(f) => f(rgb, params)?,
        };
        if (map.width(), map.height()) != (rgb[0].width(), rgb[0].height()) {
            return Err(OpsError::precondition(
                Stage::TransmissionMap,
                format!(
                    "estimator returned a {}x{} map for a {}x{} frame",
                    map.width(),
                    map.height(),
                    rgb[0].width(),
                    rgb[0].height()
                ),
            ));
        }
        Ok(map)
    }
}

/// Checks that `input` can go through the pipeline.
fn validate_input(input: &Frame) -> OpsResult<()> {
    let (r, _, _) = input
        .rgb()
        .map_err(|e| OpsError::precondition(Stage::Validate, e.to_string()))?;
    input
        .validate()
        .map_err(|e| OpsError::precondition(Stage::Validate, e.to_string()))?;
    if input.is_empty() {
        return Err(OpsError::precondition(Stage::Validate, "input frame is empty"));
    }
    if r.value_range() == 0 {
        return Err(OpsError::precondition(
            Stage::Validate,
            "input value range is zero",
        ));
    }
    Ok(())
}

/// Removes haze from an RGB frame.
///
/// Returns a new frame with the input's format; alpha is carried over.
pub fn remove_haze(input: &Frame, params: &HazeParams, estimator: &TMapEstimator) -> OpsResult<Frame> {
    trace!(
        width = input.width(),
        height = input.height(),
        strength = params.strength,
        estimator = ?estimator,
        "haze::remove_haze"
    );
    params.validate()?;
    validate_input(input)?;

    let (r, g, b) = input.rgb()?;
    let rgb: RgbPlanes = [
        PlaneFl::from_plane_as(r, params.transfer),
        PlaneFl::from_plane_as(g, params.transfer),
        PlaneFl::from_plane_as(b, params.transfer),
    ];

    let tmap_inv = estimator.estimate(&rgb, params, input)?;
    debug!(stage = %Stage::TransmissionMap, "inverted transmission map ready");

    let atmos = atmospheric::atmospheric_light(&rgb, &tmap_inv, params)?;
    debug!(stage = %Stage::AtmosphericLight, r = atmos[0], g = atmos[1], b = atmos[2], "atmospheric light");

    let recovered = recover::recover(&rgb, &tmap_inv, atmos, params)?;
    debug!(stage = %Stage::HazeRemoval, "scene radiance recovered");

    let out = store::store(input, recovered, params)?;
    debug!(stage = %Stage::StoreResult, "haze removal done");
    Ok(out)
}
