//! Specular highlight removal.
//!
//! Separates the diffuse component of an RGB frame using the maximum
//! chromaticity diffusion of Yang, Wang and Ahuja ("Real-time specular
//! highlight removal using bilateral filtering", ECCV 2010).
//!
//! # Algorithm
//!
//! 1. Per pixel, chromaticity `sigma_c = c / (R + G + B)` (1/3 each for black)
//!    and its max/min.
//! 2. `PsigmaMax = sigmaMax * VR`, `PlambdaMax = (sigmaMax - sigmaMin) / (1 - 3 sigmaMin) * VR`,
//!    both rounded half up into `[0, VR]` helper planes.
//! 3. Repeat: joint-bilateral filter `PsigmaMax` guided by `PlambdaMax`,
//!    raise `PsigmaMax` wherever the filtered value is larger, until no
//!    pixel rises by more than `threshold * VR` (or `max_iterations` passes).
//! 4. With `s = PsigmaMax / VR`, pixels where `3 * PsigmaMax <= VR` are
//!    copied; others lose `(max(R,G,B) - s (R+G+B)) / (1 - 3s)` per channel.
//!
//! # Example
//!
//! ```rust
//! use restore_core::Frame;
//! use restore_ops::highlight::{remove_highlights, HighlightParams};
//!
//! let mut frame = Frame::new_rgb(0, 2, 2, 8).unwrap();
//! for (_, plane) in frame.planes_mut() {
//!     plane.data_mut().fill(128);
//! }
//! let out = remove_highlights(&frame, &HighlightParams::default()).unwrap();
//! assert_eq!(out.frame, frame);
//! assert!(out.converged);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use restore_core::exec::transform;
use restore_core::{Execution, Frame, Plane, Quantization, Sample, TransferChar};

use crate::bilateral::{GuidedSmoother, JointBilateral};
use crate::{OpsError, OpsResult, Stage};

/// Default refinement pass limit.
pub const DEFAULT_MAX_ITERATIONS: usize = 256;

/// Highlight removal options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightParams {
    /// Convergence threshold as a fraction of the value range, in (0, 1)
    pub threshold: f64,
    /// Bilateral spatial sigma in pixels
    pub sigma_s: f64,
    /// Bilateral range sigma as a fraction of the value range
    pub sigma_r: f64,
    /// PBFIC levels; 0 for the brute-force filter
    pub pbfic_num: usize,
    /// Refinement pass limit
    pub max_iterations: usize,
    /// Traversal strategy
    pub execution: Execution,
}

impl Default for HighlightParams {
    fn default() -> Self {
        Self {
            threshold: 0.03,
            sigma_s: 3.0,
            sigma_r: 0.1,
            pbfic_num: 8,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            execution: Execution::default(),
        }
    }
}

impl HighlightParams {
    /// Checks every option against its domain.
    pub fn validate(&self) -> OpsResult<()> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(OpsError::invalid_parameter(
                Stage::Validate,
                "threshold",
                format!("must be within (0, 1), got {}", self.threshold),
            ));
        }
        if !(self.sigma_s.is_finite() && self.sigma_s > 0.0) {
            return Err(OpsError::invalid_parameter(
                Stage::Validate,
                "sigma_s",
                format!("must be positive, got {}", self.sigma_s),
            ));
        }
        if !(self.sigma_r.is_finite() && self.sigma_r > 0.0) {
            return Err(OpsError::invalid_parameter(
                Stage::Validate,
                "sigma_r",
                format!("must be positive, got {}", self.sigma_r),
            ));
        }
        if self.pbfic_num == 1 {
            return Err(OpsError::invalid_parameter(
                Stage::Validate,
                "pbfic_num",
                "must be 0 (brute force) or at least 2",
            ));
        }
        if self.max_iterations == 0 {
            return Err(OpsError::invalid_parameter(
                Stage::Validate,
                "max_iterations",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Bilateral filter configured from these options.
    pub fn smoother(&self) -> OpsResult<JointBilateral> {
        Ok(JointBilateral::new(self.sigma_s, self.sigma_r, self.pbfic_num)?
            .with_execution(self.execution))
    }
}

/// Result of [`remove_highlights`].
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightOutput {
    /// Diffuse-only frame, same format as the input
    pub frame: Frame,
    /// Refinement passes run
    pub iterations: usize,
    /// `false` when the pass limit stopped refinement
    pub converged: bool,
}

/// Largest and smallest chromaticity `c / (R+G+B)` of one pixel.
///
/// Black is treated as achromatic: both bounds are 1/3.
fn chromaticity_bounds(r: Sample, g: Sample, b: Sample) -> (f64, f64) {
    let (rv, gv, bv) = (r as f64, g as f64, b as f64);
    let sum = rv + gv + bv;
    if sum == 0.0 {
        return (1.0 / 3.0, 1.0 / 3.0);
    }
    let (sr, sg, sb) = (rv / sum, gv / sum, bv / sum);
    (sr.max(sg).max(sb), sr.min(sg).min(sb))
}

/// Removes specular highlights with the joint bilateral filter.
pub fn remove_highlights(input: &Frame, params: &HighlightParams) -> OpsResult<HighlightOutput> {
    params.validate()?;
    let smoother = params.smoother()?;
    remove_highlights_with(input, params, &smoother)
}

/// Removes specular highlights with a caller-supplied smoother.
pub fn remove_highlights_with(
    input: &Frame,
    params: &HighlightParams,
    smoother: &dyn GuidedSmoother,
) -> OpsResult<HighlightOutput> {
    trace!(
        width = input.width(),
        height = input.height(),
        threshold = params.threshold,
        "highlight::remove_highlights"
    );
    params.validate()?;

    let (r, g, b) = input
        .rgb()
        .map_err(|e| OpsError::precondition(Stage::Validate, e.to_string()))?;
    input
        .validate()
        .map_err(|e| OpsError::precondition(Stage::Validate, e.to_string()))?;
    let value_range = r.value_range();
    if value_range == 0 {
        return Err(OpsError::precondition(
            Stage::Validate,
            "input value range is zero",
        ));
    }
    if input.is_empty() {
        return Ok(HighlightOutput {
            frame: input.clone(),
            iterations: 0,
            converged: true,
        });
    }
    let exec = params.execution;
    let vr = value_range as f64;

    // Helper planes live in [0, VR].
    let helper = Quantization::new(r.bit_depth(), 0, 0, value_range, TransferChar::Linear)?;
    let mut p_sigma_max = Plane::new(0, r.width(), r.height(), helper)?;
    let mut p_lambda_max = Plane::new(0, r.width(), r.height(), helper)?;

    let (rs, gs, bs) = (r.data(), g.data(), b.data());
    let chroma = |i: usize| chromaticity_bounds(rs[i], gs[i], bs[i]);
    transform(exec, &mut p_sigma_max, |i| {
        let (max, _) = chroma(i);
        (max * vr + 0.5) as Sample
    });
    transform(exec, &mut p_lambda_max, |i| {
        let (max, min) = chroma(i);
        if max == min {
            0
        } else {
            (((max - min) / (1.0 - 3.0 * min) * vr + 0.5) as Sample).min(value_range)
        }
    });
    debug!(stage = %Stage::Chromaticity, "chromaticity planes ready");

    let diff_thr = (params.threshold * vr + 0.5) as Sample;
    let mut iterations = 0;
    let mut converged = false;
    while iterations < params.max_iterations {
        iterations += 1;
        let filtered = smoother.smooth(&p_sigma_max, &p_lambda_max)?;
        if (filtered.width(), filtered.height()) != (p_sigma_max.width(), p_sigma_max.height()) {
            return Err(OpsError::precondition(
                Stage::Refinement,
                "smoother changed the plane size",
            ));
        }

        let mut raised = 0usize;
        for (p, &f) in p_sigma_max.data_mut().iter_mut().zip(filtered.data()) {
            let f = f.min(value_range);
            if f > *p {
                if f - *p > diff_thr {
                    raised += 1;
                }
                *p = f;
            }
        }
        debug!(iteration = iterations, raised, "refinement pass");
        if raised == 0 {
            converged = true;
            break;
        }
    }
    if !converged {
        warn!(
            iterations,
            "highlight refinement stopped at the iteration limit before converging"
        );
    }

    // Alpha and metadata carry over; color planes are rewritten below.
    let mut out = input.clone();
    {
        let ps = p_sigma_max.data();
        let (ro, go, bo) = out.rgb_mut()?;
        let quant = *r.quant();
        let diffuse = |i: usize| -> [Sample; 3] {
            let src = [rs[i], gs[i], bs[i]];
            if ps[i] as u64 * 3 <= value_range as u64 {
                return src;
            }
            let s = ps[i] as f64 / vr;
            let max = src[0].max(src[1]).max(src[2]) as f64;
            let sum = (src[0] + src[1] + src[2]) as f64;
            let spec = (max - s * sum) / (1.0 - 3.0 * s);
            src.map(|c| quant.quantize((c as f64 - spec) as f32))
        };
        transform(exec, ro, |i| diffuse(i)[0]);
        transform(exec, go, |i| diffuse(i)[1]);
        transform(exec, bo, |i| diffuse(i)[2]);
    }
    debug!(stage = %Stage::Diffuse, iterations, converged, "diffuse component written");

    Ok(HighlightOutput {
        frame: out,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use restore_core::{Channel, FrameFormat, PixelType};

    fn rgb_frame(w: usize, h: usize, bits: u8, px: impl Fn(usize, usize) -> [Sample; 3]) -> Frame {
        let mut f = Frame::new_rgb(0, w, h, bits).unwrap();
        let (r, g, b) = f.rgb_mut().unwrap();
        for y in 0..h {
            for x in 0..w {
                let [rv, gv, bv] = px(x, y);
                r.set(x, y, rv);
                g.set(x, y, gv);
                b.set(x, y, bv);
            }
        }
        f
    }

    #[test]
    fn test_params_validation() {
        assert!(HighlightParams::default().validate().is_ok());
        let bad = [
            HighlightParams { threshold: 0.0, ..Default::default() },
            HighlightParams { threshold: 1.0, ..Default::default() },
            HighlightParams { sigma_s: 0.0, ..Default::default() },
            HighlightParams { sigma_r: f64::NAN, ..Default::default() },
            HighlightParams { pbfic_num: 1, ..Default::default() },
            HighlightParams { max_iterations: 0, ..Default::default() },
        ];
        for p in bad {
            let err = p.validate().unwrap_err();
            assert_eq!(err.stage(), Some(Stage::Validate));
        }
    }

    #[test]
    fn test_params_from_yaml() {
        let p: HighlightParams = serde_yaml::from_str("threshold: 0.05\npbfic_num: 0\n").unwrap();
        assert_eq!(p.threshold, 0.05);
        assert_eq!(p.pbfic_num, 0);
        assert_eq!(p.max_iterations, DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn test_achromatic_frame_unchanged() {
        let frame = rgb_frame(2, 2, 8, |_, _| [128, 128, 128]);
        for pbfic in [0, 8] {
            let params = HighlightParams {
                pbfic_num: pbfic,
                ..Default::default()
            };
            let out = remove_highlights(&frame, &params).unwrap();
            assert_eq!(out.frame, frame);
            assert!(out.converged);
            assert_eq!(out.iterations, 1);
        }
    }

    #[test]
    fn test_highlight_pixel_is_reduced() {
        let frame = rgb_frame(3, 3, 8, |x, y| {
            if (x, y) == (1, 1) {
                [255, 255, 255]
            } else {
                [200, 50, 50]
            }
        });
        let params = HighlightParams {
            threshold: 0.05,
            sigma_s: 1.0,
            sigma_r: 1.0,
            pbfic_num: 0,
            ..Default::default()
        };
        let out = remove_highlights(&frame, &params).unwrap();
        assert!(out.converged);

        let (r, g, b) = out.frame.rgb().unwrap();
        let (rc, gc, bc) = (r.get(1, 1), g.get(1, 1), b.get(1, 1));
        assert!(rc + gc + bc < 765);
        assert!(rc >= gc && gc >= bc);
        for (x, y) in [(0, 0), (2, 1), (1, 2)] {
            assert_eq!((r.get(x, y), g.get(x, y), b.get(x, y)), (200, 50, 50));
        }
    }

    #[test]
    fn test_black_pixels_pass_through() {
        let frame = rgb_frame(2, 1, 8, |x, _| if x == 0 { [0, 0, 0] } else { [10, 10, 10] });
        let out = remove_highlights(&frame, &HighlightParams::default()).unwrap();
        assert_eq!(out.frame, frame);
    }

    #[test]
    fn test_output_stays_in_range() {
        let frame = rgb_frame(4, 4, 10, |x, y| {
            let v = ((x * 97 + y * 311) % 1024) as Sample;
            [v, 1023 - v, (v / 2) + 100]
        });
        let out = remove_highlights(&frame, &HighlightParams::default()).unwrap();
        for (_, p) in out.frame.planes() {
            assert!(p.data().iter().all(|&v| v <= 1023));
        }
        assert_eq!(out.frame.format(), frame.format());
    }

    struct AlwaysRaise(Sample);

    impl GuidedSmoother for AlwaysRaise {
        fn smooth(&self, src: &Plane, _guide: &Plane) -> OpsResult<Plane> {
            let mut out = src.clone();
            let ceil = src.ceil();
            for v in out.data_mut() {
                *v = (*v + self.0).min(ceil);
            }
            Ok(out)
        }
    }

    #[test]
    fn test_iteration_cap_is_reported() {
        let frame = rgb_frame(2, 2, 16, |_, _| [30000, 20000, 10000]);
        let params = HighlightParams {
            threshold: 0.05,
            max_iterations: 3,
            ..Default::default()
        };
        let out = remove_highlights_with(&frame, &params, &AlwaysRaise(5000)).unwrap();
        assert!(!out.converged);
        assert_eq!(out.iterations, 3);
    }

    #[test]
    fn test_zero_value_range_rejected() {
        let q = Quantization::new(8, 7, 7, 7, TransferChar::Bt709).unwrap();
        let p = Plane::new(7, 2, 2, q).unwrap();
        let frame = Frame::from_planes(
            0,
            FrameFormat::rgb(2, 2, 8),
            vec![(Channel::R, p.clone()), (Channel::G, p.clone()), (Channel::B, p)],
        )
        .unwrap();
        let err = remove_highlights(&frame, &HighlightParams::default()).unwrap_err();
        assert!(matches!(err, OpsError::Precondition { stage: Stage::Validate, .. }));
    }

    #[test]
    fn test_yuv_input_rejected() {
        let frame = Frame::new(0, FrameFormat::yuv(PixelType::Yuv444, 2, 2, 8)).unwrap();
        let err = remove_highlights(&frame, &HighlightParams::default()).unwrap_err();
        assert!(matches!(err, OpsError::Precondition { .. }));
    }

    #[test]
    fn test_chromaticity_bounds() {
        assert_eq!(chromaticity_bounds(0, 0, 0), (1.0 / 3.0, 1.0 / 3.0));
        assert_eq!(chromaticity_bounds(7, 7, 7), (1.0 / 3.0, 1.0 / 3.0));
        assert_eq!(chromaticity_bounds(0, 0, 255), (1.0, 0.0));
        for r in (0..=1023).step_by(31) {
            for g in (0..=1023).step_by(47) {
                for b in (0..=1023).step_by(89) {
                    let (max, min) = chromaticity_bounds(r, g, b);
                    assert!((1.0 / 3.0 - 1e-12..=1.0).contains(&max), "{r} {g} {b}: {max}");
                    assert!((0.0..=1.0 / 3.0 + 1e-12).contains(&min), "{r} {g} {b}: {min}");
                }
            }
        }
    }

    fn spotted_frame() -> Frame {
        rgb_frame(4, 4, 8, |x, y| match (x, y) {
            (1, 1) => [255, 240, 230],
            (2, 2) => [0, 0, 0],
            _ => [180, 90, 40 + (x * 10) as Sample],
        })
    }

    /// Filters to all zeros.
    struct Zeros;

    impl GuidedSmoother for Zeros {
        fn smooth(&self, src: &Plane, _guide: &Plane) -> OpsResult<Plane> {
            let mut out = src.clone();
            out.data_mut().iter_mut().for_each(|v| *v = 0);
            Ok(out)
        }
    }

    /// Returns the input unchanged.
    struct Identity;

    impl GuidedSmoother for Identity {
        fn smooth(&self, src: &Plane, _guide: &Plane) -> OpsResult<Plane> {
            Ok(src.clone())
        }
    }

    /// Fills the plane with `ceil + extra`, past the helper range.
    struct Overshoot(Sample);

    impl GuidedSmoother for Overshoot {
        fn smooth(&self, src: &Plane, _guide: &Plane) -> OpsResult<Plane> {
            let mut out = src.clone();
            let v = src.ceil() + self.0;
            out.data_mut().iter_mut().for_each(|s| *s = v);
            Ok(out)
        }
    }

    #[test]
    fn test_refinement_never_lowers_sigma_max() {
        let frame = spotted_frame();
        let params = HighlightParams::default();
        let zeros = remove_highlights_with(&frame, &params, &Zeros).unwrap();
        let first_pass = remove_highlights_with(&frame, &params, &Identity).unwrap();
        assert_eq!(zeros.frame, first_pass.frame);
        assert_eq!((zeros.iterations, zeros.converged), (1, true));
        assert_eq!((first_pass.iterations, first_pass.converged), (1, true));
    }

    #[test]
    fn test_refinement_is_clamped_to_value_range() {
        let frame = spotted_frame();
        let params = HighlightParams::default();
        let at_ceil = remove_highlights_with(&frame, &params, &Overshoot(0)).unwrap();
        let past_ceil = remove_highlights_with(&frame, &params, &Overshoot(1000)).unwrap();
        assert_eq!(past_ceil.frame, at_ceil.frame);
        assert!(past_ceil.converged);
        for (_, p) in past_ceil.frame.planes() {
            assert!(p.data().iter().all(|&v| (p.floor()..=p.ceil()).contains(&v)));
        }
    }

    #[test]
    fn test_rejects_frame_with_edited_plane() {
        let mut frame = rgb_frame(4, 4, 8, |_, _| [200, 100, 50]);
        frame.plane_mut(Channel::G).unwrap().resize(1, 1).unwrap();
        let err = remove_highlights(&frame, &HighlightParams::default()).unwrap_err();
        assert!(matches!(err, OpsError::Precondition { stage: Stage::Validate, .. }));
    }
}
