//! Post-processing and quantization of the recovered radiance.

use restore_core::exec::transform;
use restore_core::{Frame, Plane, PlaneFl};
use tracing::{debug, trace};

use super::{EPS, HazeParams, PostProcess, RgbPlanes};
use crate::gaussian::Gaussian;
use crate::histogram::Histogram;
use crate::OpsResult;

/// Unsharp mask gain for [`PostProcess::SharpenStretch`].
pub const SHARPEN_AMOUNT: f32 = 1.0;

/// Stretch bounds of `measure`: the `lower_thr` and `upper_thr` quantiles.
pub fn stretch_bounds(measure: &PlaneFl, params: &HazeParams) -> (f32, f32) {
    let (lo, hi) = measure.min_max();
    let hist = Histogram::new(measure.data(), lo, hi, params.hist_bins);
    (hist.min(params.lower_thr), hist.max(params.upper_thr))
}

/// Maps `[lo, hi]` onto `[0, 1]` with clipping. A collapsed interval only clips.
pub fn stretch(src: &PlaneFl, lo: f32, hi: f32, params: &HazeParams) -> PlaneFl {
    let s = src.data();
    let mut out = PlaneFl::like(src);
    if hi - lo <= EPS {
        transform(params.execution, &mut out, |i| s[i].clamp(0.0, 1.0));
    } else {
        let scale = 1.0 / (hi - lo);
        transform(params.execution, &mut out, |i| ((s[i] - lo) * scale).clamp(0.0, 1.0));
    }
    out
}

/// `src + amount * (src - blur(src))`.
pub fn unsharp(src: &PlaneFl, gauss: &Gaussian, amount: f32, params: &HazeParams) -> OpsResult<PlaneFl> {
    let blurred = gauss.apply(params.execution, src)?;
    let s = src.data();
    let mut out = PlaneFl::like(src);
    transform(params.execution, &mut out, |i| s[i] + amount * (s[i] - blurred[i]));
    Ok(out)
}

/// Applies `mode` to one channel.
pub fn post_process(src: &PlaneFl, mode: PostProcess, params: &HazeParams) -> OpsResult<PlaneFl> {
    let extent = src.width().max(src.height());
    match mode {
        PostProcess::None => Ok(stretch(src, 0.0, 0.0, params)),
        PostProcess::Stretch => {
            let (lo, hi) = stretch_bounds(src, params);
            debug!(lo, hi, "stretch");
            Ok(stretch(src, lo, hi, params))
        }
        PostProcess::SmoothedStretch => {
            let smoothed = Gaussian::with_max_radius(params.pp_sigma, extent)?.apply(params.execution, src)?;
            let (lo, hi) = stretch_bounds(&smoothed, params);
            debug!(lo, hi, "smoothed stretch");
            Ok(stretch(src, lo, hi, params))
        }
        PostProcess::SharpenStretch => {
            let gauss = Gaussian::with_max_radius(params.pp_sigma, extent)?;
            let sharp = unsharp(src, &gauss, SHARPEN_AMOUNT, params)?;
            let (lo, hi) = stretch_bounds(&sharp, params);
            debug!(lo, hi, "sharpen stretch");
            Ok(stretch(&sharp, lo, hi, params))
        }
    }
}

/// Quantizes recovered planes into a new frame shaped like `input`.
///
/// Post-processing is skipped when `strength == 0`. Planes are converted
/// from the processing transfer back to the input's before quantization;
/// alpha is carried over unchanged.
pub fn store(input: &Frame, recovered: RgbPlanes, params: &HazeParams) -> OpsResult<Frame> {
    trace!(
        width = input.width(),
        height = input.height(),
        pp_mode = ?params.pp_mode,
        "store::store"
    );
    let mode = if params.strength == 0.0 {
        PostProcess::None
    } else {
        params.pp_mode
    };

    let (r, g, b) = input.rgb()?;
    let quants = [*r.quant(), *g.quant(), *b.quant()];
    let dst_tc = input.transfer();

    let mut planes = Vec::with_capacity(3);
    for (p, quant) in recovered.iter().zip(quants) {
        let processed = post_process(p, mode, params)?;
        let converted = PlaneFl::convert_from(&processed, dst_tc);
        planes.push(Plane::from_float(&converted, quant));
    }

    let mut out = input.clone();
    let (or, og, ob) = out.rgb_mut()?;
    for (dst, p) in [or, og, ob].into_iter().zip(planes) {
        *dst = p;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(w: usize, h: usize) -> PlaneFl {
        let mut p = PlaneFl::unit(0.0, w, h).unwrap();
        let n = (w * h - 1) as f32;
        for i in 0..w * h {
            p[i] = 0.25 + 0.5 * i as f32 / n;
        }
        p
    }

    #[test]
    fn test_none_only_clips() {
        let mut p = PlaneFl::unit(0.5, 2, 2).unwrap();
        p[0] = -0.3;
        p[1] = 1.7;
        let out = post_process(&p, PostProcess::None, &HazeParams::default()).unwrap();
        assert_eq!(out.data(), &[0.0, 1.0, 0.5, 0.5]);
    }

    #[test]
    fn test_stretch_expands_to_full_range() {
        let p = ramp(32, 32);
        let params = HazeParams {
            lower_thr: 0.0,
            upper_thr: 0.0,
            ..Default::default()
        };
        let out = post_process(&p, PostProcess::Stretch, &params).unwrap();
        assert_abs_diff_eq!(out[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out[32 * 32 - 1], 1.0, epsilon = 1e-6);
        assert!(out.max() - out.min() > p.max() - p.min());
    }

    #[test]
    fn test_stretch_clips_quantiles() {
        let p = ramp(32, 32);
        let params = HazeParams::default();
        let out = post_process(&p, PostProcess::Stretch, &params).unwrap();
        let at_floor = out.data().iter().filter(|&&v| v == 0.0).count();
        let at_ceil = out.data().iter().filter(|&&v| v == 1.0).count();
        assert!(at_floor >= 40, "{at_floor}");
        assert!(at_ceil >= 20, "{at_ceil}");
    }

    #[test]
    fn test_flat_plane_is_not_stretched() {
        let p = PlaneFl::unit(0.4, 8, 8).unwrap();
        for mode in [PostProcess::Stretch, PostProcess::SmoothedStretch, PostProcess::SharpenStretch] {
            let params = HazeParams {
                pp_sigma: 1.0,
                ..Default::default()
            };
            let out = post_process(&p, mode, &params).unwrap();
            for &v in out.data() {
                assert_abs_diff_eq!(v, 0.4, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_unsharp_boosts_edges() {
        let mut p = PlaneFl::unit(0.3, 8, 1).unwrap();
        for x in 4..8 {
            p.set(x, 0, 0.7);
        }
        let gauss = Gaussian::new(1.0).unwrap();
        let out = unsharp(&p, &gauss, 1.0, &HazeParams::default()).unwrap();
        assert!(out.get(3, 0) < 0.3);
        assert!(out.get(4, 0) > 0.7);
    }

    #[test]
    fn test_store_keeps_format_and_alpha() {
        let mut frame = Frame::new_rgb(3, 4, 4, 8).unwrap();
        frame.add_alpha().unwrap();
        let rgb = [
            PlaneFl::unit(1.0, 4, 4).unwrap(),
            PlaneFl::unit(0.5, 4, 4).unwrap(),
            PlaneFl::unit(-1.0, 4, 4).unwrap(),
        ];
        let params = HazeParams {
            pp_mode: PostProcess::None,
            ..Default::default()
        };
        let out = store(&frame, rgb, &params).unwrap();
        assert_eq!(out.format(), frame.format());
        assert_eq!(out.frame_num(), 3);
        assert_eq!(out.a(), frame.a());
        assert!(out.r().unwrap().data().iter().all(|&v| v == 255));
        assert!(out.b().unwrap().data().iter().all(|&v| v == 0));
    }
}
