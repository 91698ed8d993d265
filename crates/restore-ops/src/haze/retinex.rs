//! Multi-scale Retinex transmission estimate.
//!
//! The luma reference is blurred at every scale in `sigmas` and the blurred
//! copies are combined by geometric mean. Bright, smooth regions (haze,
//! sky) end up close to 1.

use rayon::prelude::*;
use restore_core::{ColorMatrix, PlaneFl};
use tracing::{debug, trace};

use super::{EPS, HazeParams, LumaMode, RgbPlanes};
use crate::gaussian::Gaussian;
use crate::OpsResult;

/// Luma reference of float RGB planes, clamped to `[EPS, 1]`.
pub fn luma_reference(rgb: &RgbPlanes, mode: LumaMode, matrix: ColorMatrix) -> PlaneFl {
    let [kr, kg, kb] = matrix.luma_coefficients();
    let [r, g, b] = rgb;
    let mut out = PlaneFl::like(r);
    out.data_mut()
        .par_iter_mut()
        .zip(r.data().par_iter())
        .zip(g.data().par_iter().zip(b.data().par_iter()))
        .for_each(|((o, &r), (&g, &b))| {
            let y = match mode {
                LumaMode::Min => r.min(g).min(b),
                LumaMode::Luma => kr * r + kg * g + kb * b,
                LumaMode::Max => r.max(g).max(b),
            };
            *o = y.clamp(EPS, 1.0);
        });
    out
}

/// Inverted transmission map of `rgb`.
pub fn tmap_inv(rgb: &RgbPlanes, params: &HazeParams, matrix: ColorMatrix) -> OpsResult<PlaneFl> {
    trace!(
        width = rgb[0].width(),
        height = rgb[0].height(),
        scales = params.sigmas.len(),
        luma_mode = ?params.luma_mode,
        "retinex::tmap_inv"
    );
    let luma = luma_reference(rgb, params.luma_mode, matrix);

    let extent = luma.width().max(luma.height());

    // Sum of logs, then exp of the mean.
    let mut acc = vec![0.0f64; luma.len()];
    for &sigma in &params.sigmas {
        let blurred = Gaussian::with_max_radius(sigma, extent)?.apply(params.execution, &luma)?;
        acc.par_iter_mut()
            .zip(blurred.data().par_iter())
            .for_each(|(a, &v)| *a += (v.max(EPS) as f64).ln());
        debug!(sigma, "retinex scale done");
    }

    let n = params.sigmas.len() as f64;
    let mut out = PlaneFl::like(&luma);
    out.data_mut()
        .par_iter_mut()
        .zip(acc.par_iter())
        .for_each(|(o, &a)| *o = ((a / n).exp() as f32).clamp(EPS, 1.0));
    Ok(out)
}
