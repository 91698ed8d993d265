//! Scene radiance recovery.

use restore_core::exec::transform;
use restore_core::PlaneFl;
use tracing::trace;

use super::{EPS, HazeParams, RgbPlanes};
use crate::OpsResult;

/// Recovers `J = (I - A) / t + A` per channel and blends it into the input
/// by `strength`.
///
/// `t = clamp(1 - tInv / A, tmap_min, tmap_max)`. Output values are not
/// clipped.
pub fn recover(
    rgb: &RgbPlanes,
    tmap_inv: &PlaneFl,
    atmos: [f32; 3],
    params: &HazeParams,
) -> OpsResult<RgbPlanes> {
    trace!(
        width = tmap_inv.width(),
        height = tmap_inv.height(),
        strength = params.strength,
        "recover::recover"
    );
    let (tmin, tmax, k) = (params.tmap_min, params.tmap_max, params.strength);
    let map = tmap_inv.data();

    let channel = |src: &PlaneFl, a: f32| -> OpsResult<PlaneFl> {
        tmap_inv.check_same_size(src)?;
        let a_div = a.max(EPS);
        let s = src.data();
        let mut out = PlaneFl::like(src);
        transform(params.execution, &mut out, |i| {
            let t = (1.0 - map[i] / a_div).clamp(tmin, tmax);
            let j = (s[i] - a) / t + a;
            s[i] + k * (j - s[i])
        });
        Ok(out)
    };

    Ok([
        channel(&rgb[0], atmos[0])?,
        channel(&rgb[1], atmos[1])?,
        channel(&rgb[2], atmos[2])?,
    ])
}
