//! Global atmospheric light.

use rayon::prelude::*;
use restore_core::PlaneFl;
use tracing::{debug, trace};

use super::{HazeParams, RgbPlanes};
use crate::histogram::Histogram;
use crate::{OpsError, OpsResult, Stage};

/// Estimates the atmospheric light `[A_r, A_g, A_b]`.
///
/// Pixels whose map value is at or above the `tmap_thr` top quantile are
/// averaged per channel; each component is capped at `al_max`. When the
/// selection is empty the pixel with the largest map value is used.
pub fn atmospheric_light(rgb: &RgbPlanes, tmap_inv: &PlaneFl, params: &HazeParams) -> OpsResult<[f32; 3]> {
    trace!(
        width = tmap_inv.width(),
        height = tmap_inv.height(),
        tmap_thr = params.tmap_thr,
        "atmospheric::atmospheric_light"
    );
    for p in rgb {
        tmap_inv.check_same_size(p)?;
    }
    if tmap_inv.is_empty() {
        return Err(OpsError::precondition(
            Stage::AtmosphericLight,
            "transmission map is empty",
        ));
    }

    let hist = Histogram::new(tmap_inv.data(), 0.0, 1.0, params.hist_bins);
    let thr = hist.max(params.tmap_thr);

    let [r, g, b] = rgb;
    let (count, sum) = tmap_inv
        .data()
        .par_iter()
        .enumerate()
        .filter(|&(_, &t)| t >= thr)
        .fold(
            || (0usize, [0.0f64; 3]),
            |(n, mut s), (i, _)| {
                s[0] += r[i] as f64;
                s[1] += g[i] as f64;
                s[2] += b[i] as f64;
                (n + 1, s)
            },
        )
        .reduce(
            || (0usize, [0.0f64; 3]),
            |(na, sa), (nb, sb)| (na + nb, [sa[0] + sb[0], sa[1] + sb[1], sa[2] + sb[2]]),
        );

    let mean = if count > 0 {
        sum.map(|s| (s / count as f64) as f32)
    } else {
        let (idx, _) = tmap_inv
            .data()
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) });
        debug!(idx, "empty atmospheric selection, using brightest map pixel");
        [r[idx], g[idx], b[idx]]
    };
    debug!(threshold = thr, selected = count, "atmospheric light selection");

    Ok(mean.map(|a| a.min(params.al_max)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rgb_with_bright_corner() -> (RgbPlanes, PlaneFl) {
        let mut r = PlaneFl::unit(0.2, 10, 10).unwrap();
        let mut g = PlaneFl::unit(0.3, 10, 10).unwrap();
        let mut b = PlaneFl::unit(0.4, 10, 10).unwrap();
        let mut map = PlaneFl::unit(0.1, 10, 10).unwrap();
        r.set(9, 9, 0.9);
        g.set(9, 9, 0.8);
        b.set(9, 9, 0.7);
        map.set(9, 9, 0.95);
        ([r, g, b], map)
    }

    #[test]
    fn test_brightest_region_selected() {
        let (rgb, map) = rgb_with_bright_corner();
        let params = HazeParams {
            tmap_thr: 0.005,
            ..Default::default()
        };
        let a = atmospheric_light(&rgb, &map, &params).unwrap();
        assert_abs_diff_eq!(a[0], 0.9, epsilon = 1e-6);
        assert_abs_diff_eq!(a[1], 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(a[2], 0.7, epsilon = 1e-6);
    }

    #[test]
    fn test_capped_at_al_max() {
        let (rgb, map) = rgb_with_bright_corner();
        let params = HazeParams {
            tmap_thr: 0.005,
            al_max: 0.75,
            ..Default::default()
        };
        let a = atmospheric_light(&rgb, &map, &params).unwrap();
        assert_eq!(a[0], 0.75);
        assert_eq!(a[1], 0.75);
        assert_abs_diff_eq!(a[2], 0.7, epsilon = 1e-6);
    }

    #[test]
    fn test_flat_map_averages_everything() {
        let rgb = [
            PlaneFl::unit(0.2, 4, 4).unwrap(),
            PlaneFl::unit(0.4, 4, 4).unwrap(),
            PlaneFl::unit(0.6, 4, 4).unwrap(),
        ];
        let map = PlaneFl::unit(0.5, 4, 4).unwrap();
        let a = atmospheric_light(&rgb, &map, &HazeParams::default()).unwrap();
        assert_abs_diff_eq!(a[0], 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(a[1], 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(a[2], 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_size_mismatch() {
        let (rgb, _) = rgb_with_bright_corner();
        let map = PlaneFl::unit(0.5, 4, 4).unwrap();
        assert!(atmospheric_light(&rgb, &map, &HazeParams::default()).is_err());
    }
}
