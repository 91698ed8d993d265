//! Joint (guided) bilateral filtering.
//!
//! Smooths a source plane with weights that fall off with spatial distance
//! and with differences in a separate guide plane, so edges of the guide
//! stop the smoothing.
//!
//! Two evaluation strategies:
//!
//! | `pbfic_num` | Method | Cost per pixel |
//! |-------------|--------|----------------|
//! | 0 | brute force over a `ceil(3 sigma_s)` window | O(r^2) |
//! | >= 2 | principle bilateral filtered image components | O(pbfic_num) |
//!
//! The PBFIC form samples the guide range at `pbfic_num` levels, filters
//! each level with an ordinary Gaussian and interpolates between the two
//! levels bracketing each guide value (Yang, Tan, Ahuja, "Real-time O(1)
//! bilateral filtering", CVPR 2009).
//!
//! Range differences are normalized by the guide's value range, so
//! `sigma_r` is a fraction of full scale.

use restore_core::exec::transform;
use restore_core::{Execution, Plane, PlaneFl};
use tracing::{debug, trace};

use crate::gaussian::{folded_taps, Gaussian};
use crate::{OpsError, OpsResult, Stage};

/// Edge-aware smoother used by the highlight refinement loop.
pub trait GuidedSmoother: Send + Sync {
    /// Smooths `src`, stopping at edges of `guide`.
    ///
    /// Output has the geometry and quantization of `src`.
    fn smooth(&self, src: &Plane, guide: &Plane) -> OpsResult<Plane>;
}

/// Joint bilateral filter.
#[derive(Debug, Clone)]
pub struct JointBilateral {
    sigma_s: f64,
    sigma_r: f64,
    pbfic_num: usize,
    execution: Execution,
}

impl JointBilateral {
    /// Creates a filter.
    ///
    /// `pbfic_num == 0` selects the exact brute-force evaluation; any
    /// value `>= 2` selects the PBFIC approximation with that many levels.
    pub fn new(sigma_s: f64, sigma_r: f64, pbfic_num: usize) -> OpsResult<Self> {
        if !(sigma_s.is_finite() && sigma_s > 0.0) {
            return Err(OpsError::invalid_parameter(
                Stage::Validate,
                "sigma_s",
                format!("must be positive, got {}", sigma_s),
            ));
        }
        if !(sigma_r.is_finite() && sigma_r > 0.0) {
            return Err(OpsError::invalid_parameter(
                Stage::Validate,
                "sigma_r",
                format!("must be positive, got {}", sigma_r),
            ));
        }
        if pbfic_num == 1 {
            return Err(OpsError::invalid_parameter(
                Stage::Validate,
                "pbfic_num",
                "must be 0 (brute force) or at least 2",
            ));
        }
        Ok(Self {
            sigma_s,
            sigma_r,
            pbfic_num,
            execution: Execution::default(),
        })
    }

    /// Sets the traversal strategy.
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Spatial standard deviation in pixels.
    pub fn sigma_s(&self) -> f64 {
        self.sigma_s
    }

    /// Range standard deviation as a fraction of the guide's value range.
    pub fn sigma_r(&self) -> f64 {
        self.sigma_r
    }

    /// Number of PBFIC levels; 0 for brute force.
    pub fn pbfic_num(&self) -> usize {
        self.pbfic_num
    }

    fn range_weight(&self, diff: f64) -> f64 {
        (-(diff * diff) / (2.0 * self.sigma_r * self.sigma_r)).exp()
    }

    fn brute_force(&self, src: &Plane, guide: &Plane) -> Plane {
        let (width, height) = (src.width(), src.height());
        let gvr = guide.value_range().max(1) as f64;

        // The spatial weight is separable; taps past the plane read clamped edge samples.
        let spatial = folded_taps(self.sigma_s, width.max(height));
        let radius = (spatial.len() / 2) as isize;

        // Guide differences are integers; tabulate when the range is small.
        let range_lut: Option<Vec<f64>> = (guide.value_range() <= 1 << 16).then(|| {
            (0..=guide.value_range())
                .map(|d| self.range_weight(d as f64 / gvr))
                .collect()
        });
        let range_w = |a: u32, b: u32| -> f64 {
            let d = a.abs_diff(b);
            match &range_lut {
                Some(lut) => lut[(d as usize).min(lut.len() - 1)],
                None => self.range_weight(d as f64 / gvr),
            }
        };

        let s = src.data();
        let g = guide.data();
        let mut out = Plane::like(src);
        transform(self.execution, &mut out, |i| {
            let (x, y) = ((i % width) as isize, (i / width) as isize);
            let gc = g[i];
            let mut num = 0.0f64;
            let mut den = 0.0f64;
            for dy in -radius..=radius {
                let yy = (y + dy).clamp(0, height as isize - 1) as usize;
                let wy = spatial[(dy + radius) as usize];
                for dx in -radius..=radius {
                    let xx = (x + dx).clamp(0, width as isize - 1) as usize;
                    let j = yy * width + xx;
                    let w = wy * spatial[(dx + radius) as usize] * range_w(gc, g[j]);
                    num += w * s[j] as f64;
                    den += w;
                }
            }
            src.quantize((num / den) as f32)
        });
        out
    }

    fn pbfic(&self, src: &Plane, guide: &Plane) -> OpsResult<Plane> {
        let exec = self.execution;
        let levels = self.pbfic_num;
        let gauss = Gaussian::with_max_radius(self.sigma_s, src.width().max(src.height()))?;
        let gq = *guide.quant();
        let gvr = gq.value_range().max(1) as f64;

        let src_fl: Vec<f32> = src.data().iter().map(|&v| v as f32).collect();
        let guide_fl: Vec<f64> = guide
            .data()
            .iter()
            .map(|&v| (v as f64 - gq.floor() as f64) / gvr)
            .collect();

        // Filtered component per level.
        let mut components: Vec<PlaneFl> = Vec::with_capacity(levels);
        for k in 0..levels {
            let level = k as f64 / (levels - 1) as f64;
            let mut wk = PlaneFl::like_plane(src);
            let mut jk = PlaneFl::like_plane(src);
            transform(exec, &mut wk, |i| self.range_weight(guide_fl[i] - level) as f32);
            {
                let w = wk.data();
                transform(exec, &mut jk, |i| w[i] * src_fl[i]);
            }
            let wk = gauss.apply(exec, &wk)?;
            let jk = gauss.apply(exec, &jk)?;
            let mut comp = PlaneFl::like_plane(src);
            transform(exec, &mut comp, |i| {
                let den = wk[i];
                if den > f32::MIN_POSITIVE {
                    jk[i] / den
                } else {
                    src_fl[i]
                }
            });
            components.push(comp);
        }

        let mut out = Plane::like(src);
        transform(exec, &mut out, |i| {
            let pos = (guide_fl[i].clamp(0.0, 1.0) * (levels - 1) as f64) as f32;
            let lo = (pos.floor() as usize).min(levels - 2);
            let t = pos - lo as f32;
            let v = components[lo][i] * (1.0 - t) + components[lo + 1][i] * t;
            src.quantize(v)
        });
        Ok(out)
    }
}

impl GuidedSmoother for JointBilateral {
    fn smooth(&self, src: &Plane, guide: &Plane) -> OpsResult<Plane> {
        trace!(
            width = src.width(),
            height = src.height(),
            sigma_s = self.sigma_s,
            sigma_r = self.sigma_r,
            pbfic_num = self.pbfic_num,
            "bilateral::smooth"
        );
        if (src.width(), src.height()) != (guide.width(), guide.height()) {
            return Err(restore_core::Error::dimension_mismatch(
                (src.width(), src.height()),
                (guide.width(), guide.height()),
            )
            .into());
        }
        if src.is_empty() {
            return Ok(src.clone());
        }
        if self.pbfic_num == 0 {
            Ok(self.brute_force(src, guide))
        } else {
            debug!(levels = self.pbfic_num, "PBFIC bilateral");
            self.pbfic(src, guide)
        }
    }
}
