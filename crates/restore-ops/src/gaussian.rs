//! Separable Gaussian blur over float planes.
//!
//! The kernel is truncated at `ceil(3 * sigma)` and normalized. Borders
//! replicate the edge sample, so a kernel wider than the plane is folded:
//! taps past the plane extent all read the edge sample and their weight moves
//! onto the outermost kept tap.
//!
//! # Example
//!
//! ```rust
//! use restore_core::{Execution, PlaneFl};
//! use restore_ops::gaussian::Gaussian;
//!
//! let src = PlaneFl::unit(0.5, 32, 32).unwrap();
//! let blurred = Gaussian::new(2.0).unwrap().apply(Execution::DataParallel, &src).unwrap();
//! assert!((blurred[0] - 0.5).abs() < 1e-5);
//! ```

use restore_core::exec::convolute;
use restore_core::{Execution, PlaneFl};
use tracing::trace;

use crate::{OpsError, OpsResult, Stage};

/// Widest kernel half-width kept before folding.
pub const MAX_RADIUS: usize = 1 << 16;

/// Truncated radii up to this are summed directly when folding.
const DIRECT_SUM_LIMIT: f64 = (1 << 20) as f64;

/// Mass of a unit Gaussian within three standard deviations.
const MASS_WITHIN_3_SIGMA: f64 = 0.997_300_203_936_739_8;

/// Unnormalized taps `exp(-i^2 / 2 sigma^2)` for `i` in `-r..=r`, where
/// `r = min(ceil(3 sigma), max_radius)`.
///
/// When `r` cuts the kernel short, the weight of each dropped tail is added
/// to the outermost tap on its side. `sigma` must be positive and finite.
pub(crate) fn folded_taps(sigma: f64, max_radius: usize) -> Vec<f64> {
    let full = (sigma * 3.0).ceil();
    let radius = full.min(max_radius as f64) as isize;
    let denom = 2.0 * sigma * sigma;
    let tap = |i: isize| (-((i as f64) * (i as f64)) / denom).exp();

    let mut taps: Vec<f64> = (-radius..=radius).map(tap).collect();
    if (radius as f64) < full {
        let total = if full <= DIRECT_SUM_LIMIT {
            let n = full as isize;
            (-n..=n).map(tap).sum()
        } else {
            (2.0 * std::f64::consts::PI).sqrt() * sigma * MASS_WITHIN_3_SIGMA
        };
        let kept: f64 = taps.iter().sum();
        let tail = ((total - kept) / 2.0).max(0.0);
        let last = taps.len() - 1;
        taps[0] += tail;
        taps[last] += tail;
    }
    taps
}

/// Normalized 1-D Gaussian kernel.
#[derive(Debug, Clone)]
pub struct Gaussian {
    sigma: f64,
    weights: Vec<f32>,
}

impl Gaussian {
    /// Builds the kernel for standard deviation `sigma` (pixels).
    ///
    /// Half-widths past [`MAX_RADIUS`] are folded.
    pub fn new(sigma: f64) -> OpsResult<Self> {
        Self::with_max_radius(sigma, MAX_RADIUS)
    }

    /// Builds the kernel with its half-width folded down to `max_radius`.
    pub fn with_max_radius(sigma: f64, max_radius: usize) -> OpsResult<Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(OpsError::invalid_parameter(
                Stage::Validate,
                "sigma",
                format!("must be a positive number, got {}", sigma),
            ));
        }
        let raw = folded_taps(sigma, max_radius);
        let sum: f64 = raw.iter().sum();
        Ok(Self {
            sigma,
            weights: raw.iter().map(|w| (w / sum) as f32).collect(),
        })
    }

    /// Standard deviation.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Half-width of the kernel.
    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }

    /// Kernel weights, `2 * radius + 1` long.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Blurs `src`: a horizontal pass then a vertical pass.
    pub fn apply(&self, exec: Execution, src: &PlaneFl) -> OpsResult<PlaneFl> {
        trace!(
            width = src.width(),
            height = src.height(),
            sigma = self.sigma,
            "gaussian::apply"
        );
        let extent = src.width().max(src.height());
        if self.radius() > extent {
            return Self::with_max_radius(self.sigma, extent)?.apply(exec, src);
        }
        let r = self.radius() as isize;
        let k = &self.weights;

        let mut tmp = PlaneFl::like(src);
        convolute(exec, &mut tmp, src, 0, self.radius(), |w| {
            (-r..=r)
                .map(|dx| k[(dx + r) as usize] * w.get(0, dx))
                .sum()
        })?;

        let mut dst = PlaneFl::like(src);
        convolute(exec, &mut dst, &tmp, self.radius(), 0, |w| {
            (-r..=r)
                .map(|dy| k[(dy + r) as usize] * w.get(dy, 0))
                .sum()
        })?;
        Ok(dst)
    }
}

/// One-shot Gaussian blur.
pub fn gaussian_blur(exec: Execution, src: &PlaneFl, sigma: f64) -> OpsResult<PlaneFl> {
    Gaussian::new(sigma)?.apply(exec, src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_kernel_normalized() {
        let g = Gaussian::new(1.5).unwrap();
        assert_eq!(g.radius(), 5);
        let sum: f32 = g.weights().iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-5);
        assert!(g.weights()[5] > g.weights()[4]);
    }

    #[test]
    fn test_invalid_sigma() {
        assert!(Gaussian::new(0.0).is_err());
        assert!(Gaussian::new(-1.0).is_err());
        assert!(Gaussian::new(f64::NAN).is_err());
    }

    #[test]
    fn test_constant_plane_unchanged() {
        let src = PlaneFl::unit(0.3, 9, 7).unwrap();
        let out = gaussian_blur(Execution::Sequential, &src, 3.0).unwrap();
        for &v in out.data() {
            assert_abs_diff_eq!(v, 0.3, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_impulse_spreads_and_conserves() {
        let mut src = PlaneFl::unit(0.0, 21, 21).unwrap();
        src.set(10, 10, 1.0);
        let out = gaussian_blur(Execution::DataParallel, &src, 1.0).unwrap();
        let total: f32 = out.data().iter().sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-4);
        assert!(out.get(10, 10) < 1.0);
        assert!(out.get(11, 10) > 0.0);
        assert_abs_diff_eq!(out.get(11, 10), out.get(10, 11), epsilon = 1e-7);
    }

    /// Edge-clamped blur with the untruncated-by-extent kernel.
    fn reference_blur(src: &PlaneFl, sigma: f64) -> Vec<f32> {
        let r = (sigma * 3.0).ceil() as isize;
        let raw: Vec<f64> = (-r..=r)
            .map(|i| (-((i * i) as f64) / (2.0 * sigma * sigma)).exp())
            .collect();
        let sum: f64 = raw.iter().sum();
        let k: Vec<f64> = raw.iter().map(|w| w / sum).collect();
        let (w, h) = (src.width() as isize, src.height() as isize);
        let at = |x: isize, y: isize| src.get(x.clamp(0, w - 1) as usize, y.clamp(0, h - 1) as usize) as f64;
        let mut out = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let mut v = 0.0;
                for dy in -r..=r {
                    for dx in -r..=r {
                        v += k[(dy + r) as usize] * k[(dx + r) as usize] * at(x + dx, y + dy);
                    }
                }
                out.push(v as f32);
            }
        }
        out
    }

    #[test]
    fn test_kernel_wider_than_plane_is_folded_exactly() {
        let mut src = PlaneFl::unit(0.1, 4, 5).unwrap();
        src.set(1, 2, 0.9);
        src.set(3, 0, 0.6);
        let out = gaussian_blur(Execution::Sequential, &src, 3.0).unwrap();
        for (a, b) in out.data().iter().zip(reference_blur(&src, 3.0)) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_huge_sigma_stays_bounded() {
        let g = Gaussian::new(1e12).unwrap();
        assert_eq!(g.radius(), MAX_RADIUS);

        let mut src = PlaneFl::unit(0.2, 4, 4).unwrap();
        src.set(0, 0, 1.0);
        let out = g.apply(Execution::DataParallel, &src).unwrap();
        assert_eq!((out.width(), out.height()), (4, 4));
        assert!(out.data().iter().all(|v| v.is_finite() && (0.2 - 1e-5..=1.0 + 1e-5).contains(v)));
    }
}
