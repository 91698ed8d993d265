//! Fixed-bin histograms for quantile lookups.
//!
//! Bins split `[lower, upper]` evenly; values outside clamp into the
//! first or last bin. [`Histogram::min`] and [`Histogram::max`] return the
//! value below/above which a given fraction of samples lies, at bin
//! resolution.

use rayon::prelude::*;

/// Sample counts over `[lower, upper]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    lower: f32,
    upper: f32,
    counts: Vec<u64>,
    total: u64,
}

impl Histogram {
    /// Counts `data` into `bins` bins spanning `[lower, upper]`.
    ///
    /// `bins` below 1 is treated as 1. NaNs fall into the first bin.
    pub fn new(data: &[f32], lower: f32, upper: f32, bins: usize) -> Self {
        let bins = bins.max(1);
        let scale = if upper > lower {
            bins as f32 / (upper - lower)
        } else {
            0.0
        };
        let index = |v: f32| -> usize {
            let i = (v - lower) * scale;
            if i.is_nan() || i <= 0.0 {
                0
            } else {
                (i as usize).min(bins - 1)
            }
        };

        let counts = data
            .par_iter()
            .fold(
                || vec![0u64; bins],
                |mut h, &v| {
                    h[index(v)] += 1;
                    h
                },
            )
            .reduce(
                || vec![0u64; bins],
                |mut a, b| {
                    for (x, y) in a.iter_mut().zip(b) {
                        *x += y;
                    }
                    a
                },
            );

        Self {
            lower,
            upper,
            counts,
            total: data.len() as u64,
        }
    }

    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Samples counted.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Per-bin counts.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Lower edge of bin `i`.
    pub fn bin_lower(&self, i: usize) -> f32 {
        self.lower + (self.upper - self.lower) * i as f32 / self.counts.len() as f32
    }

    /// Value with at most `ratio` of the samples strictly below it.
    ///
    /// Scans upward and returns the lower edge of the first bin where the
    /// running count exceeds `ratio * total`.
    pub fn min(&self, ratio: f64) -> f32 {
        if self.total == 0 || self.upper <= self.lower {
            return self.lower;
        }
        let limit = ratio.max(0.0) * self.total as f64;
        let mut acc = 0u64;
        for (i, &c) in self.counts.iter().enumerate() {
            acc += c;
            if acc as f64 > limit {
                return self.bin_lower(i);
            }
        }
        self.bin_lower(self.counts.len() - 1)
    }

    /// Value with at least `ratio` of the samples at or above its bin.
    ///
    /// Scans downward and returns the lower edge of the first bin where
    /// the running count exceeds `ratio * total`.
    pub fn max(&self, ratio: f64) -> f32 {
        if self.total == 0 || self.upper <= self.lower {
            return self.upper.max(self.lower);
        }
        let limit = ratio.max(0.0) * self.total as f64;
        let mut acc = 0u64;
        for (i, &c) in self.counts.iter().enumerate().rev() {
            acc += c;
            if acc as f64 > limit {
                return self.bin_lower(i);
            }
        }
        self.lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32 / (n - 1) as f32).collect()
    }

    #[test]
    fn test_counts_sum_to_total() {
        let h = Histogram::new(&ramp(1000), 0.0, 1.0, 64);
        assert_eq!(h.counts().iter().sum::<u64>(), 1000);
        assert_eq!(h.total(), 1000);
        assert_eq!(h.bins(), 64);
    }

    #[test]
    fn test_quantiles_on_ramp() {
        let h = Histogram::new(&ramp(10001), 0.0, 1.0, 1000);
        assert_abs_diff_eq!(h.min(0.05), 0.05, epsilon = 2e-3);
        assert_abs_diff_eq!(h.max(0.03), 0.97, epsilon = 2e-3);
        assert_abs_diff_eq!(h.min(0.0), 0.0, epsilon = 1e-6);
        assert!(h.max(0.0) >= 0.998);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let h = Histogram::new(&[-1.0, 2.0, f32::NAN], 0.0, 1.0, 4);
        assert_eq!(h.counts(), &[2, 0, 0, 1]);
    }

    #[test]
    fn test_degenerate_range() {
        let h = Histogram::new(&[0.5; 10], 0.5, 0.5, 16);
        assert_eq!(h.min(0.1), 0.5);
        assert_eq!(h.max(0.1), 0.5);
        let empty = Histogram::new(&[], 0.0, 1.0, 8);
        assert_eq!(empty.min(0.5), 0.0);
        assert_eq!(empty.max(0.5), 1.0);
    }

    #[test]
    fn test_max_threshold_keeps_top_bin() {
        let mut data = vec![0.1f32; 999];
        data.push(0.9);
        let h = Histogram::new(&data, 0.0, 1.0, 10);
        let thr = h.max(0.0005);
        assert_abs_diff_eq!(thr, 0.9, epsilon = 1e-6);
        assert_eq!(h.max(0.01), h.bin_lower(1));
    }
}
