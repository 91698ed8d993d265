//! Traversal strategies over plane buffers.
//!
//! Every per-pixel pass in the workspace goes through one of two entry
//! points:
//!
//! - [`transform`] - write each output index from a pure function of the index
//! - [`convolute`] - write each output pixel from an edge-clamped window over a source
//!
//! Both only write the destination buffer. The [`Execution`] value picks
//! how rows are scheduled; results are identical for every strategy.
//!
//! # Example
//!
//! ```rust
//! use restore_core::exec::{transform, Execution};
//! use restore_core::PlaneFl;
//!
//! let mut p = PlaneFl::unit(0.0, 4, 2).unwrap();
//! transform(Execution::DataParallel, &mut p, |i| i as f32);
//! assert_eq!(p[5], 5.0);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Scheduling strategy for per-pixel passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Execution {
    /// Single thread, row by row
    Sequential,
    /// One contiguous band of rows per worker thread
    Threaded,
    /// Row-granular work stealing
    #[default]
    DataParallel,
}

impl fmt::Display for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Execution::Sequential => "sequential",
            Execution::Threaded => "threaded",
            Execution::DataParallel => "data-parallel",
        })
    }
}

impl FromStr for Execution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(Execution::Sequential),
            "threaded" | "thread" => Ok(Execution::Threaded),
            "data-parallel" | "parallel" | "par" => Ok(Execution::DataParallel),
            other => Err(Error::other(format!("unknown execution strategy '{}'", other))),
        }
    }
}

/// Read access to a row-major sample buffer.
pub trait PlaneBuf: Sync {
    /// Sample type.
    type Elem: Copy + Send + Sync;

    /// Width in samples.
    fn width(&self) -> usize;
    /// Height in rows.
    fn height(&self) -> usize;
    /// All samples, `width * height` long.
    fn samples(&self) -> &[Self::Elem];
}

/// Write access to a row-major sample buffer.
pub trait PlaneBufMut: PlaneBuf + Send {
    /// All samples, mutable.
    fn samples_mut(&mut self) -> &mut [Self::Elem];
}

/// Edge-clamped neighborhood around one pixel of a source buffer.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a, T> {
    src: &'a [T],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    vrad: usize,
    hrad: usize,
}

impl<'a, T: Copy> Window<'a, T> {
    /// Vertical radius requested by the traversal.
    #[inline]
    pub fn vrad(&self) -> isize {
        self.vrad as isize
    }

    /// Horizontal radius requested by the traversal.
    #[inline]
    pub fn hrad(&self) -> isize {
        self.hrad as isize
    }

    /// Column of the center pixel.
    #[inline]
    pub fn x(&self) -> usize {
        self.x
    }

    /// Row of the center pixel.
    #[inline]
    pub fn y(&self) -> usize {
        self.y
    }

    /// Center sample.
    #[inline]
    pub fn center(&self) -> T {
        self.src[self.y * self.width + self.x]
    }

    /// Sample at offset `(dy, dx)`; coordinates outside the buffer clamp to the edge.
    #[inline]
    pub fn get(&self, dy: isize, dx: isize) -> T {
        let yy = (self.y as isize + dy).clamp(0, self.height as isize - 1) as usize;
        let xx = (self.x as isize + dx).clamp(0, self.width as isize - 1) as usize;
        self.src[yy * self.width + xx]
    }
}

/// Runs `f(y, row)` over every row of `data` under `exec`.
pub fn for_each_row<T, F>(exec: Execution, data: &mut [T], width: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    if width == 0 || data.is_empty() {
        return;
    }

    match exec {
        Execution::Sequential => {
            for (y, row) in data.chunks_mut(width).enumerate() {
                f(y, row);
            }
        }
        Execution::Threaded => {
            let height = data.len() / width;
            let bands = rayon::current_num_threads().max(1);
            let rows_per_band = height.div_ceil(bands).max(1);
            data.par_chunks_mut(rows_per_band * width)
                .enumerate()
                .for_each(|(b, band)| {
                    for (i, row) in band.chunks_mut(width).enumerate() {
                        f(b * rows_per_band + i, row);
                    }
                });
        }
        Execution::DataParallel => {
            data.par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| f(y, row));
        }
    }
}

/// Writes `dst[i] = f(i)` for every linear index of `dst`.
pub fn transform<D, F>(exec: Execution, dst: &mut D, f: F)
where
    D: PlaneBufMut + ?Sized,
    F: Fn(usize) -> D::Elem + Sync,
{
    let width = dst.width();
    for_each_row(exec, dst.samples_mut(), width, |y, row| {
        let base = y * width;
        for (x, out) in row.iter_mut().enumerate() {
            *out = f(base + x);
        }
    });
}

/// Writes every pixel of `dst` from a window over `src`.
///
/// `vrad`/`hrad` are exposed on the [`Window`] as the neighborhood
/// extent; any offset is clamped to the source edges.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] when `src` and `dst` differ in size.
pub fn convolute<D, S, F>(
    exec: Execution,
    dst: &mut D,
    src: &S,
    vrad: usize,
    hrad: usize,
    f: F,
) -> Result<()>
where
    D: PlaneBufMut + ?Sized,
    S: PlaneBuf + ?Sized,
    F: Fn(&Window<'_, S::Elem>) -> D::Elem + Sync,
{
    let (width, height) = (dst.width(), dst.height());
    if (src.width(), src.height()) != (width, height) {
        return Err(Error::dimension_mismatch(
            (width, height),
            (src.width(), src.height()),
        ));
    }
    let samples = src.samples();
    for_each_row(exec, dst.samples_mut(), width, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let win = Window {
                src: samples,
                width,
                height,
                x,
                y,
                vrad,
                hrad,
            };
            *out = f(&win);
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlaneFl;

    const ALL: [Execution; 3] = [
        Execution::Sequential,
        Execution::Threaded,
        Execution::DataParallel,
    ];

    #[test]
    fn test_transform_writes_every_index() {
        for exec in ALL {
            let mut p = PlaneFl::unit(0.0, 7, 5).unwrap();
            transform(exec, &mut p, |i| i as f32);
            for i in 0..35 {
                assert_eq!(p[i], i as f32, "{exec}");
            }
        }
    }

    #[test]
    fn test_convolute_clamps_edges() {
        let mut src = PlaneFl::unit(0.0, 3, 3).unwrap();
        transform(Execution::Sequential, &mut src, |i| i as f32);
        for exec in ALL {
            let mut dst = PlaneFl::like(&src);
            // Left neighbor; column 0 reads itself.
            convolute(exec, &mut dst, &src, 0, 1, |w| w.get(0, -1)).unwrap();
            assert_eq!(dst.samples(), &[0.0, 0.0, 1.0, 3.0, 3.0, 4.0, 6.0, 6.0, 7.0]);
        }
    }

    #[test]
    fn test_convolute_box_sum() {
        let src = PlaneFl::unit(1.0, 4, 4).unwrap();
        let mut dst = PlaneFl::like(&src);
        convolute(Execution::DataParallel, &mut dst, &src, 1, 1, |w| {
            let mut s = 0.0;
            for dy in -w.vrad()..=w.vrad() {
                for dx in -w.hrad()..=w.hrad() {
                    s += w.get(dy, dx);
                }
            }
            s
        })
        .unwrap();
        assert!(dst.samples().iter().all(|&v| v == 9.0));
    }

    #[test]
    fn test_convolute_size_mismatch() {
        let src = PlaneFl::unit(0.0, 3, 3).unwrap();
        let mut dst = PlaneFl::unit(0.0, 4, 3).unwrap();
        let err = convolute(Execution::Sequential, &mut dst, &src, 1, 1, |w| w.center());
        assert!(err.unwrap_err().is_dimension_error());
    }

    #[test]
    fn test_execution_parse() {
        assert_eq!("seq".parse::<Execution>().unwrap(), Execution::Sequential);
        assert_eq!("Threaded".parse::<Execution>().unwrap(), Execution::Threaded);
        assert_eq!(
            Execution::DataParallel.to_string().parse::<Execution>().unwrap(),
            Execution::DataParallel
        );
        assert!("gpu".parse::<Execution>().is_err());
    }
}
