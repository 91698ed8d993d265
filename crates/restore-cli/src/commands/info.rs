//! Frame info command.
//!
//! Prints geometry, quantization and color tags of decoded frames, and
//! optionally per-plane statistics.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::trace;

use crate::InfoArgs;
use restore_core::Frame;
use restore_io::Format;

/// Runs the info command.
pub fn run(args: InfoArgs, verbose: u8) -> Result<()> {
    trace!(inputs = args.input.len(), "info::run");
    let files = super::expand_inputs(&args.input)?;
    for (i, path) in files.iter().enumerate() {
        let file_size = fs::metadata(path)
            .with_context(|| format!("Cannot stat: {}", path.display()))?
            .len();
        let format = Format::detect(path).unwrap_or(Format::Unknown);
        let frame = restore_io::read(path, i, args.depth)
            .with_context(|| format!("Failed to load: {}", path.display()))?;

        print_text(path, &frame, file_size, format, args.stats || verbose > 0);
        if files.len() > 1 {
            println!();
        }
    }
    Ok(())
}

fn print_text(path: &Path, frame: &Frame, file_size: u64, format: Format, stats: bool) {
    let fmt = frame.format();
    println!("{}", path.display());
    println!("  Format:     {}", format.name());
    println!("  Resolution: {}x{}", frame.width(), frame.height());
    println!("  Pixel type: {}", fmt.pixel_type);
    println!("  Bit depth:  {} ({:?} range)", fmt.bit_depth, fmt.quant_range);
    println!("  Transfer:   {:?}", fmt.transfer);
    println!("  Matrix:     {:?}", fmt.color_matrix);
    println!("  Primaries:  {:?}", fmt.color_prim);
    println!("  File size:  {}", super::format_size(file_size));

    if stats {
        println!("  Planes:");
        for (channel, plane) in frame.planes() {
            let (lo, hi) = plane.min_max();
            println!(
                "    {:?}: min {} max {} mean {:.2} var {:.2}",
                channel,
                lo,
                hi,
                plane.mean(),
                plane.variance()
            );
        }
    }
}
