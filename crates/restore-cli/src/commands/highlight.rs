//! Highlight removal command

use anyhow::{Context, Result};
use tracing::{debug, trace, warn};

use crate::HighlightArgs;
use restore_ops::highlight::{remove_highlights, HighlightParams};

fn params_from(args: &HighlightArgs) -> Result<HighlightParams> {
    let mut p: HighlightParams = super::load_config(args.io.config.as_deref())?;
    if let Some(v) = args.threshold {
        p.threshold = v;
    }
    if let Some(v) = args.sigma_s {
        p.sigma_s = v;
    }
    if let Some(v) = args.sigma_r {
        p.sigma_r = v;
    }
    if let Some(v) = args.pbfic {
        p.pbfic_num = v;
    }
    if let Some(v) = args.max_iterations {
        p.max_iterations = v;
    }
    if let Some(v) = args.io.exec {
        p.execution = v;
    }
    p.validate().context("Invalid highlight options")?;
    Ok(p)
}

pub fn run(args: HighlightArgs, verbose: u8) -> Result<()> {
    trace!(inputs = args.io.input.len(), "highlight::run");
    let params = params_from(&args)?;
    if args.io.print_config {
        return super::print_config(&params);
    }
    debug!(?params, "highlight options");

    let files = super::expand_inputs(&args.io.input)?;
    let tag = args.io.tag.as_deref().unwrap_or(".highlight");
    super::run_each(&files, args.io.output.as_deref(), tag, args.io.depth, verbose, |input, frame| {
        let out = remove_highlights(frame, &params)
            .with_context(|| format!("Highlight removal failed: {}", input.display()))?;
        if !out.converged {
            warn!(path = %input.display(), iterations = out.iterations, "refinement hit the pass limit");
        }
        if verbose > 0 {
            println!(
                "{}: {} pass(es){}",
                input.display(),
                out.iterations,
                if out.converged { "" } else { ", not converged" }
            );
        }
        Ok(out.frame)
    })
}
