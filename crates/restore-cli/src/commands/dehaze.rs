//! Haze removal command

use anyhow::{Context, Result};
use tracing::{debug, info, trace};

use crate::DehazeArgs;
use restore_ops::haze::{remove_haze, HazeParams, TMapEstimator};

fn params_from(args: &DehazeArgs) -> Result<HazeParams> {
    let mut p: HazeParams = super::load_config(args.io.config.as_deref())?;
    macro_rules! set {
        ($($field:ident),*) => {
            $(if let Some(v) = args.$field { p.$field = v; })*
        };
    }
    set!(
        transfer, tmap_thr, al_max, tmap_min, tmap_max, strength, pp_mode, pp_sigma, lower_thr,
        upper_thr, hist_bins, luma_mode
    );
    if !args.sigmas.is_empty() {
        p.sigmas = args.sigmas.clone();
    }
    if let Some(v) = args.io.exec {
        p.execution = v;
    }
    p.validate().context("Invalid dehaze options")?;
    Ok(p)
}

pub fn run(args: DehazeArgs, verbose: u8) -> Result<()> {
    trace!(inputs = args.io.input.len(), "dehaze::run");
    let params = params_from(&args)?;
    if args.io.print_config {
        return super::print_config(&params);
    }
    debug!(?params, "dehaze options");
    info!(strength = params.strength, scales = ?params.sigmas, "Removing haze");

    let files = super::expand_inputs(&args.io.input)?;
    let tag = args.io.tag.as_deref().unwrap_or(".dehaze");
    let estimator = TMapEstimator::Retinex;
    super::run_each(&files, args.io.output.as_deref(), tag, args.io.depth, verbose, |input, frame| {
        remove_haze(frame, &params, &estimator)
            .with_context(|| format!("Haze removal failed: {}", input.display()))
    })
}
