//! restore - specular highlight and haze removal for still images

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use restore_core::{Execution, TransferChar};
use restore_ops::{LumaMode, PostProcess};

mod commands;

#[derive(Parser)]
#[command(name = "restore")]
#[command(author, version, about = "Specular highlight and haze removal")]
#[command(long_about = "
Restores still images: removes specular highlights or atmospheric haze.

Examples:
  restore info photo.png                          # Show frame info
  restore highlight shiny.png -o diffuse.png      # Remove highlights
  restore highlight 'shots/*.jpg' --tag .diffuse  # Batch, tagged outputs
  restore dehaze hazy.jpg -o clear.png --strength 0.7
  restore dehaze hazy.jpg --config dehaze.yaml --sigma 10 --sigma 60
  restore -j 4 -vv dehaze 'frames/*.png' -o out/
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Display frame information and plane statistics
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Remove specular highlights
    #[command(visible_alias = "hl")]
    Highlight(HighlightArgs),

    /// Remove haze
    #[command(visible_alias = "dh")]
    Dehaze(DehazeArgs),
}

/// Inputs, outputs and decoding options shared by the filters.
#[derive(Args)]
struct IoArgs {
    /// Input image(s); glob patterns are expanded
    #[arg(required = true)]
    input: Vec<String>,

    /// Output file, or directory when several inputs match
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Suffix appended to the input file stem when no output is given
    #[arg(long)]
    tag: Option<String>,

    /// Working bit depth of decoded frames
    #[arg(short = 'd', long, default_value = "16")]
    depth: u8,

    /// YAML file with filter options; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective options as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Traversal strategy (sequential, threaded, data-parallel)
    #[arg(long)]
    exec: Option<Execution>,
}

#[derive(Args)]
struct InfoArgs {
    /// Input image(s); glob patterns are expanded
    #[arg(required = true)]
    input: Vec<String>,

    /// Working bit depth of decoded frames
    #[arg(short = 'd', long, default_value = "16")]
    depth: u8,

    /// Show per-plane statistics
    #[arg(short, long)]
    stats: bool,
}

#[derive(Args)]
struct HighlightArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Convergence threshold as a fraction of the value range
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Bilateral spatial sigma in pixels
    #[arg(long)]
    sigma_s: Option<f64>,

    /// Bilateral range sigma as a fraction of the value range
    #[arg(long)]
    sigma_r: Option<f64>,

    /// PBFIC levels (0 = brute force)
    #[arg(long)]
    pbfic: Option<usize>,

    /// Refinement pass limit
    #[arg(long)]
    max_iterations: Option<usize>,
}

#[derive(Args)]
struct DehazeArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Processing transfer characteristic (e.g. bt709, srgb, linear)
    #[arg(long = "transfer", value_parser = commands::parse_yaml_value::<TransferChar>)]
    transfer: Option<TransferChar>,

    /// Fraction of brightest map pixels used for atmospheric light
    #[arg(long)]
    tmap_thr: Option<f64>,

    /// Atmospheric light cap
    #[arg(long)]
    al_max: Option<f32>,

    /// Lower transmission clamp
    #[arg(long)]
    tmap_min: Option<f32>,

    /// Upper transmission clamp
    #[arg(long)]
    tmap_max: Option<f32>,

    /// Blend toward the dehazed result (0 = unchanged)
    #[arg(short = 's', long)]
    strength: Option<f32>,

    /// Post-processing: 0 none, 1 stretch, 2 smoothed stretch, 3 sharpen + stretch
    #[arg(long)]
    pp_mode: Option<PostProcess>,

    /// Gaussian sigma for post-processing
    #[arg(long)]
    pp_sigma: Option<f64>,

    /// Fraction clipped at the bottom by the stretch
    #[arg(short = 'L', long)]
    lower_thr: Option<f64>,

    /// Fraction clipped at the top by the stretch
    #[arg(short = 'U', long)]
    upper_thr: Option<f64>,

    /// Histogram bins for quantile lookups
    #[arg(long)]
    hist_bins: Option<usize>,

    /// Luma reference: 0 min, 1 luma, 2 max
    #[arg(short = 'Y', long)]
    luma_mode: Option<LumaMode>,

    /// Retinex scale in pixels (repeatable)
    #[arg(long = "sigma")]
    sigmas: Vec<f64>,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Highlight(args) => commands::highlight::run(args, cli.verbose),
        Commands::Dehaze(args) => commands::dehaze::run(args, cli.verbose),
    }
}
