//! CLI command implementations

pub mod dehaze;
pub mod highlight;
pub mod info;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use restore_core::Frame;

/// Parses a single YAML scalar into a serde enum (`srgb`, `bt709`, ...).
pub fn parse_yaml_value<T: DeserializeOwned>(s: &str) -> std::result::Result<T, String> {
    serde_yaml::from_str(s).map_err(|e| format!("invalid value '{}': {}", s, e))
}

/// Loads options from a YAML file, or defaults without one.
pub fn load_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))
}

/// Prints effective options as YAML.
pub fn print_config<T: Serialize>(params: &T) -> Result<()> {
    print!("{}", serde_yaml::to_string(params).context("Failed to serialize options")?);
    Ok(())
}

/// Expands glob patterns; a pattern that matches nothing is kept as a literal path.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let matched: Vec<PathBuf> = glob::glob(pattern)
            .with_context(|| format!("Bad input pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matched.is_empty() {
            files.push(PathBuf::from(pattern));
        } else {
            files.extend(matched);
        }
    }
    if files.is_empty() {
        bail!("No input files");
    }
    Ok(files)
}

/// Output path for `input`.
///
/// With `output` and several inputs, `output` is a directory and the tagged
/// file name goes inside it. Without `output`, the tagged name sits next to
/// the input.
pub fn output_path(input: &Path, output: Option<&Path>, tag: &str, many: bool) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Input has no file name: {}", input.display()))?;
    let ext = input.extension().and_then(|e| e.to_str()).unwrap_or("png");
    let name = format!("{}{}.{}", stem, tag, ext);

    Ok(match output {
        Some(out) if many || out.is_dir() => out.join(name),
        Some(out) => out.to_path_buf(),
        None => input.with_file_name(name),
    })
}

/// Runs `process` over every input, writing each result.
///
/// Placeholder frames from failed decodes are skipped and counted as
/// failures; the run fails if any input failed.
pub fn run_each<F>(
    files: &[PathBuf],
    output: Option<&Path>,
    tag: &str,
    depth: u8,
    verbose: u8,
    mut process: F,
) -> Result<()>
where
    F: FnMut(&Path, &Frame) -> Result<Frame>,
{
    let many = files.len() > 1;
    if many {
        if let Some(dir) = output {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        }
    }

    let mut success = 0usize;
    let mut failed = 0usize;
    for (frame_num, input) in files.iter().enumerate() {
        let frame = restore_io::read_or_default(input, frame_num, depth);
        if frame.is_empty() {
            warn!(path = %input.display(), "skipping unreadable input");
            eprintln!("Error: could not read {}", input.display());
            failed += 1;
            continue;
        }

        let result = process(input, &frame).and_then(|out| {
            let dst = output_path(input, output, tag, many)?;
            restore_io::write(&out, &dst)
                .with_context(|| format!("Failed to save: {}", dst.display()))?;
            Ok(dst)
        });
        match result {
            Ok(dst) => {
                success += 1;
                if verbose > 0 {
                    println!("{} -> {}", input.display(), dst.display());
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("Error: {}: {:#}", input.display(), e);
            }
        }
    }

    info!(success, failed, "processing complete");
    if many || failed > 0 {
        println!("Processed: {} success, {} failed", success, failed);
    }
    if failed > 0 {
        bail!("{} file(s) failed", failed);
    }
    Ok(())
}

/// Format file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
