use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use rayon::prelude::*;

use tessera::atlas::{AtlasFragment, AtlasPacker, PackerConfig};
use tessera::cli::{CliArgs, CompressionLevel};
use tessera::config::{CompressConfig, LoadedConfig};
use tessera::output::{save_atlas_image, write_debug_masks, write_mesh};
use tessera::silhouette::{DEFAULT_PASSES, PassParams, extract_polygons};
use tessera::sprite::load_sprites;

#[allow(clippy::print_stderr)]
fn main() {
    if let Err(e) = run() {
        // Use eprintln instead of error! because logger may not be initialized
        // (e.g., config loading fails before logger init)
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = CliArgs::parse();
    let merged = merge_config_with_args(&cli)?;

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_timestamp(None)
        .format_target(false)
        .init();

    info!("Tessera atlas packer v{}", env!("CARGO_PKG_VERSION"));

    if !merged.output.exists() {
        fs::create_dir_all(&merged.output)?;
    }

    let sprites = load_sprites(&merged.input, merged.base_dir.as_deref())?;
    info!("Loaded {} sprites", sprites.len());

    // Per-sprite extraction and triangulation are independent; only the
    // placement search below is serial.
    let results: Vec<_> = sprites
        .into_par_iter()
        .map(|sprite| {
            let name = sprite.name.clone();
            let frag = extract_polygons(&sprite.image, &merged.passes).and_then(|ex| {
                let params = ex.params;
                AtlasFragment::build(name.clone(), sprite.image, ex.polygons)
                    .map(|frag| (frag, params))
            });
            (name, frag)
        })
        .collect();

    let mut packer = AtlasPacker::new(PackerConfig {
        initial_width: merged.initial_width,
        initial_height: merged.initial_height,
        max_width: merged.max_width,
        max_height: merged.max_height,
        dt_interval: merged.dt_interval,
    });
    let mut skipped = 0usize;
    for (name, frag) in results {
        match frag {
            Ok((frag, params)) => {
                if cli.dump_debug {
                    write_debug_masks(&frag.image, params, &merged.output, &frag.name)?;
                }
                packer.add(frag);
            }
            Err(e) => {
                warn!("Skipping '{}': {}", name, e);
                skipped += 1;
            }
        }
    }
    if packer.fragments().is_empty() {
        bail!("no sprite produced a usable silhouette");
    }

    let report = packer.build();

    let png_path = merged.output.join(format!("{}.png", merged.name));
    save_atlas_image(packer.pixels(), &png_path, merged.compress)?;
    info!("Saved {}", png_path.display());

    write_mesh(
        &packer,
        &report,
        &merged.output,
        &merged.name,
        !merged.degenerate_strips,
    )?;
    info!("Generated {}.json", merged.name);

    if skipped > 0 || !report.success() {
        warn!(
            "Finished with {} unextracted and {} unplaced sprites",
            skipped,
            report.failed.len()
        );
    } else {
        info!("Done!");
    }

    Ok(())
}

/// Merged configuration from CLI args and optional config file.
struct MergedConfig {
    input: Vec<PathBuf>,
    base_dir: Option<PathBuf>,
    output: PathBuf,
    name: String,
    initial_width: u32,
    initial_height: u32,
    max_width: u32,
    max_height: u32,
    dt_interval: usize,
    degenerate_strips: bool,
    passes: Vec<PassParams>,
    compress: Option<CompressionLevel>,
}

/// Merge config file values with CLI arguments.
/// CLI arguments always take precedence over config values.
fn merge_config_with_args(args: &CliArgs) -> Result<MergedConfig> {
    let loaded_config = if let Some(config_path) = &args.config {
        Some(
            LoadedConfig::load(config_path)
                .with_context(|| format!("failed to load config: {}", config_path.display()))?,
        )
    } else {
        None
    };

    let input = if !args.input.is_empty() {
        args.input.clone()
    } else if let Some(ref lc) = loaded_config {
        lc.resolve_inputs()
            .context("failed to resolve input files from config")?
    } else {
        // This shouldn't happen due to clap's required_unless_present
        Vec::new()
    };

    // Sprite names stay relative to the config directory when inputs come
    // from a config file
    let base_dir = loaded_config.as_ref().map(|lc| lc.config_dir.clone());

    let output = args.output.clone().unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.resolve_output_dir())
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let name = args.name.clone().unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.config.name.clone())
            .unwrap_or_else(|| "atlas".to_string())
    });

    let initial_width = args.initial_width.unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.config.initial_width)
            .unwrap_or(256)
    });

    let initial_height = args.initial_height.unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.config.initial_height)
            .unwrap_or(256)
    });

    let max_width = args.max_width.unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.config.max_width)
            .unwrap_or(4096)
    });

    let max_height = args.max_height.unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.config.max_height)
            .unwrap_or(4096)
    });

    let dt_interval = args.dt_interval.unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.config.dt_interval)
            .unwrap_or(4)
    });

    let degenerate_strips = if args.degenerate_strips {
        true
    } else if let Some(ref lc) = loaded_config {
        lc.config.degenerate_strips
    } else {
        false
    };

    let passes = loaded_config
        .as_ref()
        .and_then(|lc| lc.config.passes.clone())
        .unwrap_or_else(|| DEFAULT_PASSES.to_vec());

    let compress = if args.compress.is_some() {
        args.compress
    } else if let Some(ref lc) = loaded_config {
        lc.config.compress.as_ref().map(|c| match c {
            CompressConfig::Level(n) => CompressionLevel::Level(*n),
            CompressConfig::Max(_) => CompressionLevel::Max,
        })
    } else {
        None
    };

    Ok(MergedConfig {
        input,
        base_dir,
        output,
        name,
        initial_width,
        initial_height,
        max_width,
        max_height,
        dt_interval,
        degenerate_strips,
        passes,
        compress,
    })
}
