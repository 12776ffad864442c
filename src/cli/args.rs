use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(version, about = "Polygon-trimmed sprite atlas packer", long_about = None)]
pub struct CliArgs {
    /// Input image files or directories
    #[arg(required_unless_present = "config")]
    pub input: Vec<PathBuf>,

    /// Load settings from a .tessera config file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory for atlas files [default: .]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Base name for output files (atlas.png, atlas.json) [default: atlas]
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Initial atlas width in pixels [default: 256]
    #[arg(long)]
    pub initial_width: Option<u32>,

    /// Initial atlas height in pixels [default: 256]
    #[arg(long)]
    pub initial_height: Option<u32>,

    /// Maximum atlas width in pixels [default: 4096]
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Maximum atlas height in pixels [default: 4096]
    #[arg(long)]
    pub max_height: Option<u32>,

    /// Recompute the packing distance field every Nth placement [default: 4]
    #[arg(long)]
    pub dt_interval: Option<usize>,

    /// Join triangle strips with degenerate triangles instead of restart indices
    #[arg(long)]
    pub degenerate_strips: bool,

    /// Write per-sprite silhouette flag masks next to the atlas outputs
    #[arg(long)]
    pub dump_debug: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Compress PNG output (0-6 or 'max'). Default level is 2 if flag is present without value.
    #[arg(long, value_name = "LEVEL", default_missing_value = "2", num_args = 0..=1)]
    pub compress: Option<CompressionLevel>,
}

/// PNG compression level (0-6 or max)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// Optimization level 0-6
    Level(u8),
    /// Maximum compression
    Max,
}

impl std::str::FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("max") {
            Ok(CompressionLevel::Max)
        } else {
            s.parse::<u8>()
                .map_err(|_e| format!("invalid compression level: {}", s))
                .and_then(|n| {
                    if n <= 6 {
                        Ok(CompressionLevel::Level(n))
                    } else {
                        Err(format!("compression level must be 0-6 or 'max', got {}", n))
                    }
                })
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        CompressionLevel::Level(2)
    }
}
