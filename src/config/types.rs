use serde::{Deserialize, Serialize};

use crate::silhouette::PassParams;

/// PNG compression level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompressConfig {
    /// Optimization level 0-6
    Level(u8),
    /// Maximum compression ("max")
    Max(String),
}

/// Tessera configuration file structure.
///
/// All paths in the config are relative to the config file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    /// Config file version (currently 1)
    pub version: u32,
    /// Input file paths or glob patterns
    pub input: Vec<String>,
    /// Output directory for atlas files
    pub output_dir: String,
    /// Base name for output files (atlas.png, atlas.json)
    pub name: String,
    /// Initial atlas width in pixels
    pub initial_width: u32,
    /// Initial atlas height in pixels
    pub initial_height: u32,
    /// Maximum atlas width in pixels
    pub max_width: u32,
    /// Maximum atlas height in pixels
    pub max_height: u32,
    /// Recompute the packing distance field every Nth placement
    pub dt_interval: usize,
    /// Join strips with degenerate triangles instead of restart indices
    pub degenerate_strips: bool,
    /// Extraction parameter sweep; omit to use the built-in set
    pub passes: Option<Vec<PassParams>>,
    /// PNG compression configuration (optional)
    pub compress: Option<CompressConfig>,
}

impl Default for TesseraConfig {
    fn default() -> Self {
        Self {
            version: 1,
            input: Vec::new(),
            output_dir: ".".to_string(),
            name: "atlas".to_string(),
            initial_width: 256,
            initial_height: 256,
            max_width: 4096,
            max_height: 4096,
            dt_interval: 4,
            degenerate_strips: false,
            passes: None,
            compress: None,
        }
    }
}
