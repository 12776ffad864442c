pub mod atlas;
pub mod cli;
pub mod config;
pub mod dt;
pub mod error;
pub mod grid;
pub mod output;
pub mod polygon;
pub mod raster;
pub mod silhouette;
pub mod sprite;
pub mod strip;
pub mod triangulate;

pub use atlas::{AtlasFragment, AtlasPacker, BuildReport, PackerConfig};
pub use error::TesseraError;
pub use grid::Grid;
pub use polygon::{Point, Polygon};
pub use silhouette::{DEFAULT_PASSES, PassParams, extract_polygons};
pub use sprite::{SourceSprite, load_sprites};
