//! Silhouette extraction: raster alpha mask to simplified closed polygons.
//!
//! A sweep of parameter tuples runs the per-pixel pipeline (dilate, close
//! holes, mark boundaries, grow the polygon band), labels connected
//! components, traces one closed loop per component and simplifies it; the
//! lowest-scoring successful tuple wins.

mod extract;
mod flags;
mod label;
mod trace;

pub use extract::{
    DEFAULT_PASSES, Extraction, PassParams, extract_polygons, silhouette_flags, trace_polygons,
};
pub use flags::PixelFlags;
pub use label::{MetaPixel, label_components};
pub use trace::trace_component;
