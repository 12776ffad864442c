use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TesseraError {
    #[error("Failed to load image '{path}': {source}")]
    ImageLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to save image '{path}': {source}")]
    ImageSave {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("No valid images found in input")]
    NoImages,

    #[error("Input path does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("No parameter set produced a usable silhouette")]
    ExtractionFailed,

    #[error("Boundary trace of component {component} did not close into a loop")]
    OpenBoundary { component: u32 },

    #[error("Polygon collapsed to {points} point(s), need at least 3")]
    DegeneratePolygon { points: usize },

    #[error("Ear clipping stuck with {remaining} vertices left (degenerate polygon?)")]
    Triangulation { remaining: usize },

    #[error("Image has no opaque pixels")]
    EmptySilhouette,

    #[error("Failed to write output file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to compress PNG '{path}': {message}")]
    PngCompress { path: PathBuf, message: String },
}
