use image::RgbaImage;
use std::path::PathBuf;

/// A decoded source sprite before extraction and packing
#[derive(Debug, Clone)]
pub struct SourceSprite {
    /// Original file path
    pub path: PathBuf,
    /// Unique identifier (relative path for directory inputs)
    pub name: String,
    /// Decoded RGBA pixel data
    pub image: RgbaImage,
}

impl SourceSprite {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
