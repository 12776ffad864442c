use std::path::Path;

use anyhow::Result;
use image::{Rgba, RgbaImage};

use crate::error::TesseraError;
use crate::silhouette::{PassParams, PixelFlags, silhouette_flags};

const MASKS: [(PixelFlags, &str); 3] = [
    (PixelFlags::BOUNDARY, "boundary"),
    (PixelFlags::DILATED, "dilated"),
    (PixelFlags::BAND, "band"),
];

/// Write the per-pixel flag masks of one extraction pass as grayscale
/// bitmaps, for eyeballing why a sprite simplified the way it did.
pub fn write_debug_masks(
    image: &RgbaImage,
    params: PassParams,
    output_dir: &Path,
    name: &str,
) -> Result<()> {
    let flags = silhouette_flags(image, params);
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sprite");

    for (bit, suffix) in MASKS {
        let mut out = RgbaImage::new(image.width(), image.height());
        for (x, y, p) in out.enumerate_pixels_mut() {
            *p = if flags[(x as usize, y as usize)].intersects(bit) {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([127, 127, 127, 255])
            };
        }
        let path = output_dir.join(format!(
            "{stem}_{suffix}_{:02}_{:02}.png",
            params.dilation, params.band
        ));
        out.save(&path).map_err(|e| TesseraError::ImageSave {
            path: path.clone(),
            source: e,
        })?;
    }

    Ok(())
}
