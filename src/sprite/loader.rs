use std::path::Path;

use anyhow::{Context, Result};
use image::ImageReader;
use log::info;
use rayon::prelude::*;

use super::SourceSprite;
use crate::error::TesseraError;

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Image path with its base directory for computing relative paths
struct ImagePath {
    path: std::path::PathBuf,
    base: Option<std::path::PathBuf>,
}

/// Load sprites from input paths (files or directories)
///
/// When `base_dir` is provided, individual file inputs will have their sprite
/// names computed as paths relative to that directory, preserving subdirectory
/// structure in output metadata. Config-file loading uses this to pass the
/// config directory as the base.
pub fn load_sprites(
    inputs: &[impl AsRef<Path>],
    base_dir: Option<&Path>,
) -> Result<Vec<SourceSprite>> {
    let image_paths = collect_image_paths(inputs, base_dir)?;

    if image_paths.is_empty() {
        return Err(TesseraError::NoImages.into());
    }

    info!("Loading {} images...", image_paths.len());

    image_paths
        .par_iter()
        .map(|img_path| load_single_sprite(&img_path.path, img_path.base.as_deref()))
        .collect()
}

fn collect_image_paths(
    inputs: &[impl AsRef<Path>],
    base_dir: Option<&Path>,
) -> Result<Vec<ImagePath>> {
    let mut paths = Vec::new();

    for input in inputs {
        let path = input.as_ref();
        if !path.exists() {
            return Err(TesseraError::InputNotFound(path.to_path_buf()).into());
        }

        if path.is_file() {
            if is_supported_image(path) {
                paths.push(ImagePath {
                    path: path.to_path_buf(),
                    base: base_dir.map(Path::to_path_buf),
                });
            }
        } else if path.is_dir() {
            collect_from_directory(path, path, &mut paths)?;
        }
    }

    Ok(paths)
}

fn collect_from_directory(base: &Path, dir: &Path, paths: &mut Vec<ImagePath>) -> Result<()> {
    for entry in std::fs::read_dir(dir).context("Failed to read directory")? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && is_supported_image(&path) {
            paths.push(ImagePath {
                path,
                base: Some(base.to_path_buf()),
            });
        } else if path.is_dir() {
            collect_from_directory(base, &path, paths)?;
        }
    }

    Ok(())
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_single_sprite(path: &Path, base: Option<&Path>) -> Result<SourceSprite> {
    let image = ImageReader::open(path)
        .map_err(|e| TesseraError::ImageLoad {
            path: path.to_path_buf(),
            source: e.into(),
        })?
        .decode()
        .map_err(|e| TesseraError::ImageLoad {
            path: path.to_path_buf(),
            source: e,
        })?
        .into_rgba8();

    // Sprite name: relative path with extension for directory inputs,
    // or filename with extension for individual file inputs
    let name = match base {
        Some(base_dir) => path
            .strip_prefix(base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string(),
        None => path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string(),
    };

    Ok(SourceSprite {
        path: path.to_path_buf(),
        name,
        image,
    })
}
