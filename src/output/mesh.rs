use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::atlas::{AtlasPacker, BuildReport};
use crate::error::TesseraError;
use crate::strip::RESTART;

#[derive(Serialize)]
struct MeshOutput {
    meta: Meta,
    image: String,
    width: u32,
    height: u32,
    /// Restart sentinel value, absent when strips use degenerate joins
    #[serde(skip_serializing_if = "Option::is_none")]
    restart_index: Option<u32>,
    /// Normalized (u, v) positions, half-pixel centered
    vertices: Vec<[f32; 2]>,
    /// One triangle strip over `vertices` covering every placed sprite
    indices: Vec<u32>,
    sprites: Vec<MeshSprite>,
    /// Sprites that did not fit within the atlas size limit
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<String>,
}

#[derive(Serialize)]
struct Meta {
    app: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct MeshSprite {
    name: String,
    /// Placement in atlas pixels
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    /// Range of this sprite's vertices in the shared vertex list
    vertex_offset: u32,
    vertex_count: u32,
}

fn build_mesh(
    packer: &AtlasPacker,
    report: &BuildReport,
    base_name: &str,
    keep_restart: bool,
) -> MeshOutput {
    let mut sprites = Vec::new();
    let mut vertex_offset = 0u32;
    for frag in packer.fragments() {
        let Some((bx, by)) = frag.location else {
            continue;
        };
        let vertex_count = frag.points.len() as u32;
        sprites.push(MeshSprite {
            name: frag.name.clone(),
            x: (bx * 4) as u32,
            y: (by * 4) as u32,
            width: frag.image.width(),
            height: frag.image.height(),
            vertex_offset,
            vertex_count,
        });
        vertex_offset += vertex_count;
    }

    MeshOutput {
        meta: Meta {
            app: "tessera",
            version: env!("CARGO_PKG_VERSION"),
        },
        image: format!("{base_name}.png"),
        width: report.width,
        height: report.height,
        restart_index: keep_restart.then_some(RESTART),
        vertices: packer.export_vertices(),
        indices: packer.export_indices(keep_restart),
        sprites,
        failed: report.failed.clone(),
    }
}

/// Write the GPU mesh metadata file next to the atlas bitmap
pub fn write_mesh(
    packer: &AtlasPacker,
    report: &BuildReport,
    output_dir: &Path,
    base_name: &str,
    keep_restart: bool,
) -> Result<()> {
    let mesh = build_mesh(packer, report, base_name, keep_restart);
    let json_path = output_dir.join(format!("{base_name}.json"));
    let content = serde_json::to_string_pretty(&mesh)?;

    fs::write(&json_path, content).map_err(|e| TesseraError::OutputWrite {
        path: json_path,
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{AtlasFragment, PackerConfig};
    use crate::polygon::{Point, Polygon};
    use image::{Rgba, RgbaImage};

    fn square_fragment(name: &str, size: u32) -> AtlasFragment {
        let mut img = RgbaImage::new(size, size);
        for p in img.pixels_mut() {
            *p = Rgba([255, 255, 255, 255]);
        }
        let s = size as i32;
        let poly = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(s - 1, 0),
            Point::new(s - 1, s - 1),
            Point::new(0, s - 1),
        ]);
        AtlasFragment::build(name.into(), img, vec![poly]).unwrap()
    }

    #[test]
    fn test_mesh_ranges_line_up() {
        let mut packer = AtlasPacker::new(PackerConfig {
            initial_width: 64,
            initial_height: 64,
            max_width: 256,
            max_height: 256,
            dt_interval: 1,
        });
        packer.add(square_fragment("a", 32));
        packer.add(square_fragment("b", 16));
        let report = packer.build();
        assert!(report.success());

        let mesh = build_mesh(&packer, &report, "atlas", true);
        assert_eq!(mesh.image, "atlas.png");
        assert_eq!(mesh.restart_index, Some(RESTART));
        assert_eq!(mesh.sprites.len(), 2);
        // sprite vertex ranges tile the shared vertex list without gaps
        let mut expect_offset = 0u32;
        for s in &mesh.sprites {
            assert_eq!(s.vertex_offset, expect_offset);
            expect_offset += s.vertex_count;
        }
        assert_eq!(expect_offset as usize, mesh.vertices.len());
        assert!(mesh.failed.is_empty());

        let degen = build_mesh(&packer, &report, "atlas", false);
        assert_eq!(degen.restart_index, None);
        assert!(!degen.indices.contains(&RESTART));
    }
}
