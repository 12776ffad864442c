use image::RgbaImage;

use crate::dt::distance_field;
use crate::error::TesseraError;
use crate::grid::Grid;
use crate::polygon::{Point, Polygon};
use crate::raster::{downsample4, fill_triangles};
use crate::strip::{flatten_points, stripify, triangulate_all};
use crate::triangulate::Tri;

/// One sprite prepared for packing: pixels, geometry and the coarse grids
/// the placement search runs on. Moved into the packer on add and owned by
/// it from then on; `location` is set exactly once, on placement.
#[derive(Debug, Clone)]
pub struct AtlasFragment {
    pub name: String,
    pub image: RgbaImage,
    pub polygons: Vec<Polygon>,
    /// All polygon points flattened in index order.
    pub points: Vec<Point>,
    /// Triangles indexing into `points`.
    pub tris: Vec<Tri>,
    /// Triangle strip over `points`, segments separated by the restart
    /// sentinel.
    pub strip: Vec<u32>,
    /// 4x4-block occupancy counts of the triangle-covered area.
    pub usage: Grid<u8>,
    /// Normalized distance field over `usage`.
    pub distance: Grid<f32>,
    /// Number of nonzero blocks in `usage`; placement order sorts on this.
    pub used_blocks: usize,
    /// Coarse block offset in the atlas, set once on placement.
    pub location: Option<(usize, usize)>,
}

impl AtlasFragment {
    /// Triangulate the extracted polygons, build the strip and rasterize the
    /// covered area down to the coarse occupancy grid.
    pub fn build(
        name: String,
        image: RgbaImage,
        polygons: Vec<Polygon>,
    ) -> Result<Self, TesseraError> {
        let (tris, _) = triangulate_all(&polygons)?;
        let points = flatten_points(&polygons);
        let strip = stripify(&tris, true);

        let mut mask = Grid::new(image.width() as usize, image.height() as usize, 0u8);
        fill_triangles(&mut mask, &points, &tris);
        let (usage, used_blocks) = downsample4(&mask);
        let distance = distance_field(&usage);

        Ok(Self {
            name,
            image,
            polygons,
            points,
            tris,
            strip,
            usage,
            distance,
            used_blocks,
            location: None,
        })
    }

    /// Width in coarse blocks.
    pub fn block_width(&self) -> usize {
        self.usage.width()
    }

    /// Height in coarse blocks.
    pub fn block_height(&self) -> usize {
        self.usage.height()
    }

    pub fn is_placed(&self) -> bool {
        self.location.is_some()
    }
}
