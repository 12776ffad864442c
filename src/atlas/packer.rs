use image::RgbaImage;
use log::{debug, info, warn};

use crate::dt::distance_field;
use crate::grid::Grid;
use crate::raster::blit_triangles;
use crate::strip::{RESTART, restarts_to_degenerate};

use super::fragment::AtlasFragment;

/// Atlas dimensions and search tuning.
#[derive(Debug, Clone, Copy)]
pub struct PackerConfig {
    pub initial_width: u32,
    pub initial_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// Recompute the distance field every Nth placement (1 = after every
    /// one). A stale field only degrades placement quality, never
    /// correctness: collisions are checked against the exact occupancy grid.
    pub dt_interval: usize,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            initial_width: 256,
            initial_height: 256,
            max_width: 4096,
            max_height: 4096,
            dt_interval: 4,
        }
    }
}

/// Outcome of a build: how many fragments landed, which did not, and the
/// final bitmap dimensions.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub fitted: usize,
    pub failed: Vec<String>,
    pub width: u32,
    pub height: u32,
}

impl BuildReport {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the growing atlas bitmap and its coarse occupancy/distance grids,
/// and searches, places and commits fragments into them.
///
/// The search minimizes the summed distance field over the blocks a
/// fragment would cover, packing against already-dense area instead of
/// scattering into open space. Placement failure is recoverable: the atlas
/// is enlarged and the search retried until the size limit is hit.
pub struct AtlasPacker {
    config: PackerConfig,
    frags: Vec<AtlasFragment>,
    pixels: RgbaImage,
    usage: Grid<u8>,
    distance: Grid<f32>,
    placed: usize,
    since_refresh: usize,
}

impl AtlasPacker {
    pub fn new(config: PackerConfig) -> Self {
        let w = config.initial_width.min(config.max_width).max(4);
        let h = config.initial_height.min(config.max_height).max(4);
        let usage = Grid::new(w.div_ceil(4) as usize, h.div_ceil(4) as usize, 0u8);
        let distance = distance_field(&usage);
        Self {
            config,
            frags: Vec::new(),
            pixels: RgbaImage::new(w, h),
            usage,
            distance,
            placed: 0,
            since_refresh: 0,
        }
    }

    /// Move a fragment into the packer's list. Nothing is placed until
    /// [`AtlasPacker::build`] runs.
    pub fn add(&mut self, frag: AtlasFragment) {
        self.frags.push(frag);
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn fragments(&self) -> &[AtlasFragment] {
        &self.frags
    }

    /// Sort all fragments by descending block footprint and place them one
    /// by one, enlarging the atlas whenever a fragment finds no offset. A
    /// fragment that still fails at the size limit is reported and skipped.
    pub fn build(&mut self) -> BuildReport {
        self.frags
            .sort_by(|a, b| b.used_blocks.cmp(&a.used_blocks));

        let mut failed = Vec::new();
        for i in 0..self.frags.len() {
            loop {
                let first = self.placed == 0;
                if let Some(offset) = self.find_offset(&self.frags[i], first) {
                    self.commit(i, offset);
                    debug!(
                        "Placed '{}' at block ({}, {})",
                        self.frags[i].name, offset.0, offset.1
                    );
                    break;
                }
                if !self.enlarge() {
                    warn!(
                        "No space for fragment '{}' within {}x{}",
                        self.frags[i].name, self.config.max_width, self.config.max_height
                    );
                    failed.push(self.frags[i].name.clone());
                    break;
                }
            }
        }

        let (width, height) = self.pixels.dimensions();
        info!(
            "Packed {} of {} fragments into {}x{}",
            self.placed,
            self.frags.len(),
            width,
            height
        );
        BuildReport {
            fitted: self.placed,
            failed,
            width,
            height,
        }
    }

    /// Best placement offset for a fragment, in coarse blocks. The very
    /// first fragment is anchored at (0, 0) unconditionally so the distance
    /// field has something to pack against.
    fn find_offset(&self, frag: &AtlasFragment, first: bool) -> Option<(usize, usize)> {
        let fw = frag.block_width();
        let fh = frag.block_height();
        let aw = self.usage.width();
        let ah = self.usage.height();
        if fw > aw || fh > ah {
            return None;
        }
        if first {
            return Some((0, 0));
        }

        let mut best: Option<((usize, usize), f32)> = None;
        for yo in 0..=ah - fh {
            for xo in 0..=aw - fw {
                let limit = best.map_or(f32::INFINITY, |(_, s)| s);
                if let Some(score) = self.score_at(frag, xo, yo, limit) {
                    if score == 0.0 {
                        return Some((xo, yo));
                    }
                    if best.is_none_or(|(_, s)| score < s) {
                        best = Some(((xo, yo), score));
                    }
                }
            }
        }
        best.map(|(offset, _)| offset)
    }

    /// Score one candidate offset: the summed atlas distance over every
    /// block the fragment occupies (lower is better). Returns `None` on a
    /// hard collision or once the partial sum can no longer beat `limit`.
    /// Occupancy is a saturating count but collision is a boolean check.
    fn score_at(&self, frag: &AtlasFragment, xo: usize, yo: usize, limit: f32) -> Option<f32> {
        let mut score = 0.0f32;
        for fy in 0..frag.block_height() {
            for fx in 0..frag.block_width() {
                if frag.usage[(fx, fy)] == 0 {
                    continue;
                }
                if self.usage[(xo + fx, yo + fy)] != 0 {
                    return None;
                }
                score += self.distance[(xo + fx, yo + fy)];
                if score > limit {
                    return None;
                }
            }
        }
        Some(score)
    }

    /// Blit the fragment's pixels, merge its occupancy and record the
    /// placement. The distance field refreshes on the configured cadence,
    /// and always after the first placement so the second fragment does not
    /// score against an all-empty field.
    fn commit(&mut self, idx: usize, (bx, by): (usize, usize)) {
        let frag = &self.frags[idx];
        blit_triangles(
            &mut self.pixels,
            ((bx * 4) as i64, (by * 4) as i64),
            &frag.points,
            &frag.tris,
            &frag.image,
        );
        for fy in 0..frag.block_height() {
            for fx in 0..frag.block_width() {
                let count = frag.usage[(fx, fy)];
                if count != 0 {
                    let cell = &mut self.usage[(bx + fx, by + fy)];
                    *cell = cell.saturating_add(count);
                }
            }
        }

        self.frags[idx].location = Some((bx, by));
        self.placed += 1;
        self.since_refresh += 1;
        if self.placed == 1 || self.since_refresh >= self.config.dt_interval.max(1) {
            self.distance = distance_field(&self.usage);
            self.since_refresh = 0;
        }
    }

    /// Double the smaller atlas dimension (keeping it roughly square),
    /// falling back to the other axis when one is capped. The bitmap grows
    /// to the right/bottom and the coarse grids are rebuilt from the placed
    /// fragments, whose absolute block coordinates stay valid.
    fn enlarge(&mut self) -> bool {
        let (w, h) = self.pixels.dimensions();
        let can_w = w * 2 <= self.config.max_width;
        let can_h = h * 2 <= self.config.max_height;
        let (nw, nh) = if w <= h {
            if can_w {
                (w * 2, h)
            } else if can_h {
                (w, h * 2)
            } else {
                return false;
            }
        } else if can_h {
            (w, h * 2)
        } else if can_w {
            (w * 2, h)
        } else {
            return false;
        };
        debug!("Enlarging atlas {w}x{h} -> {nw}x{nh}");

        let mut pixels = RgbaImage::new(nw, nh);
        image::imageops::replace(&mut pixels, &self.pixels, 0, 0);
        self.pixels = pixels;

        self.usage = Grid::new(nw.div_ceil(4) as usize, nh.div_ceil(4) as usize, 0u8);
        for frag in &self.frags {
            let Some((bx, by)) = frag.location else {
                continue;
            };
            for fy in 0..frag.block_height() {
                for fx in 0..frag.block_width() {
                    let count = frag.usage[(fx, fy)];
                    if count != 0 {
                        let cell = &mut self.usage[(bx + fx, by + fy)];
                        *cell = cell.saturating_add(count);
                    }
                }
            }
        }
        self.distance = distance_field(&self.usage);
        self.since_refresh = 0;
        true
    }

    /// Flat vertex list of all placed fragments as normalized atlas
    /// coordinates, half-pixel offset, computed in double precision to
    /// minimize sampling error.
    pub fn export_vertices(&self) -> Vec<[f32; 2]> {
        let (aw, ah) = self.pixels.dimensions();
        let mut out = Vec::new();
        for frag in &self.frags {
            let Some((bx, by)) = frag.location else {
                continue;
            };
            for p in &frag.points {
                let u = (f64::from(p.x) + (bx * 4) as f64 + 0.5) / f64::from(aw);
                let v = (f64::from(p.y) + (by * 4) as f64 + 0.5) / f64::from(ah);
                out.push([u as f32, v as f32]);
            }
        }
        out
    }

    /// One index stream over the vertex list of [`AtlasPacker::export_vertices`],
    /// fragments joined by the restart sentinel or, with `keep_restart`
    /// false, by degenerate triangles.
    pub fn export_indices(&self, keep_restart: bool) -> Vec<u32> {
        let mut out: Vec<u32> = Vec::new();
        let mut base = 0u32;
        for frag in &self.frags {
            if frag.location.is_none() {
                continue;
            }
            if !out.is_empty() {
                out.push(RESTART);
            }
            out.extend(
                frag.strip
                    .iter()
                    .map(|&i| if i == RESTART { RESTART } else { base + i }),
            );
            base += frag.points.len() as u32;
        }
        if keep_restart {
            out
        } else {
            restarts_to_degenerate(&out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::{Point, Polygon};
    use crate::raster::fill_triangles;
    use crate::strip::strip_to_tris;
    use image::Rgba;

    fn square_fragment(name: &str, size: u32) -> AtlasFragment {
        let mut img = RgbaImage::new(size, size);
        for p in img.pixels_mut() {
            *p = Rgba([128, 128, 128, 255]);
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

    fn config(initial: u32, max: u32, dt_interval: usize) -> PackerConfig {
        PackerConfig {
            initial_width: initial,
            initial_height: initial,
            max_width: max,
            max_height: max,
            dt_interval,
        }
    }

    #[test]
    fn test_three_squares_end_to_end() {
        let mut packer = AtlasPacker::new(config(64, 1024, 1));
        for name in ["a", "b", "c"] {
            packer.add(square_fragment(name, 32));
        }
        let report = packer.build();
        assert_eq!(report.fitted, 3);
        assert!(report.failed.is_empty());
        assert!(report.success());
        assert!(report.width.is_power_of_two());
        assert!(report.height.is_power_of_two());
    }

    #[test]
    fn test_first_fragment_anchored_at_origin() {
        let mut packer = AtlasPacker::new(config(64, 64, 1));
        packer.add(square_fragment("a", 32));
        packer.add(square_fragment("b", 16));
        let report = packer.build();
        assert_eq!(report.fitted, 2);
        // descending block count: the 32px square goes first, at (0, 0)
        assert_eq!(packer.fragments()[0].name, "a");
        assert_eq!(packer.fragments()[0].location, Some((0, 0)));
    }

    #[test]
    fn test_no_two_fragments_share_pixels() {
        let mut packer = AtlasPacker::new(config(64, 256, 1000));
        for (i, size) in [32u32, 32, 16, 16, 16, 8, 8].iter().enumerate() {
            packer.add(square_fragment(&format!("s{i}"), *size));
        }
        let report = packer.build();
        assert_eq!(report.fitted, 7, "failed: {:?}", report.failed);

        // rasterize every placed fragment into a shared counter grid
        let mut counts = Grid::new(report.width as usize, report.height as usize, 0u32);
        for frag in packer.fragments() {
            let (bx, by) = frag.location.unwrap();
            let mut mask = Grid::new(
                frag.image.width() as usize,
                frag.image.height() as usize,
                0u8,
            );
            fill_triangles(&mut mask, &frag.points, &frag.tris);
            for y in 0..mask.height() {
                for x in 0..mask.width() {
                    if mask[(x, y)] != 0 {
                        counts[(bx * 4 + x, by * 4 + y)] += 1;
                    }
                }
            }
        }
        for y in 0..counts.height() {
            for x in 0..counts.width() {
                assert!(counts[(x, y)] <= 1, "pixel ({x}, {y}) claimed twice");
            }
        }
    }

    #[test]
    fn test_enlarge_doubles_smaller_dimension() {
        let mut packer = AtlasPacker::new(config(32, 128, 1));
        packer.add(square_fragment("a", 32));
        packer.add(square_fragment("b", 32));
        let report = packer.build();
        assert_eq!(report.fitted, 2);
        // equal dims: width doubles first
        assert_eq!((report.width, report.height), (64, 32));
        // already-placed fragment kept its block coordinates
        assert_eq!(packer.fragments()[0].location, Some((0, 0)));
    }

    #[test]
    fn test_oversized_fragment_reported_not_fatal() {
        let mut packer = AtlasPacker::new(config(32, 64, 1));
        packer.add(square_fragment("huge", 128));
        packer.add(square_fragment("ok", 32));
        let report = packer.build();
        assert_eq!(report.fitted, 1);
        assert_eq!(report.failed, vec!["huge".to_string()]);
        assert!(!report.success());
    }

    #[test]
    fn test_exports_cover_all_placed_geometry() {
        let mut packer = AtlasPacker::new(config(64, 256, 2));
        for name in ["a", "b", "c"] {
            packer.add(square_fragment(name, 32));
        }
        let report = packer.build();
        assert_eq!(report.fitted, 3);

        let vertices = packer.export_vertices();
        let point_total: usize = packer.fragments().iter().map(|f| f.points.len()).sum();
        assert_eq!(vertices.len(), point_total);
        for [u, v] in &vertices {
            assert!((0.0..=1.0).contains(u) && (0.0..=1.0).contains(v));
        }

        let tri_total: usize = packer.fragments().iter().map(|f| f.tris.len()).sum();
        for keep_restart in [true, false] {
            let indices = packer.export_indices(keep_restart);
            if !keep_restart {
                assert!(!indices.contains(&RESTART));
            }
            let tris = strip_to_tris(&indices);
            assert_eq!(tris.len(), tri_total);
            for t in &tris {
                assert!((t.a as usize) < point_total);
                assert!((t.b as usize) < point_total);
                assert!((t.c as usize) < point_total);
            }
        }
    }

    #[test]
    fn test_stale_distance_field_never_collides() {
        // a huge refresh interval leaves the field stale for the whole
        // build; placement must still be collision-free at the block level
        let mut packer = AtlasPacker::new(config(64, 128, usize::MAX));
        for i in 0..6 {
            packer.add(square_fragment(&format!("s{i}"), 16));
        }
        let report = packer.build();
        assert_eq!(report.fitted, 6);
        let mut block_owners = std::collections::HashMap::new();
        for frag in packer.fragments() {
            let (bx, by) = frag.location.unwrap();
            for fy in 0..frag.block_height() {
                for fx in 0..frag.block_width() {
                    if frag.usage[(fx, fy)] != 0 {
                        let prev = block_owners.insert((bx + fx, by + fy), frag.name.clone());
                        assert!(prev.is_none(), "block ({}, {}) double-booked", bx + fx, by + fy);
                    }
                }
            }
        }
    }
}
