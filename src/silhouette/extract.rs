use image::RgbaImage;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::TesseraError;
use crate::grid::Grid;
use crate::polygon::Polygon;
use crate::raster::flood_fill;

use super::flags::PixelFlags;
use super::label::{MetaPixel, label_components};
use super::trace::trace_component;

const NEIGHBORS8: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// One parameter tuple for the extraction sweep: how far to dilate the
/// silhouette, how wide the band polygon edges may move in, and an optional
/// cap on simplified segment length (0 = unlimited).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassParams {
    pub dilation: u32,
    pub band: u32,
    #[serde(default)]
    pub max_segment: u32,
}

/// The sweep tries tighter fits first and falls back to increasingly coarse
/// dilations; the last few entries trade fidelity for very few vertices.
pub const DEFAULT_PASSES: [PassParams; 15] = [
    PassParams { dilation: 1, band: 3, max_segment: 0 },
    PassParams { dilation: 2, band: 5, max_segment: 0 },
    PassParams { dilation: 3, band: 4, max_segment: 0 },
    PassParams { dilation: 4, band: 6, max_segment: 0 },
    PassParams { dilation: 5, band: 6, max_segment: 0 },
    PassParams { dilation: 6, band: 6, max_segment: 0 },
    PassParams { dilation: 7, band: 7, max_segment: 0 },
    PassParams { dilation: 8, band: 8, max_segment: 0 },
    PassParams { dilation: 9, band: 9, max_segment: 0 },
    PassParams { dilation: 10, band: 10, max_segment: 0 },
    PassParams { dilation: 3, band: 12, max_segment: 0 },
    PassParams { dilation: 4, band: 25, max_segment: 0 },
    PassParams { dilation: 8, band: 40, max_segment: 0 },
    PassParams { dilation: 12, band: 20, max_segment: 0 },
    PassParams { dilation: 16, band: 20, max_segment: 0 },
];

/// Winning result of the parameter sweep.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub polygons: Vec<Polygon>,
    pub score: u64,
    pub params: PassParams,
}

/// Seed the flag grid with the opaque pixels of the sprite.
fn solid_seed(image: &RgbaImage) -> Grid<PixelFlags> {
    let mut flags = Grid::new(
        image.width() as usize,
        image.height() as usize,
        PixelFlags::EMPTY,
    );
    for (x, y, p) in image.enumerate_pixels() {
        if p[3] != 0 {
            flags[(x as usize, y as usize)] = PixelFlags::SOLID;
        }
    }
    flags
}

/// Grow the solid region by `rounds` 8-neighborhood iterations. Dilation
/// checks the same flag it sets, so each round reads from the previous
/// round's buffer (ping-pong) instead of its own output.
fn dilate_solid(flags: &mut Grid<PixelFlags>, rounds: u32) {
    let region = PixelFlags::SOLID | PixelFlags::DILATED;
    let mut back = flags.clone();
    for _ in 0..rounds {
        std::mem::swap(flags, &mut back);
        for y in 0..back.height() {
            for x in 0..back.width() {
                let here = back[(x, y)];
                let mut out = here;
                if !here.intersects(region) {
                    for (ox, oy) in NEIGHBORS8 {
                        let n = back.get_or(x as i64 + ox, y as i64 + oy, PixelFlags::EMPTY);
                        if n.intersects(region) {
                            out |= PixelFlags::DILATED;
                            break;
                        }
                    }
                }
                flags[(x, y)] = out;
            }
        }
    }
}

/// Close interior holes: every non-solid region reachable from the image
/// border is marked `NO_HOLE`; whatever empty space remains is enclosed by
/// the silhouette and gets folded into `DILATED`, since the tracer only
/// handles simply-connected regions.
fn close_holes(flags: &mut Grid<PixelFlags>) {
    let w = flags.width();
    let h = flags.height();
    let solid = PixelFlags::SOLID | PixelFlags::DILATED;

    let mut border: Vec<(usize, usize)> = Vec::with_capacity(2 * (w + h));
    for x in 0..w {
        border.push((x, 0));
        border.push((x, h - 1));
    }
    for y in 0..h {
        border.push((0, y));
        border.push((w - 1, y));
    }
    for (sx, sy) in border {
        if flags[(sx, sy)].intersects(solid | PixelFlags::NO_HOLE) {
            continue;
        }
        flood_fill(sx, sy, |px, py| {
            if px < 0 || py < 0 || px >= w as i64 || py >= h as i64 {
                return false;
            }
            let cell = &mut flags[(px as usize, py as usize)];
            if cell.intersects(solid | PixelFlags::NO_HOLE) {
                return false;
            }
            cell.insert(PixelFlags::NO_HOLE);
            true
        });
    }

    for cell in flags.cells_mut() {
        if !cell.intersects(solid | PixelFlags::NO_HOLE) {
            cell.insert(PixelFlags::DILATED);
        }
    }
}

/// Flag every solid/dilated pixel that touches the outside through a
/// 4-neighbor (the image frame counts as outside). Safe in place: the
/// predicate never looks at the `BOUNDARY` bit it sets.
fn mark_boundary(flags: &mut Grid<PixelFlags>) {
    let region = PixelFlags::SOLID | PixelFlags::DILATED;
    for y in 0..flags.height() {
        for x in 0..flags.width() {
            if !flags[(x, y)].intersects(region) {
                continue;
            }
            for (ox, oy) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
                let n = flags.get_or(x as i64 + ox, y as i64 + oy, PixelFlags::EMPTY);
                if !n.intersects(region) {
                    flags[(x, y)].insert(PixelFlags::BOUNDARY);
                    break;
                }
            }
        }
    }
}

/// Grow the band polygon edges may pass through: dilated pixels always
/// belong to it, solid pixels never do (no polygon may cut through actually
/// opaque area), and everything else joins when an 8-neighbor is already in.
/// All border rows and columns are forced in afterwards so a trace may
/// always exit through the frame edge.
fn grow_band(flags: &mut Grid<PixelFlags>, rounds: u32) {
    let seed = PixelFlags::BAND | PixelFlags::SOLID | PixelFlags::DILATED;
    let mut back = flags.clone();
    for _ in 0..rounds {
        std::mem::swap(flags, &mut back);
        for y in 0..back.height() {
            for x in 0..back.width() {
                let here = back[(x, y)];
                let out = if here.intersects(PixelFlags::SOLID) {
                    here
                } else if here.intersects(PixelFlags::DILATED) {
                    here | PixelFlags::BAND
                } else {
                    let mut grown = here;
                    for (ox, oy) in NEIGHBORS8 {
                        let n = back.get_or(x as i64 + ox, y as i64 + oy, PixelFlags::EMPTY);
                        if n.intersects(seed) {
                            grown |= PixelFlags::BAND;
                            break;
                        }
                    }
                    grown
                };
                flags[(x, y)] = out;
            }
        }
    }

    let xmax = flags.width() - 1;
    let ymax = flags.height() - 1;
    for x in 0..flags.width() {
        flags[(x, 0)].insert(PixelFlags::BAND);
        flags[(x, ymax)].insert(PixelFlags::BAND);
    }
    for y in 0..flags.height() {
        flags[(0, y)].insert(PixelFlags::BAND);
        flags[(xmax, y)].insert(PixelFlags::BAND);
    }
}

/// Run the per-pixel passes of one parameter tuple and return the finished
/// flag grid.
pub fn silhouette_flags(image: &RgbaImage, params: PassParams) -> Grid<PixelFlags> {
    let mut flags = solid_seed(image);
    if flags.is_empty() {
        return flags;
    }
    dilate_solid(&mut flags, params.dilation);
    close_holes(&mut flags);
    mark_boundary(&mut flags);
    grow_band(&mut flags, params.band);
    flags
}

/// Trace one closed polygon per connected component, in scan order. The
/// line-by-line scan always reaches a component's outer boundary first, and
/// hole closing guarantees there is no inner one.
pub fn trace_polygons(meta: &Grid<MetaPixel>, components: u32) -> Result<Vec<Polygon>, TesseraError> {
    let mut used = Grid::new(meta.width(), meta.height(), 0u8);
    let mut done = vec![false; components as usize + 1];
    let mut polys = Vec::new();
    for y in 0..meta.height() {
        for x in 0..meta.width() {
            let m = meta[(x, y)];
            if !m.flags.intersects(PixelFlags::BOUNDARY) || used[(x, y)] != 0 {
                continue;
            }
            let cc = m.component as usize;
            if cc == 0 || done[cc] {
                continue;
            }
            done[cc] = true;
            polys.push(trace_component(meta, &mut used, (x, y), m.component)?);
        }
    }
    Ok(polys)
}

/// Simplify every traced polygon with both algorithms and keep whichever
/// yields fewer points. A polygon collapsing below a triangle rejects the
/// whole tuple. Returns the simplified set and its summed score.
fn simplify_polygons(
    polys: &[Polygon],
    flags: &Grid<PixelFlags>,
    params: PassParams,
) -> Result<(Vec<Polygon>, u64), TesseraError> {
    let blocked =
        |x: i32, y: i32| !flags.get_or(i64::from(x), i64::from(y), PixelFlags::EMPTY).intersects(PixelFlags::BAND);
    let epsilon = f64::from(params.dilation.saturating_sub(1));

    let mut out = Vec::with_capacity(polys.len());
    let mut score = 0u64;
    for poly in polys {
        let greedy = poly.simplify(&blocked, params.max_segment);
        let dp = poly.simplify_dp(&blocked, epsilon);
        let better = if greedy.len() < 3 {
            dp
        } else if dp.len() < 3 || greedy.len() <= dp.len() {
            greedy
        } else {
            dp
        };
        if better.len() < 3 {
            return Err(TesseraError::DegeneratePolygon {
                points: better.len(),
            });
        }
        score += better.score();
        out.push(better);
    }
    Ok((out, score))
}

fn run_pass(image: &RgbaImage, params: PassParams) -> Result<(Vec<Polygon>, u64), TesseraError> {
    let flags = silhouette_flags(image, params);
    let (meta, components) = label_components(&flags);
    let polys = trace_polygons(&meta, components)?;
    simplify_polygons(&polys, &flags, params)
}

/// Sweep the parameter tuples and keep the lowest-scoring successful pass.
/// A tuple failing (open boundary, collapsed polygon) is logged and skipped;
/// only a sweep with no survivor at all is an error.
pub fn extract_polygons(
    image: &RgbaImage,
    passes: &[PassParams],
) -> Result<Extraction, TesseraError> {
    if !image.pixels().any(|p| p[3] != 0) {
        return Err(TesseraError::EmptySilhouette);
    }

    let mut best: Option<Extraction> = None;
    for (i, &params) in passes.iter().enumerate() {
        match run_pass(image, params) {
            Ok((polygons, score)) => {
                debug!(
                    "pass #{i} (dilate={}, band={}, segment={}): {} polygon(s), score {score}",
                    params.dilation,
                    params.band,
                    params.max_segment,
                    polygons.len(),
                );
                if best.as_ref().is_none_or(|b| score < b.score) {
                    best = Some(Extraction {
                        polygons,
                        score,
                        params,
                    });
                }
            }
            Err(err) => {
                debug!(
                    "pass #{i} (dilate={}, band={}, segment={}) rejected: {err}",
                    params.dilation, params.band, params.max_segment,
                );
            }
        }
    }

    best.ok_or(TesseraError::ExtractionFailed)
}
