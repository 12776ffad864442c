use image::RgbaImage;

use crate::grid::Grid;
use crate::polygon::Point;
use crate::triangulate::Tri;

/// Iterative 4-connected flood fill with an explicit work stack.
///
/// `visit` is called with signed coordinates and owns bounds checking and
/// marking; returning `true` claims the pixel and queues its 4-neighbors.
/// Returns the number of claimed pixels.
pub fn flood_fill<F>(x: usize, y: usize, mut visit: F) -> usize
where
    F: FnMut(i64, i64) -> bool,
{
    const OFFSETS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

    let mut todo: Vec<(i64, i64)> = vec![(x as i64, y as i64)];
    let mut claimed = 0;
    while let Some((px, py)) = todo.pop() {
        if visit(px, py) {
            claimed += 1;
            for (ox, oy) in OFFSETS {
                todo.push((px + ox, py + oy));
            }
        }
    }
    claimed
}

/// Bresenham line walk from `p0` to `p1` inclusive. `f` is called per pixel;
/// returning `true` stops the walk and reports that pixel as the collision.
pub fn line_cast<F>(p0: Point, p1: Point, mut f: F) -> Option<Point>
where
    F: FnMut(i32, i32) -> bool,
{
    let mut x0 = p0.x;
    let mut y0 = p0.y;
    let x1 = p1.x;
    let y1 = p1.y;
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        if f(x0, y0) {
            return Some(Point::new(x0, y0));
        }
        if x0 == x1 && y0 == y1 {
            return None;
        }
        let err2 = err * 2;
        if err2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if err2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Pixels of the three triangle edges, sorted by (y, x) so each scanline's
/// extent is delimited by its first and last entry.
fn edge_pixels(work: &mut Vec<(i32, i32)>, a: Point, b: Point, c: Point) {
    work.clear();
    for (p, q) in [(a, b), (b, c), (c, a)] {
        line_cast(p, q, |x, y| {
            work.push((x, y));
            false
        });
    }
    work.sort_unstable_by(|l, r| (l.1, l.0).cmp(&(r.1, r.0)));
}

/// Scanline walk over the sorted edge pixels of one triangle, calling
/// `span(y, x0, x1)` once per covered row.
fn triangle_spans<F>(work: &[(i32, i32)], mut span: F)
where
    F: FnMut(i32, i32, i32),
{
    let n = work.len();
    let mut i = 0;
    while i < n {
        let (start_x, y) = (work[i].0, work[i].1);
        let mut end_x = start_x;
        i += 1;
        while i < n && work[i].1 == y {
            end_x = work[i].0;
            i += 1;
        }
        span(y, start_x, end_x);
    }
}

/// Rasterize triangles into a binary mask (cells set to 1). Coordinates
/// outside the mask are clipped.
pub fn fill_triangles(mask: &mut Grid<u8>, points: &[Point], tris: &[Tri]) {
    let w = mask.width() as i32;
    let h = mask.height() as i32;
    let mut work = Vec::with_capacity(128);
    for t in tris {
        edge_pixels(
            &mut work,
            points[t.a as usize],
            points[t.b as usize],
            points[t.c as usize],
        );
        let work_ref = &work;
        triangle_spans(work_ref, |y, x0, x1| {
            if y < 0 || y >= h {
                return;
            }
            let x0 = x0.max(0);
            let x1 = x1.min(w - 1);
            if x0 > x1 {
                return;
            }
            let row = mask.row_mut(y as usize);
            for cell in &mut row[x0 as usize..=x1 as usize] {
                *cell = 1;
            }
        });
    }
}

/// Alpha-tested triangle blit: copy `src` pixels covered by the triangles
/// into `dst` at `offset`, but only where the source alpha is nonzero.
pub fn blit_triangles(
    dst: &mut RgbaImage,
    offset: (i64, i64),
    points: &[Point],
    tris: &[Tri],
    src: &RgbaImage,
) {
    let (sw, sh) = (src.width() as i64, src.height() as i64);
    let (dw, dh) = (dst.width() as i64, dst.height() as i64);
    let mut work = Vec::with_capacity(128);
    for t in tris {
        edge_pixels(
            &mut work,
            points[t.a as usize],
            points[t.b as usize],
            points[t.c as usize],
        );
        let work_ref = &work;
        triangle_spans(work_ref, |y, x0, x1| {
            let sy = i64::from(y);
            if sy < 0 || sy >= sh {
                return;
            }
            let dy = sy + offset.1;
            if dy < 0 || dy >= dh {
                return;
            }
            for sx in i64::from(x0).max(0)..=i64::from(x1).min(sw - 1) {
                let dx = sx + offset.0;
                if dx < 0 || dx >= dw {
                    continue;
                }
                let p = src.get_pixel(sx as u32, sy as u32);
                if p[3] != 0 {
                    dst.put_pixel(dx as u32, dy as u32, *p);
                }
            }
        });
    }
}

/// Downsample a binary pixel mask into 4x4-block occupancy counts (number of
/// set pixels per block, at most 16). Dimensions round up so partial edge
/// blocks are kept. Returns the count grid and the number of nonempty blocks.
pub fn downsample4(mask: &Grid<u8>) -> (Grid<u8>, usize) {
    let bw = mask.width().div_ceil(4);
    let bh = mask.height().div_ceil(4);
    let mut out = Grid::new(bw, bh, 0u8);
    let mut used = 0;
    for by in 0..bh {
        for bx in 0..bw {
            let mut count = 0u8;
            for y in by * 4..(by * 4 + 4).min(mask.height()) {
                for x in bx * 4..(bx * 4 + 4).min(mask.width()) {
                    count += u8::from(mask[(x, y)] != 0);
                }
            }
            out[(bx, by)] = count;
            used += usize::from(count != 0);
        }
    }
    (out, used)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_cast_straight() {
        let mut visited = Vec::new();
        let hit = line_cast(Point::new(2, 1), Point::new(6, 1), |x, y| {
            visited.push((x, y));
            false
        });
        assert!(hit.is_none());
        assert_eq!(visited, vec![(2, 1), (3, 1), (4, 1), (5, 1), (6, 1)]);
    }

    #[test]
    fn test_line_cast_diagonal_visits_endpoints() {
        let mut visited = Vec::new();
        line_cast(Point::new(0, 0), Point::new(3, 3), |x, y| {
            visited.push((x, y));
            false
        });
        assert_eq!(visited, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_line_cast_reports_collision() {
        let hit = line_cast(Point::new(0, 0), Point::new(10, 0), |x, _| x == 4);
        assert_eq!(hit, Some(Point::new(4, 0)));
    }

    #[test]
    fn test_line_cast_single_pixel() {
        let mut count = 0;
        line_cast(Point::new(5, 5), Point::new(5, 5), |_, _| {
            count += 1;
            false
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn test_flood_fill_bounded_region() {
        let mut grid = Grid::new(5, 5, 0u8);
        // wall splitting the grid at x == 2
        for y in 0..5 {
            grid[(2, y)] = 9;
        }
        let filled = flood_fill(0, 0, |x, y| {
            if x < 0 || y < 0 || x >= 5 || y >= 5 {
                return false;
            }
            let cell = &mut grid[(x as usize, y as usize)];
            if *cell != 0 {
                return false;
            }
            *cell = 1;
            true
        });
        assert_eq!(filled, 10); // 2 columns x 5 rows left of the wall
        assert_eq!(grid[(3, 3)], 0);
        assert_eq!(grid[(1, 4)], 1);
    }

    #[test]
    fn test_fill_triangles_axis_aligned() {
        let mut mask = Grid::new(8, 8, 0u8);
        let points = [
            Point::new(0, 0),
            Point::new(7, 0),
            Point::new(7, 7),
            Point::new(0, 7),
        ];
        let tris = [Tri::new(0, 1, 2), Tri::new(0, 2, 3)];
        fill_triangles(&mut mask, &points, &tris);
        // the full square is covered
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(mask[(x, y)], 1, "pixel ({}, {}) not covered", x, y);
            }
        }
    }

    #[test]
    fn test_fill_triangles_leaves_outside_untouched() {
        let mut mask = Grid::new(10, 10, 0u8);
        let points = [Point::new(1, 1), Point::new(4, 1), Point::new(1, 4)];
        let tris = [Tri::new(0, 1, 2)];
        fill_triangles(&mut mask, &points, &tris);
        assert_eq!(mask[(1, 1)], 1);
        assert_eq!(mask[(9, 9)], 0);
        assert_eq!(mask[(4, 4)], 0);
    }

    #[test]
    fn test_blit_respects_alpha() {
        let mut src = RgbaImage::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                let a = if x < 2 { 255 } else { 0 };
                src.put_pixel(x, y, image::Rgba([10, 20, 30, a]));
            }
        }
        let mut dst = RgbaImage::new(8, 8);
        let points = [
            Point::new(0, 0),
            Point::new(3, 0),
            Point::new(3, 3),
            Point::new(0, 3),
        ];
        let tris = [Tri::new(0, 1, 2), Tri::new(0, 2, 3)];
        blit_triangles(&mut dst, (2, 2), &points, &tris, &src);

        assert_eq!(dst.get_pixel(2, 2)[3], 255); // opaque source copied
        assert_eq!(dst.get_pixel(5, 2)[3], 0); // transparent source skipped
    }

    #[test]
    fn test_downsample4_counts() {
        let mut mask = Grid::new(8, 8, 0u8);
        // fill one full block and one pixel of another
        for y in 0..4 {
            for x in 0..4 {
                mask[(x, y)] = 1;
            }
        }
        mask[(5, 5)] = 1;
        let (blocks, used) = downsample4(&mask);
        assert_eq!(blocks.width(), 2);
        assert_eq!(blocks.height(), 2);
        assert_eq!(blocks[(0, 0)], 16);
        assert_eq!(blocks[(1, 1)], 1);
        assert_eq!(blocks[(1, 0)], 0);
        assert_eq!(used, 2);
    }

    #[test]
    fn test_downsample4_partial_edge_blocks() {
        let mut mask = Grid::new(6, 5, 0u8);
        mask[(5, 4)] = 1;
        let (blocks, used) = downsample4(&mask);
        assert_eq!(blocks.width(), 2);
        assert_eq!(blocks.height(), 2);
        assert_eq!(blocks[(1, 1)], 1);
        assert_eq!(used, 1);
    }
}
