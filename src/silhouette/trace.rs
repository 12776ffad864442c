use crate::error::TesseraError;
use crate::grid::Grid;
use crate::polygon::{Point, Polygon};

use super::flags::PixelFlags;
use super::label::MetaPixel;

/// Step preference: axis-aligned neighbors before diagonal ones. The order
/// matters for correct polygons around corners.
const STEPS: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Walk the boundary of one connected component starting at `start`,
/// collecting a closed-loop polygon. Each step moves to the first unvisited
/// boundary pixel of the same component; the walk ends when no unvisited
/// neighbor remains, which must be back next to the start (Chebyshev
/// distance 1) for the loop to be valid.
pub fn trace_component(
    meta: &Grid<MetaPixel>,
    visited: &mut Grid<u8>,
    start: (usize, usize),
    component: u32,
) -> Result<Polygon, TesseraError> {
    let w = meta.width() as i64;
    let h = meta.height() as i64;
    let origin = Point::new(start.0 as i32, start.1 as i32);

    let mut points = vec![origin];
    visited[start] = 1;

    let (mut x, mut y) = (start.0 as i64, start.1 as i64);
    'walk: loop {
        for (ox, oy) in STEPS {
            let nx = x + ox;
            let ny = y + oy;
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                continue;
            }
            let m = meta[(nx as usize, ny as usize)];
            if m.flags.intersects(PixelFlags::BOUNDARY)
                && m.component == component
                && visited[(nx as usize, ny as usize)] == 0
            {
                visited[(nx as usize, ny as usize)] = 1;
                points.push(Point::new(nx as i32, ny as i32));
                x = nx;
                y = ny;
                continue 'walk;
            }
        }
        break;
    }

    // no neighbor taken: the walk must have come back around to the start
    let last = points[points.len() - 1];
    if last != origin && last.chebyshev(origin) <= 1 {
        Ok(Polygon::new(points))
    } else {
        Err(TesseraError::OpenBoundary { component })
    }
}
