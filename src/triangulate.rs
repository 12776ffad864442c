use crate::error::TesseraError;
use crate::polygon::{Point, Polygon};

/// Triangle as three indices into a polygon's original point array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tri {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Tri {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    pub fn is_degenerate(&self) -> bool {
        self.a == self.b || self.b == self.c || self.c == self.a
    }
}

fn cross(a: Point, b: Point, c: Point) -> i64 {
    i64::from(b.x - a.x) * i64::from(c.y - a.y) - i64::from(c.x - a.x) * i64::from(b.y - a.y)
}

fn is_ccw(a: Point, b: Point, c: Point) -> bool {
    cross(a, b, c) > 0
}

/// Inclusive point-in-triangle test via edge cross product signs. A
/// degenerate (collinear) triangle contains everything, which blocks
/// zero-area ears from being clipped past another vertex.
fn in_triangle(v: Point, a: Point, b: Point, c: Point) -> bool {
    let d1 = cross(a, b, v);
    let d2 = cross(b, c, v);
    let d3 = cross(c, a, v);
    let has_neg = d1 < 0 || d2 < 0 || d3 < 0;
    let has_pos = d1 > 0 || d2 > 0 || d3 > 0;
    !(has_neg && has_pos)
}

/// Ear-clipping triangulation of a simple (possibly concave) polygon.
///
/// Each round finds a vertex whose interior angle matches the overall
/// winding and whose ear triangle contains no other remaining vertex, emits
/// it with indices into the original point array and removes it. Zero-area
/// or otherwise degenerate input fails explicitly.
pub fn triangulate(poly: &Polygon) -> Result<Vec<Tri>, TesseraError> {
    let n = poly.points.len();
    if n < 3 {
        return Err(TesseraError::DegeneratePolygon { points: n });
    }
    if poly.signed_area2() == 0 {
        return Err(TesseraError::DegeneratePolygon { points: n });
    }

    // overall winding, taken at the leftmost (then topmost) vertex where the
    // interior angle is guaranteed convex
    let mut left = 0usize;
    for (i, p) in poly.points.iter().enumerate() {
        let q = poly.points[left];
        if (p.x, p.y) < (q.x, q.y) {
            left = i;
        }
    }
    let li = left as isize;
    let ccw = is_ccw(poly.point(li - 1), poly.point(li), poly.point(li + 1));

    let mut remaining: Vec<(Point, u32)> = poly
        .points
        .iter()
        .enumerate()
        .map(|(i, &p)| (p, i as u32))
        .collect();

    let mut tris = Vec::with_capacity(n - 2);
    while remaining.len() > 2 {
        let m = remaining.len();
        let mut ear = None;

        'candidates: for i in 0..m {
            let p = if i > 0 { i - 1 } else { m - 1 };
            let q = if i + 1 < m { i + 1 } else { 0 };
            if is_ccw(remaining[p].0, remaining[i].0, remaining[q].0) != ccw {
                continue; // reflex (or collinear) corner, cannot be an ear
            }
            for (j, &(v, _)) in remaining.iter().enumerate() {
                if j == p || j == i || j == q {
                    continue;
                }
                if in_triangle(v, remaining[p].0, remaining[i].0, remaining[q].0) {
                    continue 'candidates;
                }
            }
            ear = Some((p, i, q));
            break;
        }

        match ear {
            Some((p, i, q)) => {
                tris.push(Tri::new(remaining[p].1, remaining[i].1, remaining[q].1));
                remaining.remove(i);
            }
            None => {
                return Err(TesseraError::Triangulation {
                    remaining: remaining.len(),
                });
            }
        }
    }

    Ok(tris)
}
