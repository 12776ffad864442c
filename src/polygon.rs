use crate::raster::line_cast;

/// Per-vertex cost against covered area when scoring a simplified polygon.
pub const VERTEX_PENALTY: u64 = 150;

/// Integer grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn chebyshev(self, other: Point) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    fn dist_sq(self, other: Point) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }
}

/// Closed-loop polygon over integer grid points.
///
/// As produced by the boundary tracer, consecutive points (wrapping) are
/// 8-connected. Simplification replaces the point list wholesale.
#[derive(Debug, Clone, Default)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Closed-loop access: out-of-range indices wrap around.
    pub fn point(&self, i: isize) -> Point {
        let n = self.points.len() as isize;
        let mut i = i % n;
        if i < 0 {
            i += n;
        }
        self.points[i as usize]
    }

    /// Twice the signed shoelace area. Positive for counter-clockwise order
    /// in a y-down coordinate system.
    pub fn signed_area2(&self) -> i64 {
        let n = self.points.len();
        let mut sum = 0i64;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            sum += i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y);
        }
        sum
    }

    /// Number of lattice points on the polygon edges (vertices included).
    fn boundary_points(&self) -> u64 {
        let n = self.points.len();
        let mut sum = 0u64;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let dx = (i64::from(b.x) - i64::from(a.x)).unsigned_abs();
            let dy = (i64::from(b.y) - i64::from(a.y)).unsigned_abs();
            sum += gcd(dx, dy).max(1);
        }
        sum
    }

    /// Number of pixels covered by the polygon, counting every pixel whose
    /// center lies inside or on an edge. By Pick's theorem this is the
    /// shoelace area plus half the boundary lattice points plus one, which
    /// makes the traced outline of a solid w*h rectangle come out as exactly
    /// w*h pixels.
    pub fn pixel_area(&self) -> u64 {
        if self.points.len() < 3 {
            return self.points.len() as u64;
        }
        let area2 = self.signed_area2().unsigned_abs();
        let b = self.boundary_points();
        area2 / 2 + b / 2 + 1
    }

    /// Simplification score: fewer vertices and a smaller footprint are both
    /// better, weighted by [`VERTEX_PENALTY`]. Lower is better.
    pub fn score(&self) -> u64 {
        self.points.len() as u64 * VERTEX_PENALTY + self.pixel_area()
    }

    /// Greedy chain simplification.
    ///
    /// Walks the loop from an anchor and extends the current segment as long
    /// as anchor->next crosses no blocked pixel and, when `max_segment` is
    /// nonzero, stays within that length. Otherwise the anchor is committed
    /// and the walk restarts from the last valid point. Amortized O(n).
    pub fn simplify<F>(&self, blocked: &F, max_segment: u32) -> Polygon
    where
        F: Fn(i32, i32) -> bool,
    {
        if self.points.len() < 3 {
            return self.clone();
        }

        let max_sq = i64::from(max_segment) * i64::from(max_segment);
        let segment_ok = |a: Point, b: Point| -> bool {
            if max_segment > 0 && a.dist_sq(b) > max_sq {
                return false;
            }
            line_cast(a, b, |x, y| blocked(x, y)).is_none()
        };

        let mut reduced: Vec<Point> = Vec::new();
        let first = self.point(0);
        let mut i: isize = 1;
        let mut anchor = first;
        let mut prev = first;

        loop {
            let next = self.point(i);
            if next == first {
                // if the first committed point is visible from here, it is unnecessary
                if reduced.len() > 1 && segment_ok(anchor, reduced[1]) {
                    reduced[0] = anchor;
                } else {
                    reduced.push(anchor);
                }
                break;
            }
            if anchor != prev && !segment_ok(anchor, next) {
                reduced.push(anchor);
                anchor = prev; // continue from the last point that was still visible
                continue;
            }
            prev = next;
            i += 1;
        }

        Polygon::new(reduced)
    }

    /// Douglas-Peucker style simplification under the same collision
    /// constraint.
    ///
    /// The loop is split at its two extremal vertices; within each arc the
    /// point of maximum perpendicular chord deviation is kept when it
    /// exceeds `epsilon` or when the chord would cross a blocked pixel.
    /// Vertices whose chord-straddling of `blocked` differs from their
    /// predecessor's are pinned up front, preserving pixel-exact fidelity at
    /// real silhouette inflections.
    pub fn simplify_dp<F>(&self, blocked: &F, epsilon: f64) -> Polygon
    where
        F: Fn(i32, i32) -> bool,
    {
        let n = self.points.len();
        if n < 3 {
            return self.clone();
        }

        let chord_blocked = |a: Point, b: Point| line_cast(a, b, |x, y| blocked(x, y)).is_some();

        let mut keep = vec![false; n];

        // pin transitions: a vertex whose removal-chord collides while its
        // predecessor's does not (or vice versa) sits on a real inflection
        let mut straddle = vec![false; n];
        for i in 0..n {
            let i = i as isize;
            straddle[i as usize] = chord_blocked(self.point(i - 1), self.point(i + 1));
        }
        for i in 0..n {
            if straddle[i] != straddle[(i + n - 1) % n] {
                keep[i] = true;
            }
        }

        // anchor the recursion at the two lexicographic extremes
        let mut lo = 0;
        let mut hi = 0;
        for (i, p) in self.points.iter().enumerate() {
            let q = self.points[lo];
            if (p.x, p.y) < (q.x, q.y) {
                lo = i;
            }
            let q = self.points[hi];
            if (p.x, p.y) > (q.x, q.y) {
                hi = i;
            }
        }
        keep[lo] = true;
        keep[hi] = true;

        // refine every arc between consecutive kept vertices
        let anchors: Vec<usize> = (0..n).filter(|&i| keep[i]).collect();
        for w in 0..anchors.len() {
            let a = anchors[w];
            let b = anchors[(w + 1) % anchors.len()];
            let span = if b > a { b - a } else { b + n - a };
            self.dp_arc(a, span, epsilon, &chord_blocked, &mut keep);
        }

        let mut points: Vec<Point> = (0..n).filter(|&i| keep[i]).map(|i| self.points[i]).collect();

        // don't let an overly aggressive epsilon collapse the loop below a
        // triangle when more points are available
        if points.len() < 3 && n >= 3 {
            for i in 0..n {
                if !keep[i] {
                    keep[i] = true;
                    points = (0..n).filter(|&j| keep[j]).map(|j| self.points[j]).collect();
                    if points.len() >= 3 {
                        break;
                    }
                }
            }
        }

        Polygon::new(points)
    }

    /// Recursive arc refinement for [`Polygon::simplify_dp`]. `start` and
    /// `start + span` (mod n) delimit the chord; interior points are kept
    /// only where deviation or collision demands it.
    fn dp_arc<C>(&self, start: usize, span: usize, epsilon: f64, chord_blocked: &C, keep: &mut [bool])
    where
        C: Fn(Point, Point) -> bool,
    {
        if span < 2 {
            return;
        }
        let n = self.points.len();
        let a = self.points[start];
        let b = self.points[(start + span) % n];

        let mut max_dev = -1.0f64;
        let mut max_off = 1;
        for off in 1..span {
            let p = self.points[(start + off) % n];
            let dev = perpendicular_distance(p, a, b);
            if dev > max_dev {
                max_dev = dev;
                max_off = off;
            }
        }

        if max_dev > epsilon || chord_blocked(a, b) {
            keep[(start + max_off) % n] = true;
            self.dp_arc(start, max_off, epsilon, chord_blocked, keep);
            self.dp_arc((start + max_off) % n, span - max_off, epsilon, chord_blocked, keep);
        }
    }
}

/// Perpendicular distance from `p` to the chord `a`->`b`. Falls back to the
/// point distance when the chord is degenerate.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let abx = f64::from(b.x - a.x);
    let aby = f64::from(b.y - a.y);
    let len = (abx * abx + aby * aby).sqrt();
    if len == 0.0 {
        let dx = f64::from(p.x - a.x);
        let dy = f64::from(p.y - a.y);
        return (dx * dx + dy * dy).sqrt();
    }
    let cross = abx * f64::from(p.y - a.y) - aby * f64::from(p.x - a.x);
    cross.abs() / len
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_loop(w: i32, h: i32) -> Polygon {
        // pixel-perimeter loop of a w*h rectangle at origin, 8-connected
        let mut pts = Vec::new();
        for x in 0..w {
            pts.push(Point::new(x, 0));
        }
        for y in 1..h {
            pts.push(Point::new(w - 1, y));
        }
        for x in (0..w - 1).rev() {
            pts.push(Point::new(x, h - 1));
        }
        for y in (1..h - 1).rev() {
            pts.push(Point::new(0, y));
        }
        Polygon::new(pts)
    }

    #[test]
    fn test_pixel_area_rectangle() {
        // the traced outline of a solid 7x4 block covers exactly 28 pixels
        assert_eq!(rect_loop(7, 4).pixel_area(), 28);
        assert_eq!(rect_loop(3, 3).pixel_area(), 9);
    }

    #[test]
    fn test_pixel_area_corner_triangle() {
        // right triangle (0,0) (4,0) (0,4): area2 = 16, boundary = 12
        let p = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(0, 4),
        ]);
        assert_eq!(p.signed_area2().unsigned_abs(), 16);
        // Pick's theorem: 16/2 + 12/2 + 1
        assert_eq!(p.pixel_area(), 15);
    }

    #[test]
    fn test_point_wrapping() {
        let p = rect_loop(4, 4);
        let n = p.len() as isize;
        assert_eq!(p.point(-1), p.point(n - 1));
        assert_eq!(p.point(n), p.point(0));
    }

    #[test]
    fn test_simplify_unconstrained_collapses() {
        // with no blocked pixels the greedy chain folds the whole loop into
        // a single point; callers reject anything below 3 points
        let p = rect_loop(10, 6);
        let blocked = |_x: i32, _y: i32| false;
        let s = p.simplify(&blocked, 0);
        assert!(s.len() < 3);
    }

    #[test]
    fn test_simplify_respects_blocked() {
        // block everything except the original perimeter band: every output
        // segment must still pass the probe
        let p = rect_loop(12, 8);
        let on_loop: std::collections::HashSet<(i32, i32)> =
            p.points.iter().map(|q| (q.x, q.y)).collect();
        let blocked = move |x: i32, y: i32| !on_loop.contains(&(x, y));

        for out in [p.simplify(&blocked, 0), p.simplify_dp(&blocked, 2.0)] {
            assert!(out.len() >= 3);
            for i in 0..out.len() as isize {
                let a = out.point(i);
                let b = out.point(i + 1);
                assert!(
                    line_cast(a, b, |x, y| blocked(x, y)).is_none(),
                    "segment {:?}->{:?} crosses a blocked pixel",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_simplify_max_segment() {
        let p = rect_loop(40, 30);
        let blocked = |_x: i32, _y: i32| false;
        let s = p.simplify(&blocked, 10);
        for i in 0..s.len() as isize {
            let a = s.point(i);
            let b = s.point(i + 1);
            assert!(a.dist_sq(b) <= 100, "segment longer than cap");
        }
    }

    #[test]
    fn test_simplify_dp_epsilon_keeps_inflections() {
        // an L-shape: the inner corner deviates far from the outer chord and
        // must survive simplification
        let pts = vec![
            Point::new(0, 0),
            Point::new(20, 0),
            Point::new(20, 10),
            Point::new(10, 10),
            Point::new(10, 20),
            Point::new(0, 20),
        ];
        let p = Polygon::new(pts.clone());
        let blocked = |_x: i32, _y: i32| false;
        let s = p.simplify_dp(&blocked, 1.5);
        assert!(s.points.contains(&Point::new(10, 10)), "inner corner dropped");
        assert!(s.len() >= 3);
    }

    #[test]
    fn test_simplify_never_collapses_below_three() {
        let p = rect_loop(5, 5);
        let blocked = |_x: i32, _y: i32| false;
        assert!(p.simplify_dp(&blocked, 1e6).len() >= 3);
    }
}
