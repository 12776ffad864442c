use std::collections::HashMap;

use crate::error::TesseraError;
use crate::polygon::{Point, Polygon};
use crate::triangulate::{Tri, triangulate};

/// Primitive-restart sentinel index.
pub const RESTART: u32 = u32::MAX;

/// Triangulate every polygon and concatenate the triangle lists, offsetting
/// each polygon's indices by the running vertex count. Returns the flat
/// triangle list and the total vertex count.
pub fn triangulate_all(polys: &[Polygon]) -> Result<(Vec<Tri>, u32), TesseraError> {
    let mut tris = Vec::new();
    let mut vertex_count = 0u32;
    for poly in polys {
        for t in triangulate(poly)? {
            tris.push(Tri::new(
                vertex_count + t.a,
                vertex_count + t.b,
                vertex_count + t.c,
            ));
        }
        vertex_count += poly.len() as u32;
    }
    Ok((tris, vertex_count))
}

/// Flatten polygon point lists in the same order `triangulate_all` assigns
/// indices.
pub fn flatten_points(polys: &[Polygon]) -> Vec<Point> {
    polys.iter().flat_map(|p| p.points.iter().copied()).collect()
}

/// Linearize a triangle list into one triangle strip.
///
/// Greedy growth: each strip segment starts at an unused triangle and keeps
/// appending the third vertex of an unused triangle sharing the strip's
/// trailing edge. Segments are separated by the [`RESTART`] sentinel or, if
/// restart indices are unsupported, stitched with degenerate triangles so
/// one continuous strip renders all disjoint pieces in a single draw call.
pub fn stripify(tris: &[Tri], use_restart: bool) -> Vec<u32> {
    let mut by_edge: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (i, t) in tris.iter().enumerate() {
        for (u, v) in [(t.a, t.b), (t.b, t.c), (t.c, t.a)] {
            by_edge.entry(edge_key(u, v)).or_default().push(i);
        }
    }

    let mut used = vec![false; tris.len()];
    let mut strip: Vec<u32> = Vec::with_capacity(tris.len() * 3 / 2);

    for seed in 0..tris.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let t = tris[seed];

        if strip.is_empty() {
            strip.extend_from_slice(&[t.a, t.b, t.c]);
        } else if use_restart {
            strip.push(RESTART);
            strip.extend_from_slice(&[t.a, t.b, t.c]);
        } else {
            // degenerate join: repeat the boundary vertices (with a parity
            // pad) so the bridge triangles collapse to zero area
            if strip.len() % 2 == 1 {
                strip.push(strip[strip.len() - 1]);
            }
            strip.push(strip[strip.len() - 1]);
            strip.push(t.a);
            strip.extend_from_slice(&[t.a, t.b, t.c]);
        }

        // extend along shared trailing edges
        loop {
            let n = strip.len();
            let (u, v) = (strip[n - 2], strip[n - 1]);
            let Some(candidates) = by_edge.get(&edge_key(u, v)) else {
                break;
            };
            let Some(&next) = candidates.iter().find(|&&i| !used[i]) else {
                break;
            };
            used[next] = true;
            strip.push(third_vertex(tris[next], u, v));
        }
    }

    strip
}

fn edge_key(u: u32, v: u32) -> (u32, u32) {
    (u.min(v), u.max(v))
}

fn third_vertex(t: Tri, u: u32, v: u32) -> u32 {
    if t.a != u && t.a != v {
        t.a
    } else if t.b != u && t.b != v {
        t.b
    } else {
        t.c
    }
}

/// Recover the triangle list from a strip, skipping degenerate bridge
/// triangles and honoring [`RESTART`] sentinels.
pub fn strip_to_tris(indices: &[u32]) -> Vec<Tri> {
    let mut tris = Vec::new();
    let n = indices.len();
    let mut i = 2;
    while i < n {
        if indices[i] == RESTART {
            i += 3; // the strip restarts: the next triangle needs two fresh indices
            continue;
        }
        let t = Tri::new(indices[i - 2], indices[i - 1], indices[i]);
        if !t.is_degenerate() {
            tris.push(t);
        }
        i += 1;
    }
    tris
}

/// Rewrite a strip that uses [`RESTART`] sentinels into one that stitches
/// segments with degenerate triangles instead.
pub fn restarts_to_degenerate(indices: &[u32]) -> Vec<u32> {
    let mut out: Vec<u32> = Vec::with_capacity(indices.len() + 8);
    let mut i = 0;
    while i < indices.len() {
        if indices[i] != RESTART {
            out.push(indices[i]);
            i += 1;
            continue;
        }
        i += 1; // skip the sentinel
        if i >= indices.len() || out.is_empty() {
            continue;
        }
        if out.len() % 2 == 1 {
            out.push(out[out.len() - 1]);
        }
        out.push(out[out.len() - 1]);
        out.push(indices[i]);
    }
    out
}

/// Full index-buffer generation for a set of polygons: triangulate, offset,
/// stripify. `strip_to_tris` over the output recovers exactly the input
/// triangles.
pub fn build_index_buffer(polys: &[Polygon], use_restart: bool) -> Result<Vec<u32>, TesseraError> {
    let (tris, vertex_count) = triangulate_all(polys)?;
    debug_assert!(vertex_count > 2);
    Ok(stripify(&tris, use_restart))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(t: Tri) -> (u32, u32, u32) {
        let mut v = [t.a, t.b, t.c];
        v.sort_unstable();
        (v[0], v[1], v[2])
    }

    fn tri_set(tris: &[Tri]) -> std::collections::HashSet<(u32, u32, u32)> {
        tris.iter().map(|&t| normalize(t)).collect()
    }

    fn square(x0: i32, y0: i32, size: i32) -> Polygon {
        Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x0 + size, y0),
            Point::new(x0 + size, y0 + size),
            Point::new(x0, y0 + size),
        ])
    }

    #[test]
    fn test_stripify_roundtrip_restart() {
        let tris = vec![Tri::new(0, 1, 2), Tri::new(0, 2, 3), Tri::new(4, 5, 6)];
        let strip = stripify(&tris, true);
        assert!(strip.contains(&RESTART));
        assert_eq!(tri_set(&strip_to_tris(&strip)), tri_set(&tris));
    }

    #[test]
    fn test_stripify_roundtrip_degenerate() {
        let tris = vec![Tri::new(0, 1, 2), Tri::new(0, 2, 3), Tri::new(4, 5, 6)];
        let strip = stripify(&tris, false);
        assert!(!strip.contains(&RESTART));
        assert_eq!(tri_set(&strip_to_tris(&strip)), tri_set(&tris));
    }

    #[test]
    fn test_stripify_shares_edges_without_joins() {
        // a fan of triangles all sharing edges packs into one segment:
        // k triangles need exactly k + 2 indices
        let tris = vec![Tri::new(0, 1, 2), Tri::new(1, 2, 3), Tri::new(2, 3, 4)];
        let strip = stripify(&tris, true);
        assert_eq!(strip.len(), 5);
        assert_eq!(tri_set(&strip_to_tris(&strip)), tri_set(&tris));
    }

    #[test]
    fn test_restarts_to_degenerate() {
        let strip = vec![0, 1, 2, RESTART, 4, 5, 6];
        let flat = restarts_to_degenerate(&strip);
        assert!(!flat.contains(&RESTART));
        assert_eq!(tri_set(&strip_to_tris(&flat)), tri_set(&strip_to_tris(&strip)));
    }

    #[test]
    fn test_triangulate_all_offsets_indices() {
        let polys = vec![square(0, 0, 4), square(10, 0, 4)];
        let (tris, vertex_count) = triangulate_all(&polys).unwrap();
        assert_eq!(vertex_count, 8);
        assert_eq!(tris.len(), 4);
        // second polygon's indices all land in 4..8
        assert!(tris[2..].iter().all(|t| t.a >= 4 && t.b >= 4 && t.c >= 4));
        let points = flatten_points(&polys);
        assert_eq!(points.len(), 8);
        assert_eq!(points[4], Point::new(10, 0));
    }

    #[test]
    fn test_build_index_buffer_disjoint_polygons() {
        let polys = vec![square(0, 0, 4), square(10, 0, 4)];
        for use_restart in [true, false] {
            let strip = build_index_buffer(&polys, use_restart).unwrap();
            let tris = strip_to_tris(&strip);
            assert_eq!(tris.len(), 4);
            let (expect, _) = triangulate_all(&polys).unwrap();
            assert_eq!(tri_set(&tris), tri_set(&expect));
        }
    }
}
