use crate::grid::Grid;

/// Sentinel for "no seed anywhere near". Callers of the 1D transform must
/// guarantee INF > n*n for their array length n, otherwise the parabola
/// tie-breaks are corrupted.
pub const INF: f32 = 1e20;

/// Reusable scratch buffers for the 1D transform so the 2D driver does not
/// reallocate per row/column.
pub struct DtScratch {
    owners: Vec<usize>,
    breaks: Vec<f32>,
    input: Vec<f32>,
}

impl DtScratch {
    pub fn new(capacity: usize) -> Self {
        Self {
            owners: Vec::with_capacity(capacity),
            breaks: Vec::with_capacity(capacity + 1),
            input: Vec::with_capacity(capacity),
        }
    }

    /// 1D squared-distance transform in place, lower envelope of parabolas.
    ///
    /// `values` holds the seed array (0 at occupied cells, [`INF`] elsewhere)
    /// and receives the squared distance to the nearest 0-seed. O(n): a
    /// forward pass builds a monotonic stack of owning seed indices with
    /// validity intervals, a backward pass samples the envelope.
    pub fn transform(&mut self, values: &mut [f32]) {
        let n = values.len();
        if n < 2 {
            return;
        }

        self.input.clear();
        self.input.extend_from_slice(values);
        self.owners.clear();
        self.owners.resize(n, 0);
        self.breaks.clear();
        self.breaks.resize(n + 1, 0.0);

        let input = &self.input;
        let owners = &mut self.owners;
        let breaks = &mut self.breaks;

        owners[0] = 0;
        breaks[0] = -INF;
        breaks[1] = INF;

        let mut k = 0usize;
        for q in 1..n {
            let fq = input[q] + (q * q) as f32;
            let s = loop {
                let vk = owners[k];
                let s = (fq - (input[vk] + (vk * vk) as f32)) / ((2 * q - 2 * vk) as f32);
                if s > breaks[k] {
                    break s;
                }
                // breaks[0] is -INF, so k never underflows for finite s
                k -= 1;
            };
            k += 1;
            owners[k] = q;
            breaks[k] = s;
            breaks[k + 1] = INF;
        }

        k = 0;
        for (q, out) in values.iter_mut().enumerate() {
            while breaks[k + 1] < q as f32 {
                k += 1;
            }
            let vk = owners[k];
            let d = q.abs_diff(vk);
            *out = (d * d) as f32 + input[vk];
        }
    }
}

/// 2D squared-distance transform of a binary occupancy grid: every cell
/// receives the squared Euclidean distance to the nearest occupied cell.
/// Cells with no occupied cell anywhere keep a value >= [`INF`].
pub fn squared_distance_field(occupied: &Grid<u8>) -> Grid<f32> {
    let w = occupied.width();
    let h = occupied.height();
    let mut dist = Grid::new(w, h, INF);
    for y in 0..h {
        for x in 0..w {
            if occupied[(x, y)] != 0 {
                dist[(x, y)] = 0.0;
            }
        }
    }
    if w == 0 || h == 0 {
        return dist;
    }

    let mut scratch = DtScratch::new(w.max(h));

    // columns first, through a strided scratch buffer
    let mut column = vec![0.0f32; h];
    for x in 0..w {
        for (y, c) in column.iter_mut().enumerate() {
            *c = dist[(x, y)];
        }
        scratch.transform(&mut column);
        for (y, c) in column.iter().enumerate() {
            dist[(x, y)] = *c;
        }
    }

    // then rows, in place
    for y in 0..h {
        scratch.transform(dist.row_mut(y));
    }

    dist
}

/// Normalize a squared-distance field to [0, ~1]: sqrt of each cell divided
/// by the grid diagonal length.
pub fn normalize_distance_field(dist: &mut Grid<f32>) {
    let w = dist.width();
    let h = dist.height();
    if w == 0 || h == 0 {
        return;
    }
    let m = 1.0 / ((w * w + h * h) as f32).sqrt();
    for d in dist.cells_mut() {
        *d = m * d.sqrt();
    }
}

/// Normalized distance field of a binary occupancy grid.
pub fn distance_field(occupied: &Grid<u8>) -> Grid<f32> {
    let mut dist = squared_distance_field(occupied);
    normalize_distance_field(&mut dist);
    dist
}
