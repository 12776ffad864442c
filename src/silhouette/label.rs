use crate::grid::Grid;
use crate::raster::flood_fill;

use super::flags::PixelFlags;

/// Pixel flags plus the connected component the pixel belongs to.
/// Component id 0 means unassigned; the labeler assigns each solid/dilated
/// pixel exactly once.
#[derive(Debug, Clone, Copy)]
pub struct MetaPixel {
    pub flags: PixelFlags,
    pub component: u32,
}

impl MetaPixel {
    fn unassigned(flags: PixelFlags) -> Self {
        Self {
            flags,
            component: 0,
        }
    }
}

/// Label 4-connected components of solid/dilated pixels with ids 1..=N in
/// scan order. Returns the annotated grid and the component count.
pub fn label_components(flags: &Grid<PixelFlags>) -> (Grid<MetaPixel>, u32) {
    let w = flags.width();
    let h = flags.height();
    let mut meta = Grid::new(w, h, MetaPixel::unassigned(PixelFlags::EMPTY));
    for y in 0..h {
        for x in 0..w {
            meta[(x, y)] = MetaPixel::unassigned(flags[(x, y)]);
        }
    }

    let region = PixelFlags::SOLID | PixelFlags::DILATED;
    let mut count = 0u32;
    for y in 0..h {
        for x in 0..w {
            let m = meta[(x, y)];
            if m.component != 0 || !m.flags.intersects(region) {
                continue;
            }
            count += 1;
            let id = count;
            flood_fill(x, y, |px, py| {
                if px < 0 || py < 0 || px >= w as i64 || py >= h as i64 {
                    return false;
                }
                let cell = &mut meta[(px as usize, py as usize)];
                if cell.component != 0 || !cell.flags.intersects(region) {
                    return false;
                }
                cell.component = id;
                true
            });
        }
    }

    (meta, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from_rows(rows: &[&str]) -> Grid<PixelFlags> {
        let h = rows.len();
        let w = rows[0].len();
        let mut g = Grid::new(w, h, PixelFlags::EMPTY);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    g[(x, y)] = PixelFlags::SOLID;
                }
            }
        }
        g
    }

    #[test]
    fn test_two_separate_blobs() {
        let g = grid_from_rows(&[
            "##..#",
            "##..#",
            ".....",
        ]);
        let (meta, count) = label_components(&g);
        assert_eq!(count, 2);
        assert_eq!(meta[(0, 0)].component, 1);
        assert_eq!(meta[(1, 1)].component, 1);
        assert_eq!(meta[(4, 0)].component, 2);
        assert_eq!(meta[(2, 0)].component, 0);
    }

    #[test]
    fn test_diagonal_is_not_connected() {
        // 4-connectivity: diagonal touch forms two components
        let g = grid_from_rows(&[
            "#.",
            ".#",
        ]);
        let (_, count) = label_components(&g);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_ids_assigned_in_scan_order() {
        let g = grid_from_rows(&[
            ".#.",
            "...",
            "#.#",
        ]);
        let (meta, count) = label_components(&g);
        assert_eq!(count, 3);
        assert_eq!(meta[(1, 0)].component, 1);
        assert_eq!(meta[(0, 2)].component, 2);
        assert_eq!(meta[(2, 2)].component, 3);
    }

    #[test]
    fn test_large_blob_no_stack_overflow() {
        // explicit work stack: a full 512x512 blob must label fine
        let g = Grid::new(512, 512, PixelFlags::SOLID);
        let (meta, count) = label_components(&g);
        assert_eq!(count, 1);
        assert_eq!(meta[(511, 511)].component, 1);
    }
}
