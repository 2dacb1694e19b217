// Corner markers.
//
// Each corner holds a 20x20 region excluded from data. A 7x7 finder glyph
// (dark ring, light ring, dark 3x3 core) sits at the region's outer corner;
// the rest of the region is light.

use super::geometry::Point;
use super::{Matrix, ModuleDepth};

/// Edge of one corner region, in modules.
pub const MARKER_REGION: usize = 20;
/// Edge of the finder glyph, in modules.
pub const FINDER_SIZE: usize = 7;
/// Modules excluded from data across all four corners.
pub const MARKER_CELLS: usize = 4 * MARKER_REGION * MARKER_REGION;

/// Offset of a finder centre from its outer matrix corner, in modules.
pub const FINDER_CENTER: f64 = FINDER_SIZE as f64 / 2.0;

#[inline]
pub fn is_marker_cell(side: usize, row: usize, col: usize) -> bool {
    let near = |i: usize| i < MARKER_REGION || i + MARKER_REGION >= side;
    near(row) && near(col)
}

/// Glyph cell (r, c) measured from the outer corner. `r` and `c` < 7.
fn finder_is_dark(r: usize, c: usize) -> bool {
    let ring = r.min(c).min(FINDER_SIZE - 1 - r).min(FINDER_SIZE - 1 - c);
    ring != 1
}

/// Expected value of a marker cell.
fn marker_value(side: usize, depth: ModuleDepth, row: usize, col: usize) -> u32 {
    let r = row.min(side - 1 - row);
    let c = col.min(side - 1 - col);
    if r < FINDER_SIZE && c < FINDER_SIZE && finder_is_dark(r, c) {
        depth.black()
    } else {
        depth.white()
    }
}

fn marker_cells(side: usize) -> impl Iterator<Item = (usize, usize)> {
    let low = 0..MARKER_REGION;
    let high = side - MARKER_REGION..side;
    let rows = low.clone().chain(high.clone());
    rows.flat_map(move |row| low.clone().chain(high.clone()).map(move |col| (row, col)))
}

/// Write all four corner regions.
pub fn stamp(matrix: &mut Matrix) {
    let side = matrix.side();
    let depth = matrix.depth();
    for (row, col) in marker_cells(side) {
        matrix.set(row, col, marker_value(side, depth, row, col));
    }
}

/// Marker cells whose value differs from the stamped glyph.
pub fn damaged_cells(matrix: &Matrix) -> usize {
    let side = matrix.side();
    let depth = matrix.depth();
    marker_cells(side)
        .filter(|&(row, col)| matrix.get(row, col) != marker_value(side, depth, row, col))
        .count()
}

/// Finder centres in module coordinates, ordered TL, TR, BL, BR.
pub fn finder_centers(side: usize) -> [Point; 4] {
    let near = FINDER_CENTER;
    let far = side as f64 - FINDER_CENTER;
    [
        Point::new(near, near),
        Point::new(far, near),
        Point::new(near, far),
        Point::new(far, far),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_rings() {
        let dark: Vec<bool> = (0..FINDER_SIZE).map(|c| finder_is_dark(3, c)).collect();
        assert_eq!(dark, [true, false, true, true, true, false, true]);
        assert!(finder_is_dark(0, 3));
        assert!(!finder_is_dark(1, 1));
        assert!(finder_is_dark(2, 2));
    }

    #[test]
    fn marker_cells_are_the_four_corners() {
        let side = 256;
        assert!(is_marker_cell(side, 0, 0));
        assert!(is_marker_cell(side, 19, 255));
        assert!(is_marker_cell(side, 236, 236));
        assert!(!is_marker_cell(side, 20, 0));
        assert!(!is_marker_cell(side, 0, 20));
        assert!(!is_marker_cell(side, 128, 128));
        assert_eq!(marker_cells(side).count(), MARKER_CELLS);
        let counted = (0..side)
            .flat_map(|r| (0..side).map(move |c| (r, c)))
            .filter(|&(r, c)| is_marker_cell(side, r, c))
            .count();
        assert_eq!(counted, MARKER_CELLS);
    }

    #[test]
    fn stamp_is_symmetric_and_detectable() {
        let depth = ModuleDepth::Color32;
        let mut m = Matrix::new(256, depth);
        m.modules_mut().fill(0x1234_5678);
        stamp(&mut m);
        assert_eq!(damaged_cells(&m), 0);
        assert_eq!(m.get(0, 0), depth.black());
        assert_eq!(m.get(1, 1), depth.white());
        assert_eq!(m.get(3, 3), depth.black());
        assert_eq!(m.get(255, 255), depth.black());
        assert_eq!(m.get(252, 3), depth.black());
        assert_eq!(m.get(10, 10), depth.white());
        assert_eq!(m.get(30, 30), 0x1234_5678);

        m.set(3, 3, depth.white());
        m.set(250, 0, 7);
        assert_eq!(damaged_cells(&m), 2);
    }

    #[test]
    fn centres_sit_inside_the_glyphs() {
        let c = finder_centers(256);
        assert_eq!(c[0], Point::new(3.5, 3.5));
        assert_eq!(c[3], Point::new(252.5, 252.5));
    }
}
