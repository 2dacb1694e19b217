// Side selection.
//
// Data capacity of an S x S matrix is the number of non-marker modules times
// the depth's bit width, rounded down to whole bytes. The required side is
// the smallest S whose capacity holds the stream, never below MIN_SIDE.

use super::marker::MARKER_CELLS;
use super::{LayoutError, ModuleDepth};

pub const MIN_SIDE: usize = 256;
pub const MAX_SIDE: usize = 4096;

/// Modules available for stream data.
pub fn data_cells(side: usize) -> usize {
    (side * side).saturating_sub(MARKER_CELLS)
}

/// Stream bytes an S x S matrix can carry.
pub fn capacity(side: usize, depth: ModuleDepth) -> usize {
    data_cells(side) * depth.bits() as usize / 8
}

/// Smallest side (at least MIN_SIDE) holding `stream_len` bytes, with no
/// upper clamp.
pub fn minimum_side(stream_len: usize, depth: ModuleDepth) -> usize {
    let bits = depth.bits() as usize;
    let cells = (stream_len * 8).div_ceil(bits) + MARKER_CELLS;
    let mut side = cells.isqrt();
    if side * side < cells {
        side += 1;
    }
    side.max(MIN_SIDE)
}

/// Smallest valid side holding `stream_len` bytes.
pub fn required_side(stream_len: usize, depth: ModuleDepth) -> Result<usize, LayoutError> {
    let side = minimum_side(stream_len, depth.validated()?);
    if side > MAX_SIDE {
        return Err(LayoutError::MatrixTooSmall {
            needed: side,
            requested: MAX_SIDE,
        });
    }
    Ok(side)
}

/// Check a caller-chosen side against range and stream length.
pub fn check_side(side: usize, stream_len: usize, depth: ModuleDepth) -> Result<(), LayoutError> {
    if !(MIN_SIDE..=MAX_SIDE).contains(&side) {
        return Err(LayoutError::SideOutOfRange { side });
    }
    if capacity(side, depth) < stream_len {
        return Err(LayoutError::MatrixTooSmall {
            needed: minimum_side(stream_len, depth),
            requested: side,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_streams_use_minimum_side() {
        assert_eq!(required_side(0, ModuleDepth::Color32), Ok(MIN_SIDE));
        assert_eq!(required_side(255, ModuleDepth::Color32), Ok(MIN_SIDE));
        assert_eq!(required_side(255, ModuleDepth::Reduced(1)), Ok(MIN_SIDE));
    }

    #[test]
    fn required_side_is_tight() {
        for depth in [ModuleDepth::Color32, ModuleDepth::Reduced(1), ModuleDepth::Reduced(3)] {
            for len in [100_000usize, 262_144, 1_000_001] {
                let Ok(side) = required_side(len, depth) else {
                    continue;
                };
                assert!(capacity(side, depth) >= len);
                if side > MIN_SIDE {
                    assert!(capacity(side - 1, depth) < len, "{depth} {len}");
                }
            }
        }
    }

    #[test]
    fn capacity_excludes_markers() {
        assert_eq!(data_cells(256), 256 * 256 - 1600);
        assert_eq!(capacity(256, ModuleDepth::Color32), (256 * 256 - 1600) * 4);
        assert_eq!(capacity(256, ModuleDepth::Reduced(1)), (256 * 256 - 1600) / 8);
    }

    #[test]
    fn oversize_stream_is_rejected() {
        let too_big = capacity(MAX_SIDE, ModuleDepth::Reduced(1)) + 1;
        match required_side(too_big, ModuleDepth::Reduced(1)) {
            Err(LayoutError::MatrixTooSmall { needed, requested }) => {
                assert_eq!(requested, MAX_SIDE);
                assert!(needed > MAX_SIDE);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn check_side_reports_range_and_fit() {
        assert_eq!(
            check_side(100, 10, ModuleDepth::Color32),
            Err(LayoutError::SideOutOfRange { side: 100 })
        );
        assert_eq!(
            check_side(5000, 10, ModuleDepth::Color32),
            Err(LayoutError::SideOutOfRange { side: 5000 })
        );
        let len = capacity(300, ModuleDepth::Reduced(2)) + 1;
        assert!(matches!(
            check_side(300, len, ModuleDepth::Reduced(2)),
            Err(LayoutError::MatrixTooSmall { requested: 300, .. })
        ));
        assert!(check_side(256, 37, ModuleDepth::Color32).is_ok());
    }
}
