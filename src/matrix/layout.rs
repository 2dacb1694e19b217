// Stream <-> module packing.
//
// Data modules are visited row-major, skipping marker cells. Stream bits
// are packed MSB-first, `depth.bits()` per module, so a Color32 module holds
// four consecutive stream bytes as 0xRRGGBBAA. Capacity left after the
// stream is filled with DECORATIVE_FILL repeated; bits left over in the
// final module are zero.

use super::geometry::{Geometry, Point};
use super::marker::{self, is_marker_cell};
use super::sizing::{MAX_SIDE, MIN_SIDE, capacity, check_side, required_side};
use super::{LayoutError, Matrix, ModuleDepth};

/// Filler cycled through unused data capacity.
pub const DECORATIVE_FILL: [u8; 2] = [0xEC, 0x11];

/// Row-major indices of data modules.
fn data_indices(side: usize) -> impl Iterator<Item = usize> {
    (0..side * side).filter(move |&i| !is_marker_cell(side, i / side, i % side))
}

#[inline]
fn low_mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// Lay out a stream in the smallest matrix that holds it.
pub fn layout(stream: &[u8], depth: ModuleDepth) -> Result<Matrix, LayoutError> {
    let side = required_side(stream.len(), depth)?;
    layout_with_side(stream, side, depth)
}

/// Lay out a stream in a matrix of the given side.
pub fn layout_with_side(
    stream: &[u8],
    side: usize,
    depth: ModuleDepth,
) -> Result<Matrix, LayoutError> {
    let depth = depth.validated()?;
    check_side(side, stream.len(), depth)?;

    let mut matrix = Matrix::new(side, depth);
    marker::stamp(&mut matrix);

    let bits = depth.bits();
    let cap = capacity(side, depth);
    let mut bytes = stream
        .iter()
        .copied()
        .chain(DECORATIVE_FILL.iter().copied().cycle())
        .take(cap);

    let mut acc = 0u64;
    let mut pending = 0u32;
    let modules = matrix.modules_mut();
    for index in data_indices(side) {
        while pending < bits {
            match bytes.next() {
                Some(b) => {
                    acc = (acc << 8) | b as u64;
                    pending += 8;
                }
                None => break,
            }
        }
        let value = if pending >= bits {
            pending -= bits;
            (acc >> pending) & low_mask(bits)
        } else {
            let v = (acc << (bits - pending)) & low_mask(bits);
            pending = 0;
            v
        };
        acc &= low_mask(pending);
        modules[index] = value as u32;
    }

    log::debug!(
        "layout: {} stream bytes into {side}x{side} {depth} matrix ({cap} bytes capacity)",
        stream.len()
    );
    Ok(matrix)
}

/// Read the data capacity of a matrix back into bytes.
///
/// `corners` are the finder centres found on the rendered symbol; they must
/// describe a consistent grid for this matrix's side. The returned stream
/// is `capacity(side, depth)` bytes long, decorative fill included.
pub fn unlayout(matrix: &Matrix, corners: &[Point]) -> Result<Vec<u8>, LayoutError> {
    let side = matrix.side();
    if !(MIN_SIDE..=MAX_SIDE).contains(&side) {
        return Err(LayoutError::SideOutOfRange { side });
    }
    let depth = matrix.depth().validated()?;
    let geometry = Geometry::from_corners(corners, side)?;
    log::debug!(
        "unlayout: {side}x{side} {depth} matrix, {:.2} px/module",
        geometry.module_px()
    );

    let damaged = marker::damaged_cells(matrix);
    if damaged > 0 {
        log::debug!("unlayout: {damaged} marker cells differ from the finder glyph");
    }

    let bits = depth.bits();
    let cap = capacity(side, depth);
    let mut out = Vec::with_capacity(cap);
    let mut acc = 0u64;
    let mut pending = 0u32;
    let modules = matrix.modules();
    for index in data_indices(side) {
        acc = (acc << bits) | (modules[index] as u64 & low_mask(bits));
        pending += bits;
        while pending >= 8 {
            pending -= 8;
            out.push((acc >> pending) as u8);
        }
        acc &= low_mask(pending);
        if out.len() >= cap {
            break;
        }
    }
    out.truncate(cap);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::geometry::pixel_corners;

    fn corners(side: usize) -> [Point; 4] {
        pixel_corners(side, 1.0, 0.0)
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 + 7) as u8).collect()
    }

    #[test]
    fn color32_packs_four_bytes_per_module() {
        let m = layout(&[0x01, 0x02, 0x03, 0x04, 0xAA], ModuleDepth::Color32).unwrap();
        assert_eq!(m.side(), MIN_SIDE);
        // Row 0 starts with the top-left marker region.
        assert_eq!(m.get(0, 20), 0x0102_0304);
        assert_eq!(m.get(0, 21), 0xAAEC_11EC);
        assert_eq!(m.get(0, 22), 0x11EC_11EC);
    }

    #[test]
    fn reduced_depths_roundtrip() {
        for bits in 1..=4u8 {
            let depth = ModuleDepth::reduced(bits).unwrap();
            let data = sample(3000);
            let m = layout(&data, depth).unwrap();
            assert!(m.modules().iter().all(|&v| v <= depth.max_value()));
            let out = unlayout(&m, &corners(m.side())).unwrap();
            assert_eq!(out.len(), capacity(m.side(), depth));
            assert_eq!(&out[..data.len()], &data[..], "{bits} bits");
        }
    }

    #[test]
    fn decorative_fill_follows_stream() {
        let data = sample(10);
        let m = layout(&data, ModuleDepth::Reduced(2)).unwrap();
        let out = unlayout(&m, &corners(m.side())).unwrap();
        assert_eq!(&out[10..14], &[0xEC, 0x11, 0xEC, 0x11]);
        assert_eq!(*out.last().unwrap(), if (out.len() - 10) % 2 == 1 { 0xEC } else { 0x11 });
    }

    #[test]
    fn explicit_side_is_honoured() {
        let data = sample(500);
        let m = layout_with_side(&data, 400, ModuleDepth::Color32).unwrap();
        assert_eq!(m.side(), 400);
        let out = unlayout(&m, &corners(400)).unwrap();
        assert_eq!(&out[..500], &data[..]);
    }

    #[test]
    fn markers_are_stamped() {
        let m = layout(&sample(100), ModuleDepth::Color32).unwrap();
        assert_eq!(marker::damaged_cells(&m), 0);
    }

    #[test]
    fn unlayout_requires_four_markers() {
        let m = layout(&sample(10), ModuleDepth::Color32).unwrap();
        assert_eq!(
            unlayout(&m, &corners(m.side())[..2]),
            Err(LayoutError::InsufficientMarkers { found: 2 })
        );
    }

    #[test]
    fn undersized_matrix_is_rejected() {
        for side in [8, 15, 19, 255] {
            let m = Matrix::new(side, ModuleDepth::Color32);
            assert_eq!(
                unlayout(&m, &corners(side)),
                Err(LayoutError::SideOutOfRange { side })
            );
        }
    }

    #[test]
    fn stream_too_large_for_side() {
        let cap = capacity(256, ModuleDepth::Reduced(1));
        let err = layout_with_side(&sample(cap + 1), 256, ModuleDepth::Reduced(1)).unwrap_err();
        assert_eq!(
            err,
            LayoutError::MatrixTooSmall {
                needed: 257,
                requested: 256
            }
        );
    }
}
