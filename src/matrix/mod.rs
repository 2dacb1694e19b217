// Matrix layout engine.
//
// A matrix is a square grid of modules. Each module is a `u32` whose meaning
// depends on the depth profile: four stream bytes as RGBA under `Color32`,
// or a single 1..=4 bit intensity under `Reduced`.
//
// - `sizing`    side selection and data capacity
// - `marker`    corner finder glyphs
// - `geometry`  module grid recovered from finder centres
// - `layout`    stream <-> module packing
// - `raster`    pixel rendering and sampling (reference boundary)

pub mod geometry;
pub mod layout;
pub mod marker;
pub mod raster;
pub mod sizing;

use std::fmt;

use thiserror::Error;

pub use geometry::{Geometry, Point};
pub use layout::{layout, layout_with_side, unlayout};
pub use sizing::{MAX_SIDE, MIN_SIDE, capacity, required_side};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("stream needs a {needed}x{needed} matrix, but {requested}x{requested} was requested")]
    MatrixTooSmall { needed: usize, requested: usize },

    #[error("matrix side {side} outside {}..={}", MIN_SIDE, MAX_SIDE)]
    SideOutOfRange { side: usize },

    #[error("found {found} of 4 finder markers")]
    InsufficientMarkers { found: usize },

    #[error("invalid marker geometry: {reason}")]
    InvalidMarkerGeometry { reason: &'static str },

    #[error("unsupported module depth of {bits} bits")]
    InvalidDepth { bits: u8 },

    #[error("expected {expected} modules, got {actual}")]
    ModuleCountMismatch { expected: usize, actual: usize },

    #[error("module {index} holds {value:#X}, out of range for the depth profile")]
    ModuleOutOfRange { index: usize, value: u32 },
}

// ---------------------------------------------------------------------------
// Depth profile
// ---------------------------------------------------------------------------

/// Bits carried by one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModuleDepth {
    /// RGBA, 8 bits per channel.
    #[default]
    Color32,
    /// One intensity level of 1..=4 bits.
    Reduced(u8),
}

impl ModuleDepth {
    pub const MAX_REDUCED_BITS: u8 = 4;

    /// Checked constructor for the reduced profile.
    pub fn reduced(bits: u8) -> Result<Self, LayoutError> {
        Self::Reduced(bits).validated()
    }

    pub fn validated(self) -> Result<Self, LayoutError> {
        match self {
            Self::Reduced(bits) if bits == 0 || bits > Self::MAX_REDUCED_BITS => {
                Err(LayoutError::InvalidDepth { bits })
            }
            other => Ok(other),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::Color32 => 32,
            Self::Reduced(bits) => bits as u32,
        }
    }

    /// Largest value a module may hold.
    pub fn max_value(self) -> u32 {
        match self {
            Self::Color32 => u32::MAX,
            Self::Reduced(bits) => (1u32 << bits) - 1,
        }
    }

    /// Dark module value used by finder glyphs.
    pub fn black(self) -> u32 {
        match self {
            Self::Color32 => 0x0000_00FF,
            Self::Reduced(_) => 0,
        }
    }

    /// Light module value used around finder glyphs.
    pub fn white(self) -> u32 {
        self.max_value()
    }

    /// Single-byte tag used by the container format.
    pub fn code(self) -> u8 {
        match self {
            Self::Color32 => 32,
            Self::Reduced(bits) => bits,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, LayoutError> {
        match code {
            32 => Ok(Self::Color32),
            bits => Self::reduced(bits),
        }
    }
}

impl fmt::Display for ModuleDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color32 => f.write_str("color32"),
            Self::Reduced(bits) => write!(f, "reduced{bits}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

/// Square module grid, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    side: usize,
    depth: ModuleDepth,
    modules: Vec<u32>,
}

impl Matrix {
    /// A matrix of light modules.
    pub fn new(side: usize, depth: ModuleDepth) -> Self {
        Self {
            side,
            depth,
            modules: vec![depth.white(); side * side],
        }
    }

    /// Wrap existing module values, checking count and value range.
    pub fn from_modules(
        side: usize,
        depth: ModuleDepth,
        modules: Vec<u32>,
    ) -> Result<Self, LayoutError> {
        let depth = depth.validated()?;
        let expected = side * side;
        if modules.len() != expected {
            return Err(LayoutError::ModuleCountMismatch {
                expected,
                actual: modules.len(),
            });
        }
        let max = depth.max_value();
        if let Some((index, &value)) = modules.iter().enumerate().find(|&(_, &v)| v > max) {
            return Err(LayoutError::ModuleOutOfRange { index, value });
        }
        Ok(Self {
            side,
            depth,
            modules,
        })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn depth(&self) -> ModuleDepth {
        self.depth
    }

    pub fn modules(&self) -> &[u32] {
        &self.modules
    }

    /// Mutable access for callers that simulate damage or apply their own
    /// post-processing.
    pub fn modules_mut(&mut self) -> &mut [u32] {
        &mut self.modules
    }

    pub fn into_modules(self) -> Vec<u32> {
        self.modules
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.modules[row * self.side + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: u32) {
        self.modules[row * self.side + col] = value;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_bits_and_levels() {
        assert_eq!(ModuleDepth::Color32.bits(), 32);
        assert_eq!(ModuleDepth::Color32.black(), 0x0000_00FF);
        assert_eq!(ModuleDepth::Color32.white(), 0xFFFF_FFFF);
        let d = ModuleDepth::reduced(3).unwrap();
        assert_eq!(d.bits(), 3);
        assert_eq!(d.black(), 0);
        assert_eq!(d.white(), 7);
    }

    #[test]
    fn invalid_reduced_depths_rejected() {
        assert_eq!(
            ModuleDepth::reduced(0),
            Err(LayoutError::InvalidDepth { bits: 0 })
        );
        assert!(ModuleDepth::reduced(5).is_err());
        assert!(ModuleDepth::from_code(8).is_err());
    }

    #[test]
    fn depth_code_roundtrip() {
        for depth in [
            ModuleDepth::Color32,
            ModuleDepth::Reduced(1),
            ModuleDepth::Reduced(2),
            ModuleDepth::Reduced(4),
        ] {
            assert_eq!(ModuleDepth::from_code(depth.code()), Ok(depth));
        }
    }

    #[test]
    fn from_modules_checks_shape_and_range() {
        let d = ModuleDepth::Reduced(1);
        assert!(Matrix::from_modules(2, d, vec![0, 1, 1, 0]).is_ok());
        assert_eq!(
            Matrix::from_modules(2, d, vec![0, 1, 1]),
            Err(LayoutError::ModuleCountMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            Matrix::from_modules(2, d, vec![0, 2, 1, 0]),
            Err(LayoutError::ModuleOutOfRange { index: 1, value: 2 })
        );
    }

    #[test]
    fn get_set_row_major() {
        let mut m = Matrix::new(3, ModuleDepth::Color32);
        m.set(1, 2, 42);
        assert_eq!(m.get(1, 2), 42);
        assert_eq!(m.modules()[5], 42);
    }
}
