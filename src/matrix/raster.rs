// Pixel boundary.
//
// Capture and printing live outside this crate. The traits here are the
// seam: a `Locator` finds finder centres on a surface, and a `Rasterizer`
// turns matrices into pixels and back. `ModuleRasterizer` and `IdealLocator`
// are exact reference implementations for undistorted renderings; they are
// what the CLI and the tests use.

use super::geometry::{Geometry, Point, pixel_corners};
use super::marker::FINDER_SIZE;
use super::sizing::{MAX_SIDE, MIN_SIDE};
use super::{LayoutError, Matrix, ModuleDepth};

const WHITE_PIXEL: u32 = 0xFFFF_FFFF;

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// RGBA pixels, row-major, one `u32` (0xRRGGBBAA) per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl PixelSurface {
    pub fn new(width: usize, height: usize, fill: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    pub fn set(&mut self, x: usize, y: usize, value: u32) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = value;
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, size: usize, value: u32) {
        for row in y..(y + size).min(self.height) {
            let start = row * self.width + x.min(self.width);
            let end = row * self.width + (x + size).min(self.width);
            self.pixels[start..end].fill(value);
        }
    }

    /// Pixel at a sub-pixel position, if it falls on the surface.
    fn sample(&self, p: Point) -> Option<u32> {
        if p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        self.get(p.x as usize, p.y as usize)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Finds finder centres (TL, TR, BL, BR) on a surface. May return fewer
/// than four when markers are missing or damaged.
pub trait Locator {
    fn locate(&self, surface: &PixelSurface) -> Vec<Point>;
}

pub trait Rasterizer {
    fn draw(&self, matrix: &Matrix) -> PixelSurface;
    fn read(&self, surface: &PixelSurface, corners: &[Point]) -> Result<Matrix, LayoutError>;
}

// ---------------------------------------------------------------------------
// Module <-> pixel values
// ---------------------------------------------------------------------------

fn module_to_pixel(depth: ModuleDepth, value: u32) -> u32 {
    match depth {
        ModuleDepth::Color32 => value,
        ModuleDepth::Reduced(_) => {
            let max = depth.max_value();
            let g = (value.min(max) * 255 + max / 2) / max;
            (g << 24) | (g << 16) | (g << 8) | 0xFF
        }
    }
}

fn pixel_to_module(depth: ModuleDepth, pixel: u32) -> u32 {
    match depth {
        ModuleDepth::Color32 => pixel,
        ModuleDepth::Reduced(_) => {
            let g = pixel >> 24;
            let max = depth.max_value();
            (g * max + 127) / 255
        }
    }
}

fn is_dark(pixel: u32) -> bool {
    let [r, g, b, _] = pixel.to_be_bytes();
    (r as u32 + g as u32 + b as u32) < 3 * 128
}

// ---------------------------------------------------------------------------
// Reference implementations
// ---------------------------------------------------------------------------

/// Solid squares of `module_px` pixels inside a light quiet zone of
/// `quiet_zone` modules. `depth` is the profile `read` reconstructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleRasterizer {
    pub module_px: usize,
    pub quiet_zone: usize,
    pub depth: ModuleDepth,
}

impl Default for ModuleRasterizer {
    fn default() -> Self {
        Self {
            module_px: 4,
            quiet_zone: 4,
            depth: ModuleDepth::Color32,
        }
    }
}

impl ModuleRasterizer {
    pub fn new(module_px: usize, depth: ModuleDepth) -> Self {
        Self {
            module_px,
            depth,
            ..Self::default()
        }
    }

    fn margin_px(&self) -> usize {
        self.quiet_zone * self.module_px
    }

    /// Locator matching this rasterizer's output.
    pub fn locator(&self) -> IdealLocator {
        IdealLocator {
            module_px: self.module_px,
            quiet_zone: self.quiet_zone,
        }
    }
}

impl Rasterizer for ModuleRasterizer {
    fn draw(&self, matrix: &Matrix) -> PixelSurface {
        let side = matrix.side();
        let px = self.module_px;
        let margin = self.margin_px();
        let edge = side * px + 2 * margin;
        let mut surface = PixelSurface::new(edge, edge, WHITE_PIXEL);
        for row in 0..side {
            for col in 0..side {
                let value = module_to_pixel(matrix.depth(), matrix.get(row, col));
                surface.fill_rect(margin + col * px, margin + row * px, px, value);
            }
        }
        log::debug!("raster: drew {side}x{side} matrix as {edge}x{edge} px");
        surface
    }

    fn read(&self, surface: &PixelSurface, corners: &[Point]) -> Result<Matrix, LayoutError> {
        let depth = self.depth.validated()?;
        let [tl, tr, ..] = corners else {
            return Err(LayoutError::InsufficientMarkers {
                found: corners.len(),
            });
        };
        if self.module_px == 0 {
            return Err(LayoutError::InvalidMarkerGeometry {
                reason: "zero module size",
            });
        }
        let spacing = (*tr - *tl).norm() / self.module_px as f64;
        if !spacing.is_finite() {
            return Err(LayoutError::InvalidMarkerGeometry {
                reason: "non-finite marker coordinate",
            });
        }
        let side = spacing.round() as usize + FINDER_SIZE;
        if !(MIN_SIDE..=MAX_SIDE).contains(&side) {
            return Err(LayoutError::SideOutOfRange { side });
        }

        let geometry = Geometry::from_corners(corners, side)?;
        let white = depth.white();
        let mut modules = Vec::with_capacity(side * side);
        for row in 0..side {
            for col in 0..side {
                let value = surface
                    .sample(geometry.module_center(row, col))
                    .map_or(white, |p| pixel_to_module(depth, p));
                modules.push(value);
            }
        }
        Matrix::from_modules(side, depth, modules)
    }
}

/// Finder centres of an axis-aligned rendering produced with the same
/// module size and quiet zone. A corner is reported only when the pixel
/// under its centre is dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdealLocator {
    pub module_px: usize,
    pub quiet_zone: usize,
}

impl Locator for IdealLocator {
    fn locate(&self, surface: &PixelSurface) -> Vec<Point> {
        let px = self.module_px;
        let margin = self.quiet_zone * px;
        if px == 0 || surface.width() != surface.height() || surface.width() <= 2 * margin {
            return Vec::new();
        }
        let inner = surface.width() - 2 * margin;
        if inner % px != 0 {
            return Vec::new();
        }
        let side = inner / px;
        if side <= FINDER_SIZE {
            return Vec::new();
        }

        let found: Vec<Point> = pixel_corners(side, px as f64, margin as f64)
            .into_iter()
            .filter(|&p| surface.sample(p).is_some_and(is_dark))
            .collect();
        log::debug!("locator: {} of 4 finder centres on a {side}-module grid", found.len());
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::layout::{layout, unlayout};

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 13 + 5) as u8).collect()
    }

    #[test]
    fn draw_locate_read_is_lossless() {
        for depth in [ModuleDepth::Color32, ModuleDepth::Reduced(2), ModuleDepth::Reduced(4)] {
            let matrix = layout(&sample(700), depth).unwrap();
            let r = ModuleRasterizer::new(2, depth);
            let surface = r.draw(&matrix);
            assert_eq!(surface.width(), (matrix.side() + 8) * 2);

            let corners = r.locator().locate(&surface);
            assert_eq!(corners.len(), 4);
            let back = r.read(&surface, &corners).unwrap();
            assert_eq!(back, matrix, "{depth}");
            let stream = unlayout(&back, &corners).unwrap();
            assert_eq!(&stream[..700], &sample(700)[..]);
        }
    }

    #[test]
    fn damaged_finder_is_not_reported() {
        let matrix = layout(&sample(10), ModuleDepth::Color32).unwrap();
        let r = ModuleRasterizer::default();
        let mut surface = r.draw(&matrix);
        let [_, tr, ..] = pixel_corners(matrix.side(), 4.0, 16.0);
        surface.set(tr.x as usize, tr.y as usize, WHITE_PIXEL);

        let corners = r.locator().locate(&surface);
        assert_eq!(corners.len(), 3);
        assert_eq!(
            r.read(&surface, &corners[..1]),
            Err(LayoutError::InsufficientMarkers { found: 1 })
        );
    }

    #[test]
    fn closely_spaced_corners_are_rejected() {
        // Finder centres 13 px apart at 1 px per module imply a 20-module side.
        let r = ModuleRasterizer::new(1, ModuleDepth::Color32);
        let surface = PixelSurface::new(40, 40, WHITE_PIXEL);
        assert_eq!(
            r.read(&surface, &pixel_corners(20, 1.0, 0.0)),
            Err(LayoutError::SideOutOfRange { side: 20 })
        );
    }

    #[test]
    fn locator_rejects_unexpected_surface() {
        let locator = IdealLocator {
            module_px: 4,
            quiet_zone: 4,
        };
        assert!(locator.locate(&PixelSurface::new(100, 90, WHITE_PIXEL)).is_empty());
        assert!(locator.locate(&PixelSurface::new(1058, 1058, WHITE_PIXEL)).is_empty());
        assert!(locator.locate(&PixelSurface::new(1056, 1056, WHITE_PIXEL)).is_empty());
    }

    #[test]
    fn reduced_levels_survive_pixel_conversion() {
        for bits in 1..=4u8 {
            let depth = ModuleDepth::Reduced(bits);
            for v in 0..=depth.max_value() {
                assert_eq!(pixel_to_module(depth, module_to_pixel(depth, v)), v);
            }
        }
    }
}
