// Module grid recovered from finder centres.
//
// Corners are the pixel positions of the four finder centres, ordered TL,
// TR, BL, BR. TL/TR/BL span an affine frame; BR must agree with it to
// within MAX_CORNER_DEVIATION modules.

use std::ops::{Add, Mul, Sub};

use super::LayoutError;
use super::marker::{FINDER_CENTER, FINDER_SIZE, finder_centers};

/// Largest BR offset from the parallelogram prediction, in modules.
pub const MAX_CORNER_DEVIATION: f64 = 2.0;
/// Largest ratio between horizontal and vertical module pitch.
pub const MAX_PITCH_RATIO: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }
}

/// Affine mapping from module coordinates to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    side: usize,
    /// Pixel position of the matrix's outer top-left corner.
    origin: Point,
    /// One module step along a row.
    col_step: Point,
    /// One module step down a column.
    row_step: Point,
}

impl Geometry {
    pub fn from_corners(corners: &[Point], side: usize) -> Result<Self, LayoutError> {
        let [tl, tr, bl, br] = match corners {
            [tl, tr, bl, br, rest @ ..] => {
                if !rest.is_empty() {
                    log::debug!("geometry: ignoring {} extra marker(s)", rest.len());
                }
                [*tl, *tr, *bl, *br]
            }
            _ => {
                return Err(LayoutError::InsufficientMarkers {
                    found: corners.len(),
                });
            }
        };
        let invalid = |reason| Err(LayoutError::InvalidMarkerGeometry { reason });

        if ![tl, tr, bl, br].iter().all(|p| p.is_finite()) {
            return invalid("non-finite marker coordinate");
        }
        if side <= FINDER_SIZE {
            return invalid("matrix too small for finder spacing");
        }

        let span = (side - FINDER_SIZE) as f64;
        let col_step = (tr - tl) * (1.0 / span);
        let row_step = (bl - tl) * (1.0 / span);
        let (cw, rh) = (col_step.norm(), row_step.norm());
        if cw <= f64::EPSILON || rh <= f64::EPSILON {
            return invalid("coincident markers");
        }
        if cw / rh > MAX_PITCH_RATIO || rh / cw > MAX_PITCH_RATIO {
            return invalid("module pitch differs between axes");
        }
        if col_step.cross(row_step) <= 0.0 {
            return invalid("markers are mirrored or collinear");
        }

        let predicted = tr + bl - tl;
        let pitch = (cw + rh) / 2.0;
        if (br - predicted).norm() / pitch > MAX_CORNER_DEVIATION {
            return invalid("bottom-right marker does not complete the parallelogram");
        }

        let origin = tl - (col_step + row_step) * FINDER_CENTER;
        Ok(Self {
            side,
            origin,
            col_step,
            row_step,
        })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// Mean module edge in pixels.
    pub fn module_px(&self) -> f64 {
        (self.col_step.norm() + self.row_step.norm()) / 2.0
    }

    /// Pixel position of a module's centre.
    pub fn module_center(&self, row: usize, col: usize) -> Point {
        self.origin + self.col_step * (col as f64 + 0.5) + self.row_step * (row as f64 + 0.5)
    }
}

/// Finder centres of an axis-aligned rendering with square modules of
/// `module_px` pixels, offset by `margin_px` on both axes.
pub fn pixel_corners(side: usize, module_px: f64, margin_px: f64) -> [Point; 4] {
    finder_centers(side).map(|p| p * module_px + Point::new(margin_px, margin_px))
}
