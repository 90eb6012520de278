//! Point types for the two coordinate spaces and the pixel geometry read
//! from a dataset.

use std::ops::{Add, Sub};

/// A position in viewport pixels, origin at the top-left of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

/// A position in image pixels: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImagePoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: ScreenPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl ImagePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl Sub for ScreenPoint {
    type Output = ScreenPoint;

    fn sub(self, rhs: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add for ScreenPoint {
    type Output = ScreenPoint;

    fn add(self, rhs: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Physical size of one pixel, from the `PixelSpacing` attribute
/// (row spacing first, as stored).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSpacing {
    pub row_mm: f64,
    pub col_mm: f64,
}

impl PixelSpacing {
    /// Builds a spacing from the raw attribute values, rejecting anything
    /// that is not two positive numbers.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        match values {
            [row_mm, col_mm, ..] if *row_mm > 0.0 && *col_mm > 0.0 => Some(Self {
                row_mm: *row_mm,
                col_mm: *col_mm,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub columns: u32,
    pub rows: u32,
    pub pixel_spacing: Option<PixelSpacing>,
}

impl ImageGeometry {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            pixel_spacing: None,
        }
    }

    pub fn with_spacing(mut self, spacing: Option<PixelSpacing>) -> Self {
        self.pixel_spacing = spacing;
        self
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        (self.columns > 0 && self.rows > 0).then_some((self.columns, self.rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_requires_two_positive_values() {
        assert_eq!(
            PixelSpacing::from_values(&[0.5, 0.25]),
            Some(PixelSpacing {
                row_mm: 0.5,
                col_mm: 0.25
            })
        );
        assert_eq!(PixelSpacing::from_values(&[0.5]), None);
        assert_eq!(PixelSpacing::from_values(&[0.0, 0.3]), None);
    }

    #[test]
    fn empty_geometry_has_no_size() {
        assert_eq!(ImageGeometry::new(0, 512).size(), None);
        assert_eq!(ImageGeometry::new(640, 480).size(), Some((640, 480)));
    }
}
