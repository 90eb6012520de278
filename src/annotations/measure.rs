use std::f64::consts::PI;
use std::fmt;

use crate::annotations::shape::Shape;
use crate::geometry::PixelSpacing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementUnit {
    Millimeters,
    Pixels,
    SquareMillimeters,
    SquarePixels,
}

impl MeasurementUnit {
    fn suffix(self) -> &'static str {
        match self {
            MeasurementUnit::Millimeters => "mm",
            MeasurementUnit::Pixels => "px",
            MeasurementUnit::SquareMillimeters => "mm²",
            MeasurementUnit::SquarePixels => "px²",
        }
    }
}

/// Label value for a shape: length for lines, area for circles and rects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub unit: MeasurementUnit,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} {}", self.value, self.unit.suffix())
    }
}

/// Measures `shape`, in millimetres when the pixel spacing is known and in
/// pixels otherwise.
pub fn measure(shape: &Shape, spacing: Option<PixelSpacing>) -> Measurement {
    match shape {
        Shape::Line(line) => {
            let dx = f64::from(line.end.x - line.start.x);
            let dy = f64::from(line.end.y - line.start.y);
            match spacing {
                Some(spacing) => Measurement {
                    value: (dx * spacing.col_mm).hypot(dy * spacing.row_mm),
                    unit: MeasurementUnit::Millimeters,
                },
                None => Measurement {
                    value: dx.hypot(dy),
                    unit: MeasurementUnit::Pixels,
                },
            }
        }
        Shape::Circle(circle) => {
            let radius = f64::from(circle.radius());
            area(PI * radius * radius, spacing)
        }
        Shape::Rect(rect) => area(f64::from(rect.width()) * f64::from(rect.height()), spacing),
    }
}

fn area(square_pixels: f64, spacing: Option<PixelSpacing>) -> Measurement {
    match spacing {
        Some(spacing) => Measurement {
            value: square_pixels * spacing.row_mm * spacing.col_mm,
            unit: MeasurementUnit::SquareMillimeters,
        },
        None => Measurement {
            value: square_pixels,
            unit: MeasurementUnit::SquarePixels,
        },
    }
}
