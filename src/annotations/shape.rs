use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::ImagePoint;

/// Extent below which a freshly drawn shape is considered a click, not a
/// gesture.
const MIN_EXTENT: f32 = 1e-3;

/// Stable identity of a shape, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u64);

impl ShapeId {
    /// Identity used for the uncommitted shape drawn during a gesture.
    pub const PREVIEW: ShapeId = ShapeId(0);

    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Line,
    Circle,
    Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineShape {
    pub id: ShapeId,
    pub start: ImagePoint,
    pub end: ImagePoint,
}

/// Circle stored as its centre and one point on the rim, so dragging the
/// centre preserves both radius and the rim handle's direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleShape {
    pub id: ShapeId,
    pub center: ImagePoint,
    pub rim: ImagePoint,
}

/// Axis-aligned rectangle. `min <= max` on both axes once normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectShape {
    pub id: ShapeId,
    pub min: ImagePoint,
    pub max: ImagePoint,
}

/// An annotation, in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Line(LineShape),
    Circle(CircleShape),
    Rect(RectShape),
}

impl CircleShape {
    /// Radius in image pixels.
    pub fn radius(&self) -> f32 {
        (self.rim.x - self.center.x).hypot(self.rim.y - self.center.y)
    }
}

impl RectShape {
    pub fn from_corners(id: ShapeId, a: ImagePoint, b: ImagePoint) -> Self {
        Self {
            id,
            min: ImagePoint::new(a.x.min(b.x), a.y.min(b.y)),
            max: ImagePoint::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Restores `min <= max`, reporting which axes had to be swapped.
    pub fn normalize(&mut self) -> (bool, bool) {
        let swap_x = self.min.x > self.max.x;
        let swap_y = self.min.y > self.max.y;
        if swap_x {
            std::mem::swap(&mut self.min.x, &mut self.max.x);
        }
        if swap_y {
            std::mem::swap(&mut self.min.y, &mut self.max.y);
        }
        (swap_x, swap_y)
    }
}

impl Shape {
    pub fn line(start: ImagePoint, end: ImagePoint) -> Self {
        Shape::Line(LineShape {
            id: ShapeId::next(),
            start,
            end,
        })
    }

    pub fn circle(center: ImagePoint, rim: ImagePoint) -> Self {
        Shape::Circle(CircleShape {
            id: ShapeId::next(),
            center,
            rim,
        })
    }

    pub fn rect(a: ImagePoint, b: ImagePoint) -> Self {
        Shape::Rect(RectShape::from_corners(ShapeId::next(), a, b))
    }

    pub fn id(&self) -> ShapeId {
        match self {
            Shape::Line(line) => line.id,
            Shape::Circle(circle) => circle.id,
            Shape::Rect(rect) => rect.id,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Line(_) => ShapeKind::Line,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Rect(_) => ShapeKind::Rect,
        }
    }

    pub fn with_id(mut self, id: ShapeId) -> Self {
        match &mut self {
            Shape::Line(line) => line.id = id,
            Shape::Circle(circle) => circle.id = id,
            Shape::Rect(rect) => rect.id = id,
        }
        self
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            Shape::Line(line) => {
                line.start = line.start.offset(dx, dy);
                line.end = line.end.offset(dx, dy);
            }
            Shape::Circle(circle) => {
                circle.center = circle.center.offset(dx, dy);
                circle.rim = circle.rim.offset(dx, dy);
            }
            Shape::Rect(rect) => {
                rect.min = rect.min.offset(dx, dy);
                rect.max = rect.max.offset(dx, dy);
            }
        }
    }

    /// True for shapes with no measurable extent, e.g. a click without drag.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Shape::Line(line) => {
                (line.end.x - line.start.x).hypot(line.end.y - line.start.y) < MIN_EXTENT
            }
            Shape::Circle(circle) => circle.radius() < MIN_EXTENT,
            Shape::Rect(rect) => rect.width() < MIN_EXTENT || rect.height() < MIN_EXTENT,
        }
    }
}
