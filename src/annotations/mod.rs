pub mod measure;
pub mod shape;
pub mod store;

pub use hit_test::{apply_drag, Corner, Edge, Handle, HitTestEngine, HotHandle};
pub use measure::{measure, Measurement, MeasurementUnit};
pub use shape::{CircleShape, LineShape, RectShape, Shape, ShapeId, ShapeKind};
pub use store::{ImageKey, ShapeStore, SubscriptionId};
