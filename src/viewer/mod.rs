pub mod session;
pub mod transform;

pub use session::{AttachedDataset, FrameSink, ViewerSession};
pub use transform::{ScreenRect, ViewTransform};
