pub mod image_canvas;
pub mod instance_list;
pub mod metadata_panel;

pub use image_canvas::{image_canvas, ImageCanvas};
pub use instance_list::instance_list;
pub use metadata_panel::metadata_panel;
