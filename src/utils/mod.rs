pub mod formatting;

pub use formatting::{format_tag, frame_label, value_to_string};
