pub mod cache;
pub mod decoder;
pub mod provider;

pub use cache::FrameCache;
pub use decoder::{DicomFrameDecoder, FrameDecoder};
pub use provider::FrameProvider;
