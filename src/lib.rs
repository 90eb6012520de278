//! Frame pipeline, view transform and annotation engine of the Cinescope
//! DICOM viewer.

pub mod annotations;
pub mod config;
pub mod dataset;
pub mod error;
pub mod frames;
pub mod geometry;
pub mod image_pipeline;
pub mod input;
pub mod tools;
pub mod viewer;

pub use config::ViewerConfig;
pub use error::PipelineError;
