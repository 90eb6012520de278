pub mod compare;
pub mod dicom_entry;
pub mod loader;

pub use compare::{compare_metadata, ComparisonRow};
pub use dicom_entry::{DicomEntry, DicomView, MetadataRow};
