//! Shared handle to a parsed DICOM object plus the few attributes the viewer
//! needs outside the metadata table.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dicom::object::{open_file, DefaultDicomObject};

use crate::geometry::{ImageGeometry, PixelSpacing};
use crate::image_pipeline::WindowLevel;

/// Numbers datasets that carry no instance UID at all.
static UNIDENTIFIED: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
pub struct DatasetHandle {
    object: Arc<DefaultDicomObject>,
    instance_uid: String,
}

impl DatasetHandle {
    /// Wraps a parsed object. Its identity is the SOPInstanceUID, then the
    /// MediaStorageSOPInstanceUID of the file meta group, then a number unique
    /// to this load.
    pub fn new(object: DefaultDicomObject) -> Self {
        let instance_uid = element_text(&object, "SOPInstanceUID")
            .or_else(|| {
                let uid = clean(object.meta().media_storage_sop_instance_uid());
                (!uid.is_empty()).then(|| uid.to_string())
            })
            .unwrap_or_else(|| {
                let number = UNIDENTIFIED.fetch_add(1, Ordering::Relaxed);
                log::warn!("Dataset has no SOP instance UID; using local identity {number}");
                format!("local-{number}")
            });

        Self {
            object: Arc::new(object),
            instance_uid,
        }
    }

    pub fn open(path: &Path) -> Result<Self, String> {
        open_file(path)
            .map(Self::new)
            .map_err(|err| format!("{}: failed to open DICOM file ({err})", path.display()))
    }

    pub fn object(&self) -> &DefaultDicomObject {
        &self.object
    }

    /// Identity of this instance; distinct for every loaded dataset that
    /// lacks a UID.
    pub fn instance_uid(&self) -> &str {
        &self.instance_uid
    }

    pub fn text(&self, name: &str) -> Option<String> {
        element_text(&self.object, name)
    }

    fn uint(&self, name: &str) -> Option<u32> {
        self.object
            .element_by_name(name)
            .ok()
            .and_then(|element| element.to_int::<u32>().ok())
    }

    fn floats(&self, name: &str) -> Vec<f64> {
        self.object
            .element_by_name(name)
            .ok()
            .and_then(|element| element.to_multi_float64().ok())
            .unwrap_or_default()
    }

    /// `NumberOfFrames`, defaulting to a single frame when the attribute is
    /// absent. Datasets without pixel data report zero.
    pub fn frame_count(&self) -> u32 {
        if self.object.element_by_name("PixelData").is_err() {
            return 0;
        }
        self.uint("NumberOfFrames").unwrap_or(1)
    }

    pub fn geometry(&self) -> Option<ImageGeometry> {
        let columns = self.uint("Columns")?;
        let rows = self.uint("Rows")?;
        let geometry = ImageGeometry::new(columns, rows)
            .with_spacing(PixelSpacing::from_values(&self.floats("PixelSpacing")));
        geometry.size().map(|_| geometry)
    }

    /// First window stored in the dataset, if any.
    pub fn default_window(&self) -> Option<WindowLevel> {
        let center = self.floats("WindowCenter").first().copied()?;
        let width = self.floats("WindowWidth").first().copied()?;
        Some(WindowLevel::new(center, width))
    }
}

impl fmt::Debug for DatasetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetHandle")
            .field("instance_uid", &self.instance_uid)
            .finish_non_exhaustive()
    }
}

fn element_text(object: &DefaultDicomObject, name: &str) -> Option<String> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| clean(&value).to_string())
        .filter(|value| !value.is_empty())
}

/// Strips the space and NUL padding of DICOM strings.
fn clean(value: &str) -> &str {
    value.trim_matches(|c: char| c == '\0' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom::core::{DataElement, PrimitiveValue, VR};
    use dicom::dictionary_std::tags;
    use dicom::object::{FileMetaTableBuilder, InMemDicomObject};

    fn dataset(meta_uid: &str, sop_uid: Option<&str>) -> DatasetHandle {
        let meta = FileMetaTableBuilder::new()
            .transfer_syntax("1.2.840.10008.1.2.1")
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid(meta_uid)
            .build()
            .expect("valid file meta");
        let mut object = InMemDicomObject::new_empty().with_exact_meta(meta);
        if let Some(uid) = sop_uid {
            object.put(DataElement::new(
                tags::SOP_INSTANCE_UID,
                VR::UI,
                PrimitiveValue::from(uid),
            ));
        }
        DatasetHandle::new(object)
    }

    #[test]
    fn sop_instance_uid_is_the_identity() {
        let handle = dataset("1.2.3.111", Some("1.2.3.999\0"));
        assert_eq!(handle.instance_uid(), "1.2.3.999");
    }

    #[test]
    fn meta_uid_stands_in_for_a_missing_sop_uid() {
        let first = dataset("1.2.3.111", None);
        let second = dataset("1.2.3.222", None);
        assert_eq!(first.instance_uid(), "1.2.3.111");
        assert_eq!(second.instance_uid(), "1.2.3.222");
        assert_eq!(first.frame_count(), 0);
    }

    #[test]
    fn datasets_without_any_uid_are_told_apart() {
        let first = dataset("", None);
        let second = dataset("", None);
        assert!(first.instance_uid().starts_with("local-"));
        assert_ne!(first.instance_uid(), second.instance_uid());
    }
}
