use cinescope::dataset::DatasetHandle;
use cinescope::geometry::ImageGeometry;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DicomView {
    pub file_path: PathBuf,
    pub metadata: Vec<MetadataRow>,
    pub frame_count: u32,
    pub geometry: Option<ImageGeometry>,
}

impl DicomView {
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub tag: String,
    pub vr: String,
    pub alias: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct DicomEntry {
    pub patient_id: String,
    pub sop_instance_uid: String,
    pub dataset: DatasetHandle,
    pub view: DicomView,
}
