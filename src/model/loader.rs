use super::{DicomEntry, DicomView, MetadataRow};
use crate::utils::{format_tag, value_to_string};
use cinescope::dataset::DatasetHandle;
use dicom::core::dictionary::DataDictionary;
use dicom::core::header::Header;
use dicom::dictionary_std::StandardDataDictionary;
use std::path::PathBuf;

pub fn load_dicom(path: PathBuf) -> Result<DicomEntry, String> {
    log::info!("Loading DICOM file: {}", path.display());
    let dataset = DatasetHandle::open(&path).map_err(|message| {
        log::error!("{message}");
        message
    })?;

    let metadata = dataset
        .object()
        .iter()
        .map(|element| {
            let tag = element.tag();
            let vr = element.vr();
            MetadataRow {
                tag: format_tag(tag),
                vr: vr.to_string().to_owned(),
                alias: StandardDataDictionary
                    .by_tag(tag)
                    .map(|entry| entry.alias)
                    .unwrap_or("Unknown")
                    .to_string(),
                value: value_to_string(element.value(), vr),
            }
        })
        .collect();

    let frame_count = dataset.frame_count();
    let geometry = dataset.geometry();
    if frame_count > 0 && geometry.is_none() {
        log::warn!(
            "{}: pixel data without Rows/Columns; annotations are disabled",
            path.display()
        );
    }

    Ok(DicomEntry {
        patient_id: dataset
            .text("PatientID")
            .unwrap_or_else(|| "Unknown".to_string()),
        sop_instance_uid: dataset.instance_uid().to_string(),
        view: DicomView {
            file_path: path,
            metadata,
            frame_count,
            geometry,
        },
        dataset,
    })
}
