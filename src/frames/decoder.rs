use crate::dataset::DatasetHandle;
use crate::error::Result;
use crate::image_pipeline::{FramePipeline, RenderedFrame, WindowLevel};

/// Turns a frame index into a displayable raster.
///
/// Implementations must be pure per `(index, window)`: the provider may call
/// `decode` for the same input more than once under contention.
pub trait FrameDecoder: Send + Sync + 'static {
    fn frame_count(&self) -> u32;

    fn decode(&self, index: u32, window: Option<WindowLevel>) -> Result<RenderedFrame>;
}

/// Decodes frames out of a loaded DICOM dataset.
pub struct DicomFrameDecoder {
    dataset: DatasetHandle,
    frame_count: u32,
    dataset_window: Option<WindowLevel>,
}

impl DicomFrameDecoder {
    pub fn new(dataset: DatasetHandle) -> Self {
        let frame_count = dataset.frame_count();
        let dataset_window = dataset.default_window();
        Self {
            dataset,
            frame_count,
            dataset_window,
        }
    }
}

impl FrameDecoder for DicomFrameDecoder {
    fn frame_count(&self) -> u32 {
        self.frame_count
    }

    fn decode(&self, index: u32, window: Option<WindowLevel>) -> Result<RenderedFrame> {
        FramePipeline::render(
            self.dataset.object(),
            index,
            window.or(self.dataset_window),
        )
    }
}
