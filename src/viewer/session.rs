use std::sync::Arc;

use crate::annotations::store::{ImageKey, ShapeStore};
use crate::config::ViewerConfig;
use crate::dataset::DatasetHandle;
use crate::frames::{DicomFrameDecoder, FrameProvider};
use crate::geometry::ImageGeometry;
use crate::image_pipeline::{RenderedFrame, WindowLevel};
use crate::input::PointerEvent;
use crate::tools::{ToolContext, ToolController, ToolKind, ToolOutcome};
use crate::viewer::transform::ViewTransform;

/// Starting point for window/level drags on datasets that store no window.
const FALLBACK_WINDOW: WindowLevel = WindowLevel {
    center: 128.0,
    width: 256.0,
};

/// A dataset ready for display: its frames and the metadata the viewer needs.
pub struct AttachedDataset {
    pub instance_uid: String,
    pub provider: FrameProvider,
    pub geometry: Option<ImageGeometry>,
    pub default_window: Option<WindowLevel>,
}

impl AttachedDataset {
    pub fn from_dataset(dataset: &DatasetHandle, config: &ViewerConfig) -> Self {
        let instance_uid = dataset.instance_uid().to_string();
        let geometry = dataset.geometry();
        let default_window = dataset.default_window();
        let provider = FrameProvider::new(DicomFrameDecoder::new(dataset.clone()), config);

        log::info!(
            "Attaching {instance_uid}: {} frame(s), geometry {:?}",
            provider.frame_count(),
            geometry.and_then(|geometry| geometry.size())
        );

        Self {
            instance_uid,
            provider,
            geometry,
            default_window,
        }
    }
}

/// Anything that can display the frames of a loaded dataset.
pub trait FrameSink {
    fn attach_frames(&mut self, dataset: AttachedDataset);

    /// Releases the attached dataset, stopping its prefetch worker.
    fn detach_frames(&mut self);
}

/// State of one image viewer: the attached frames, the frame on screen, and
/// the zoom/pan and tool state used to interact with it.
pub struct ViewerSession {
    dataset: Option<AttachedDataset>,
    transform: ViewTransform,
    tools: ToolController,
    current_index: u32,
    frame: Option<Arc<RenderedFrame>>,
    window: Option<WindowLevel>,
}

impl ViewerSession {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            dataset: None,
            transform: ViewTransform::new(config),
            tools: ToolController::new(config),
            current_index: 0,
            frame: None,
            window: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn frame_count(&self) -> u32 {
        self.dataset
            .as_ref()
            .map_or(0, |dataset| dataset.provider.frame_count())
    }

    pub fn current_index(&self) -> u32 {
        self.current_index
    }

    /// The frame on screen; `None` when nothing is attached or it failed to
    /// decode.
    pub fn current_frame(&self) -> Option<&Arc<RenderedFrame>> {
        self.frame.as_ref()
    }

    pub fn current_key(&self) -> Option<ImageKey> {
        self.dataset
            .as_ref()
            .map(|dataset| ImageKey::new(dataset.instance_uid.clone(), self.current_index))
    }

    pub fn geometry(&self) -> Option<ImageGeometry> {
        self.dataset.as_ref().and_then(|dataset| dataset.geometry)
    }

    pub fn window(&self) -> Option<WindowLevel> {
        self.window
            .or_else(|| self.dataset.as_ref().and_then(|dataset| dataset.default_window))
    }

    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    pub fn tools(&self) -> &ToolController {
        &self.tools
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tools.set_tool(tool);
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.transform.set_viewport(width, height);
    }

    pub fn reset_view(&mut self) {
        self.transform.reset();
    }

    /// Displays frame `index` and queues the frames after it. Returns false
    /// for an out-of-range index, leaving the current frame on screen.
    pub fn show_frame(&mut self, index: u32) -> bool {
        let Some(dataset) = self.dataset.as_ref() else {
            return false;
        };
        if index >= dataset.provider.frame_count() {
            return false;
        }

        if index != self.current_index {
            self.tools.cancel();
        }
        self.current_index = index;
        self.frame = dataset.provider.get(index);
        dataset.provider.prefetch(index);
        true
    }

    /// Moves `delta` frames, wrapping around the ends of the loop.
    pub fn step(&mut self, delta: i64) -> bool {
        let count = i64::from(self.frame_count());
        if count == 0 {
            return false;
        }
        let next = (i64::from(self.current_index) + delta).rem_euclid(count);
        self.show_frame(next as u32)
    }

    /// Routes a pointer event through the active tool for the frame on
    /// screen and applies any window/level change it requests.
    pub fn handle_pointer(&mut self, event: PointerEvent, store: &ShapeStore) -> ToolOutcome {
        let key = self.current_key();
        let outcome = self.tools.handle(
            event,
            ToolContext {
                transform: &mut self.transform,
                store,
                key: key.as_ref(),
            },
        );

        if let ToolOutcome::WindowLevel { d_center, d_width } = outcome {
            let window = self.window().unwrap_or(FALLBACK_WINDOW);
            self.set_window(Some(window.adjusted(d_center, d_width)));
        }
        outcome
    }

    /// Re-renders with a new VOI window; `None` restores the dataset's own.
    pub fn set_window(&mut self, window: Option<WindowLevel>) {
        let Some(dataset) = self.dataset.as_ref() else {
            return;
        };
        self.window = window;
        dataset.provider.set_window(window);
        self.frame = dataset.provider.get(self.current_index);
    }
}

impl FrameSink for ViewerSession {
    fn attach_frames(&mut self, dataset: AttachedDataset) {
        self.detach_frames();
        self.transform
            .set_image_size(dataset.geometry.and_then(|geometry| geometry.size()));
        self.dataset = Some(dataset);
        self.show_frame(0);
    }

    fn detach_frames(&mut self) {
        if let Some(dataset) = self.dataset.take() {
            log::debug!("Detaching {}", dataset.instance_uid);
        }
        self.tools.cancel();
        self.transform.set_image_size(None);
        self.current_index = 0;
        self.frame = None;
        self.window = None;
    }
}
