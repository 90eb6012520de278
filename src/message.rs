use crate::model::DicomEntry;
use cinescope::input::PointerEvent;
use cinescope::tools::ToolKind;

#[derive(Debug, Clone)]
pub enum Message {
    PickFiles,
    FilesLoaded(Vec<Result<DicomEntry, String>>),
    SelectInstance(usize),
    /// Pin an instance as the right-hand side of the metadata comparison.
    PinForCompare(Option<usize>),
    SetTool(ToolKind),
    /// A pointer event on the image canvas, with the canvas size at the time.
    Pointer {
        event: PointerEvent,
        viewport: (f32, f32),
    },
    StepFrame(i64),
    ToggleCine,
    CineTick,
    ResetView,
    ResetWindow,
    ClearAnnotations,
}
