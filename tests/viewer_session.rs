use std::sync::Arc;

use cinescope::annotations::{Corner, Handle, HotHandle, ImageKey, Shape, ShapeKind, ShapeStore};
use cinescope::dataset::DatasetHandle;
use cinescope::error::Result;
use cinescope::frames::{FrameDecoder, FrameProvider};
use cinescope::geometry::{ImageGeometry, ImagePoint, ScreenPoint};
use cinescope::image_pipeline::{RenderedFrame, WindowLevel};
use cinescope::input::{PointerButton, PointerButtons, PointerEvent};
use cinescope::tools::{ToolKind, ToolOutcome};
use cinescope::viewer::{AttachedDataset, FrameSink, ViewerSession};
use cinescope::ViewerConfig;
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};

const UID: &str = "1.2.840.99.7";

/// Frames shaded by their index, or by the window centre once one is set.
struct Shaded {
    frames: u32,
}

impl FrameDecoder for Shaded {
    fn frame_count(&self) -> u32 {
        self.frames
    }

    fn decode(&self, index: u32, window: Option<WindowLevel>) -> Result<RenderedFrame> {
        let shade = window.map_or(index as u8, |window| window.center as u8);
        Ok(RenderedFrame {
            width: 100,
            height: 100,
            rgba: [shade, shade, shade, 255].repeat(100 * 100),
        })
    }
}

/// A 5-frame 100×100 dataset in a 200×200 viewport: screen = image × 2.
fn session() -> (ViewerSession, Arc<ShapeStore>) {
    let config = ViewerConfig {
        prefetch_ahead: 0,
        ..ViewerConfig::default()
    };
    let mut session = ViewerSession::new(&config);
    session.set_viewport(200.0, 200.0);
    session.attach_frames(AttachedDataset {
        instance_uid: UID.to_string(),
        provider: FrameProvider::new(Shaded { frames: 5 }, &config),
        geometry: Some(ImageGeometry::new(100, 100)),
        default_window: None,
    });
    (session, Arc::new(ShapeStore::new()))
}

fn at(x: f32, y: f32) -> ScreenPoint {
    ScreenPoint::new(x, y)
}

fn held(button: PointerButton) -> PointerButtons {
    let mut buttons = PointerButtons::default();
    buttons.set(button, true);
    buttons
}

fn drag(
    session: &mut ViewerSession,
    store: &ShapeStore,
    button: PointerButton,
    from: ScreenPoint,
    to: ScreenPoint,
) -> ToolOutcome {
    session.handle_pointer(PointerEvent::pressed(button, from), store);
    session.handle_pointer(PointerEvent::moved(to, held(button)), store);
    session.handle_pointer(PointerEvent::released(button, to), store)
}

fn shade(session: &ViewerSession) -> Option<u8> {
    session.current_frame().map(|frame| frame.rgba[0])
}

#[test]
fn attaching_shows_the_first_frame() {
    let (session, _) = session();
    assert!(session.is_attached());
    assert_eq!(session.frame_count(), 5);
    assert_eq!(session.current_index(), 0);
    assert_eq!(shade(&session), Some(0));
    assert_eq!(session.current_key(), Some(ImageKey::new(UID, 0)));
    assert_eq!(session.transform().image_size(), Some((100, 100)));
}

#[test]
fn stepping_wraps_around_the_loop() {
    let (mut session, _) = session();

    assert!(session.step(-1));
    assert_eq!(session.current_index(), 4);
    assert_eq!(shade(&session), Some(4));

    assert!(session.step(2));
    assert_eq!(session.current_index(), 1);
    assert_eq!(shade(&session), Some(1));

    assert!(!session.show_frame(5));
    assert_eq!(session.current_index(), 1);
}

#[test]
fn secondary_drag_adjusts_the_window() {
    let (mut session, store) = session();
    assert_eq!(session.window(), None);

    session.handle_pointer(
        PointerEvent::pressed(PointerButton::Secondary, at(100.0, 100.0)),
        &store,
    );
    let outcome = session.handle_pointer(
        PointerEvent::moved(at(110.0, 90.0), held(PointerButton::Secondary)),
        &store,
    );
    assert_eq!(
        outcome,
        ToolOutcome::WindowLevel {
            d_center: -10.0,
            d_width: 10.0
        }
    );

    let window = session.window().expect("window set by the drag");
    assert_eq!(window, WindowLevel::new(118.0, 266.0));
    assert_eq!(shade(&session), Some(118));

    session.set_window(None);
    assert_eq!(session.window(), None);
    assert_eq!(shade(&session), Some(0));
}

#[test]
fn drawing_commits_a_shape_on_the_displayed_frame() {
    let (mut session, store) = session();
    session.set_tool(ToolKind::Rect);

    let outcome = drag(
        &mut session,
        &store,
        PointerButton::Primary,
        at(60.0, 80.0),
        at(20.0, 20.0),
    );
    let ToolOutcome::Committed(id) = outcome else {
        panic!("expected a committed shape, got {outcome:?}");
    };
    assert_eq!(session.tools().tool(), ToolKind::Cursor);

    let key = ImageKey::new(UID, 0);
    let shapes = store.snapshot(&key);
    assert_eq!(shapes.len(), 1);
    let Shape::Rect(rect) = shapes[0] else {
        panic!("expected a rect, got {:?}", shapes[0]);
    };
    assert_eq!(rect.id, id);
    assert_eq!(rect.min, ImagePoint::new(10.0, 10.0));
    assert_eq!(rect.max, ImagePoint::new(30.0, 40.0));

    session.step(1);
    assert_eq!(store.len(&ImageKey::new(UID, 1)), 0);
    assert_eq!(store.len(&key), 1);
}

#[test]
fn zero_extent_gesture_commits_nothing() {
    let (mut session, store) = session();
    session.set_tool(ToolKind::Circle);

    let outcome = drag(
        &mut session,
        &store,
        PointerButton::Primary,
        at(50.0, 50.0),
        at(50.0, 50.0),
    );
    assert_eq!(outcome, ToolOutcome::Redraw);
    assert_eq!(store.len(&ImageKey::new(UID, 0)), 0);
}

#[test]
fn cursor_tool_edits_committed_shapes() {
    let (mut session, store) = session();
    session.set_tool(ToolKind::Rect);
    let ToolOutcome::Committed(id) = drag(
        &mut session,
        &store,
        PointerButton::Primary,
        at(20.0, 20.0),
        at(60.0, 80.0),
    ) else {
        panic!("rect was not committed");
    };

    session.handle_pointer(
        PointerEvent::moved(at(61.0, 79.0), PointerButtons::default()),
        &store,
    );
    assert_eq!(
        session.tools().hot(),
        Some(HotHandle {
            kind: ShapeKind::Rect,
            shape: id,
            handle: Handle::RectCorner(Corner::BottomRight),
        })
    );

    drag(
        &mut session,
        &store,
        PointerButton::Primary,
        at(60.0, 80.0),
        at(80.0, 100.0),
    );
    let key = ImageKey::new(UID, 0);
    let Some(Shape::Rect(rect)) = store.find(&key, id) else {
        panic!("rect vanished");
    };
    assert_eq!(rect.min, ImagePoint::new(10.0, 10.0));
    assert_eq!(rect.max, ImagePoint::new(40.0, 50.0));
}

#[test]
fn panning_is_clamped_until_zoomed_in() {
    let (mut session, store) = session();

    drag(
        &mut session,
        &store,
        PointerButton::Middle,
        at(100.0, 100.0),
        at(150.0, 100.0),
    );
    assert_eq!(session.transform().translation(), ScreenPoint::default());

    session.handle_pointer(PointerEvent::wheel(5.0, at(100.0, 100.0)), &store);
    assert!(session.transform().zoom() > 1.0);
    drag(
        &mut session,
        &store,
        PointerButton::Middle,
        at(100.0, 100.0),
        at(110.0, 100.0),
    );
    assert_eq!(session.transform().translation(), at(10.0, 0.0));

    session.reset_view();
    assert_eq!(session.transform().zoom(), 1.0);
}

#[test]
fn detaching_clears_the_viewer() {
    let (mut session, _) = session();
    session.detach_frames();

    assert!(!session.is_attached());
    assert_eq!(session.frame_count(), 0);
    assert!(session.current_frame().is_none());
    assert_eq!(session.current_key(), None);
    assert!(!session.step(1));
}

/// A dataset with no SOPInstanceUID element, identified only by its file meta.
fn unnamed_dataset(meta_uid: &str) -> DatasetHandle {
    let meta = FileMetaTableBuilder::new()
        .transfer_syntax("1.2.840.10008.1.2.1")
        .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
        .media_storage_sop_instance_uid(meta_uid)
        .build()
        .expect("valid file meta");
    DatasetHandle::new(InMemDicomObject::new_empty().with_exact_meta(meta))
}

#[test]
fn datasets_without_sop_uid_get_distinct_keys() {
    let config = ViewerConfig::default();
    let mut session = ViewerSession::new(&config);

    let first = unnamed_dataset("1.2.3.111");
    session.attach_frames(AttachedDataset::from_dataset(&first, &config));
    let first_key = session.current_key().expect("attached");

    let second = unnamed_dataset("1.2.3.222");
    session.attach_frames(AttachedDataset::from_dataset(&second, &config));
    let second_key = session.current_key().expect("attached");

    assert_eq!(first_key, ImageKey::new("1.2.3.111", 0));
    assert_eq!(second_key, ImageKey::new("1.2.3.222", 0));
    assert_ne!(first_key, second_key);

    // Shapes drawn on one never show up on the other.
    let store = ShapeStore::new();
    store.add(&first_key, Shape::line(ImagePoint::new(1.0, 1.0), ImagePoint::new(5.0, 5.0)));
    assert_eq!(store.len(&second_key), 0);
}
