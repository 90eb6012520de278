use crate::components::segmented_toggle;
use crate::message::Message;
use crate::model::loader::load_dicom;
use crate::model::DicomEntry;
use crate::utils::frame_label;
use crate::views::{image_canvas, instance_list, metadata_panel, ImageCanvas};
use cinescope::annotations::{ImageKey, ShapeStore, SubscriptionId};
use cinescope::image_pipeline::RenderedFrame;
use cinescope::tools::{ToolKind, ToolOutcome};
use cinescope::viewer::{AttachedDataset, FrameSink, ViewTransform, ViewerSession};
use cinescope::ViewerConfig;
use iced::keyboard::{self, key::Named, Key};
use iced::widget::canvas::Cache;
use iced::widget::image::Handle;
use iced::widget::text::Wrapping;
use iced::widget::{button, column, container, row, scrollable, text};
use iced::{application, Alignment, Element, Length, Subscription, Task, Theme};
use rfd::AsyncFileDialog;
use std::sync::{Arc, Mutex};

const APP_TITLE: &str = "Cinescope";

pub fn run() -> iced::Result {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .try_init();

    application(APP_TITLE, App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .run_with(App::new)
}

pub struct App {
    config: ViewerConfig,
    entries: Vec<DicomEntry>,
    selected_instance: Option<usize>,
    compare_with: Option<usize>,
    session: ViewerSession,
    shapes: Arc<ShapeStore>,
    /// Keys whose shapes changed since the last update, filled by the store.
    changed_keys: Arc<Mutex<Vec<ImageKey>>>,
    shapes_subscription: SubscriptionId,
    shown_frame: Option<Arc<RenderedFrame>>,
    frame_handle: Option<Handle>,
    scene: Cache,
    cine_playing: bool,
    last_error: Option<String>,
}

/// What the scene cache was last drawn from.
struct SceneInputs {
    frame: Option<Arc<RenderedFrame>>,
    transform: ViewTransform,
    key: Option<ImageKey>,
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let config = ViewerConfig::default();
        let shapes = Arc::new(ShapeStore::new());
        let changed_keys = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&changed_keys);
        let shapes_subscription = shapes.subscribe(move |key: &ImageKey| {
            if let Ok(mut keys) = sink.lock() {
                keys.push(key.clone());
            }
        });

        let app = Self {
            session: ViewerSession::new(&config),
            config,
            entries: Vec::new(),
            selected_instance: None,
            compare_with: None,
            shapes,
            changed_keys,
            shapes_subscription,
            shown_frame: None,
            frame_handle: None,
            scene: Cache::new(),
            cine_playing: false,
            last_error: None,
        };
        (app, Task::none())
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        let before = self.scene_inputs();
        let task = self.handle_message(message);
        self.refresh_scene(before);
        task
    }

    fn handle_message(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFiles => {
                return Task::perform(
                    async {
                        match AsyncFileDialog::new().pick_files().await {
                            Some(handles) if !handles.is_empty() => handles
                                .into_iter()
                                .map(|handle| load_dicom(handle.path().to_path_buf()))
                                .collect(),
                            _ => Vec::new(),
                        }
                    },
                    Message::FilesLoaded,
                );
            }
            Message::FilesLoaded(results) => {
                let mut errors = Vec::new();
                let mut last_loaded = None;
                for result in results {
                    match result {
                        Ok(entry) => {
                            last_loaded = Some(self.entries.len());
                            self.entries.push(entry);
                        }
                        Err(err) => errors.push(err),
                    }
                }

                if let Some(index) = last_loaded {
                    self.select(index);
                }
                self.last_error = (!errors.is_empty()).then(|| errors.join("\n"));
            }
            Message::SelectInstance(index) => {
                if index < self.entries.len() && self.selected_instance != Some(index) {
                    self.select(index);
                }
            }
            Message::PinForCompare(index) => {
                self.compare_with = index.filter(|index| *index < self.entries.len());
            }
            Message::SetTool(tool) => self.session.set_tool(tool),
            Message::Pointer { event, viewport } => {
                self.session.set_viewport(viewport.0, viewport.1);
                if let ToolOutcome::Committed(id) = self.session.handle_pointer(event, &self.shapes)
                {
                    log::info!("Annotation {} added", id.get());
                }
            }
            Message::StepFrame(delta) => {
                self.session.step(delta);
            }
            Message::ToggleCine => {
                self.cine_playing = !self.cine_playing && self.session.frame_count() > 1;
            }
            Message::CineTick => {
                if self.cine_playing {
                    self.session.step(1);
                }
            }
            Message::ResetView => self.session.reset_view(),
            Message::ResetWindow => self.session.set_window(None),
            Message::ClearAnnotations => {
                if let Some(key) = self.session.current_key() {
                    self.shapes.clear(&key);
                }
            }
        }
        Task::none()
    }

    fn select(&mut self, index: usize) {
        let Some(entry) = self.entries.get(index) else {
            return;
        };
        self.selected_instance = Some(index);
        self.cine_playing = false;

        if entry.view.frame_count == 0 {
            log::info!("{} has no pixel data", entry.view.file_name());
            self.session.detach_frames();
        } else {
            self.session
                .attach_frames(AttachedDataset::from_dataset(&entry.dataset, &self.config));
        }
    }

    fn scene_inputs(&self) -> SceneInputs {
        SceneInputs {
            frame: self.session.current_frame().cloned(),
            transform: self.session.transform().clone(),
            key: self.session.current_key(),
        }
    }

    /// Rebuilds the frame handle and invalidates the cached scene when the
    /// frame, the view or the displayed shapes changed.
    fn refresh_scene(&mut self, before: SceneInputs) {
        let after = self.scene_inputs();

        let frame_changed = match (&self.shown_frame, &after.frame) {
            (Some(shown), Some(current)) => !Arc::ptr_eq(shown, current),
            (None, None) => false,
            _ => true,
        };
        if frame_changed {
            self.frame_handle = after.frame.as_ref().map(|frame| {
                Handle::from_rgba(frame.width, frame.height, frame.rgba.clone())
            });
            self.shown_frame = after.frame.clone();
        }

        let changed_keys = match self.changed_keys.lock() {
            Ok(mut keys) => std::mem::take(&mut *keys),
            Err(_) => Vec::new(),
        };
        let shapes_changed = after
            .key
            .as_ref()
            .is_some_and(|key| changed_keys.contains(key));

        if frame_changed
            || shapes_changed
            || before.key != after.key
            || before.transform != after.transform
        {
            self.scene.clear();
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let keys = keyboard::on_key_press(|key, _modifiers| match key {
            Key::Named(Named::ArrowRight) | Key::Named(Named::ArrowDown) => {
                Some(Message::StepFrame(1))
            }
            Key::Named(Named::ArrowLeft) | Key::Named(Named::ArrowUp) => {
                Some(Message::StepFrame(-1))
            }
            Key::Named(Named::Space) => Some(Message::ToggleCine),
            Key::Named(Named::Escape) => Some(Message::SetTool(ToolKind::Cursor)),
            _ => None,
        });

        if self.cine_playing {
            Subscription::batch([
                keys,
                iced::time::every(self.config.cine_interval()).map(|_| Message::CineTick),
            ])
        } else {
            keys
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let pick_button = button("Import DICOM Files").on_press(Message::PickFiles);

        let list = container(scrollable(instance_list(
            &self.entries,
            self.selected_instance,
            self.compare_with,
        )))
        .padding(16)
        .width(Length::FillPortion(2));

        let selected_view = self
            .selected_instance
            .and_then(|index| self.entries.get(index))
            .map(|entry| &entry.view);
        let compare_view = self
            .compare_with
            .and_then(|index| self.entries.get(index))
            .map(|entry| &entry.view);

        let metadata = container(metadata_panel(
            selected_view,
            compare_view,
            self.entries.is_empty(),
        ))
        .padding(16)
        .width(Length::FillPortion(3));

        let viewer = container(self.viewer_panel())
            .padding(16)
            .width(Length::FillPortion(5))
            .height(Length::Fill);

        let mut content = column![row![list, viewer, metadata]
            .spacing(16)
            .width(Length::Fill)
            .height(Length::Fill)]
        .spacing(16);

        if let Some(error) = &self.last_error {
            content = content.push(text(error).size(16).wrapping(Wrapping::Word));
        }

        column![pick_button, content]
            .padding(20)
            .spacing(20)
            .align_x(Alignment::Start)
            .into()
    }

    fn viewer_panel(&self) -> Element<'_, Message> {
        if !self.session.is_attached() {
            let hint = if self.entries.is_empty() {
                "Import DICOM instances to view their frames"
            } else {
                "The selected instance has no frames to display"
            };
            return container(text(hint))
                .width(Length::Fill)
                .height(Length::Fill)
                .align_x(Alignment::Center)
                .align_y(Alignment::Center)
                .into();
        }

        let tools = segmented_toggle(&ToolKind::ALL, self.session.tools().tool(), Message::SetTool);

        let multiframe = self.session.frame_count() > 1;
        let playback = row![
            button("◀").on_press_maybe(multiframe.then_some(Message::StepFrame(-1))),
            button(if self.cine_playing { "Pause" } else { "Play" })
                .on_press_maybe(multiframe.then_some(Message::ToggleCine)),
            button("▶").on_press_maybe(multiframe.then_some(Message::StepFrame(1))),
            button("Reset View").on_press(Message::ResetView),
            button("Reset Window").on_press(Message::ResetWindow),
            button("Clear Annotations").on_press(Message::ClearAnnotations),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        let key = self.session.current_key();
        let canvas = image_canvas(ImageCanvas {
            frame: self.frame_handle.as_ref(),
            transform: self.session.transform(),
            shapes: key
                .as_ref()
                .map(|key| self.shapes.snapshot(key))
                .unwrap_or_default(),
            hot: self.session.tools().hot(),
            preview: self.session.tools().preview(),
            spacing: self
                .session
                .geometry()
                .and_then(|geometry| geometry.pixel_spacing),
            tool: self.session.tools().tool(),
            scene: &self.scene,
        });

        let mut status = format!(
            "{} · zoom {:.2}×",
            frame_label(self.session.current_index(), self.session.frame_count()),
            self.session.transform().zoom(),
        );
        if let Some(window) = self.session.window() {
            status.push_str(&format!(" · W {:.0} / L {:.0}", window.width, window.center));
        }
        if self.session.current_frame().is_none() {
            status.push_str(" · frame could not be decoded");
        }

        column![
            tools,
            playback,
            container(canvas)
                .width(Length::Fill)
                .height(Length::Fill)
                .clip(true),
            text(status).size(13),
        ]
        .spacing(10)
        .into()
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shapes.unsubscribe(self.shapes_subscription);
    }
}
