use crate::message::Message;
use cinescope::annotations::{measure, Corner, HotHandle, Shape};
use cinescope::geometry::{ImagePoint, PixelSpacing, ScreenPoint};
use cinescope::input::{PointerButton, PointerButtons, PointerEvent};
use cinescope::tools::ToolKind;
use cinescope::viewer::ViewTransform;
use iced::mouse;
use iced::widget::canvas::{self, event, Cache, Canvas, Frame, Geometry, LineDash, Path, Stroke};
use iced::widget::image::Handle;
use iced::{Color, Element, Length, Pixels, Point, Rectangle, Renderer, Size, Theme};

const BACKDROP: Color = Color::BLACK;
const SHAPE_COLOR: Color = Color::from_rgb(0.30, 0.85, 0.45);
const HOT_COLOR: Color = Color::from_rgb(1.0, 0.80, 0.20);
const PREVIEW_COLOR: Color = Color::from_rgb(0.45, 0.75, 1.0);
const LABEL_SIZE: f32 = 13.0;
const HANDLE_RADIUS: f32 = 4.0;
/// Trackpads report pixels; this many count as one wheel line.
const PIXELS_PER_WHEEL_LINE: f32 = 40.0;
const PREVIEW_DASH: [f32; 2] = [6.0, 4.0];

/// Everything the canvas needs to paint one frame of the viewer.
pub struct ImageCanvas<'a> {
    pub frame: Option<&'a Handle>,
    pub transform: &'a ViewTransform,
    pub shapes: Vec<Shape>,
    pub hot: Option<HotHandle>,
    pub preview: Option<Shape>,
    pub spacing: Option<PixelSpacing>,
    pub tool: ToolKind,
    /// Image and committed shapes; cleared by the app when any of them change.
    pub scene: &'a Cache,
}

pub fn image_canvas(program: ImageCanvas<'_>) -> Element<'_, Message> {
    Canvas::new(program)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

#[derive(Debug, Default)]
pub struct CanvasState {
    buttons: PointerButtons,
    last_position: Point,
}

impl canvas::Program<Message> for ImageCanvas<'_> {
    type State = CanvasState;

    fn update(
        &self,
        state: &mut CanvasState,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (event::Status, Option<Message>) {
        let canvas::Event::Mouse(mouse_event) = event else {
            return (event::Status::Ignored, None);
        };

        let inside = cursor.position_in(bounds);
        if let Some(position) = cursor.position_from(bounds.position()) {
            state.last_position = position;
        }

        let pointer = match mouse_event {
            mouse::Event::ButtonPressed(button) => {
                let (Some(button), Some(position)) = (pointer_button(button), inside) else {
                    return (event::Status::Ignored, None);
                };
                state.buttons.set(button, true);
                PointerEvent::pressed(button, screen_point(position))
            }
            mouse::Event::CursorMoved { .. } => {
                // Drags keep tracking outside the canvas; hover does not.
                let position = if state.buttons.any() {
                    Some(state.last_position)
                } else {
                    inside
                };
                let Some(position) = position else {
                    return (event::Status::Ignored, None);
                };
                PointerEvent::moved(screen_point(position), state.buttons)
            }
            mouse::Event::ButtonReleased(button) => {
                let Some(button) = pointer_button(button) else {
                    return (event::Status::Ignored, None);
                };
                if !state.buttons.contains(button) {
                    return (event::Status::Ignored, None);
                }
                state.buttons.set(button, false);
                PointerEvent::released(button, screen_point(state.last_position))
            }
            mouse::Event::WheelScrolled { delta } => {
                let Some(position) = inside else {
                    return (event::Status::Ignored, None);
                };
                let lines = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => y,
                    mouse::ScrollDelta::Pixels { y, .. } => y / PIXELS_PER_WHEEL_LINE,
                };
                PointerEvent::wheel(lines, screen_point(position))
            }
            _ => return (event::Status::Ignored, None),
        };

        (
            event::Status::Captured,
            Some(Message::Pointer {
                event: pointer,
                viewport: (bounds.width, bounds.height),
            }),
        )
    }

    fn draw(
        &self,
        _state: &CanvasState,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut transform = self.transform.clone();
        transform.set_viewport(bounds.width, bounds.height);

        let scene = self.scene.draw(renderer, bounds.size(), |frame| {
            frame.fill_rectangle(Point::ORIGIN, frame.size(), BACKDROP);

            if let (Some(handle), Some(rect)) = (self.frame, transform.image_rect()) {
                frame.draw_image(
                    Rectangle::new(Point::new(rect.x, rect.y), Size::new(rect.width, rect.height)),
                    canvas::Image::new(handle.clone()),
                );
            }

            for shape in &self.shapes {
                let stroke = Stroke::default().with_color(SHAPE_COLOR).with_width(1.5);
                draw_shape(frame, shape, &transform, stroke);
                draw_label(frame, shape, &transform, self.spacing, SHAPE_COLOR);
            }
        });

        let mut overlay = Frame::new(renderer, bounds.size());

        if let Some(hot) = self.hot {
            if let Some(shape) = self.shapes.iter().find(|shape| shape.id() == hot.shape) {
                let stroke = Stroke::default().with_color(HOT_COLOR).with_width(2.5);
                draw_shape(&mut overlay, shape, &transform, stroke);
                for anchor in anchors(shape) {
                    if let Some(point) = transform.image_to_screen(anchor) {
                        overlay.fill(&Path::circle(iced_point(point), HANDLE_RADIUS), HOT_COLOR);
                    }
                }
            }
        }

        if let Some(preview) = &self.preview {
            let stroke = Stroke {
                line_dash: LineDash {
                    segments: &PREVIEW_DASH,
                    offset: 0,
                },
                ..Stroke::default().with_color(PREVIEW_COLOR).with_width(1.5)
            };
            draw_shape(&mut overlay, preview, &transform, stroke);
            draw_label(&mut overlay, preview, &transform, self.spacing, PREVIEW_COLOR);
        }

        vec![scene, overlay.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        state: &CanvasState,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        let panning = state.buttons.primary && self.hot.is_none() && !self.tool.is_drawing();
        if state.buttons.middle || panning {
            mouse::Interaction::Grabbing
        } else if !cursor.is_over(bounds) {
            mouse::Interaction::default()
        } else if self.hot.is_some() {
            mouse::Interaction::Pointer
        } else if self.tool.is_drawing() {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::Idle
        }
    }
}

fn pointer_button(button: mouse::Button) -> Option<PointerButton> {
    match button {
        mouse::Button::Left => Some(PointerButton::Primary),
        mouse::Button::Right => Some(PointerButton::Secondary),
        mouse::Button::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

fn screen_point(point: Point) -> ScreenPoint {
    ScreenPoint::new(point.x, point.y)
}

fn iced_point(point: ScreenPoint) -> Point {
    Point::new(point.x, point.y)
}

fn draw_shape(frame: &mut Frame, shape: &Shape, transform: &ViewTransform, stroke: Stroke<'_>) {
    let to_screen = |point: ImagePoint| transform.image_to_screen(point).map(iced_point);

    let path = match shape {
        Shape::Line(line) => match (to_screen(line.start), to_screen(line.end)) {
            (Some(start), Some(end)) => Path::line(start, end),
            _ => return,
        },
        Shape::Circle(circle) => match (to_screen(circle.center), to_screen(circle.rim)) {
            (Some(center), Some(rim)) => Path::circle(center, center.distance(rim)),
            _ => return,
        },
        Shape::Rect(rect) => match (to_screen(rect.min), to_screen(rect.max)) {
            (Some(min), Some(max)) => Path::rectangle(min, Size::new(max.x - min.x, max.y - min.y)),
            _ => return,
        },
    };
    frame.stroke(&path, stroke);
}

fn draw_label(
    frame: &mut Frame,
    shape: &Shape,
    transform: &ViewTransform,
    spacing: Option<PixelSpacing>,
    color: Color,
) {
    let anchor = match shape {
        Shape::Line(line) => line.end,
        Shape::Circle(circle) => circle.rim,
        Shape::Rect(rect) => rect.max,
    };
    let Some(position) = transform.image_to_screen(anchor) else {
        return;
    };

    frame.fill_text(canvas::Text {
        content: measure(shape, spacing).to_string(),
        position: Point::new(position.x + 6.0, position.y + 4.0),
        color,
        size: Pixels(LABEL_SIZE),
        ..canvas::Text::default()
    });
}

/// Image-space points a handle can be grabbed at.
fn anchors(shape: &Shape) -> Vec<ImagePoint> {
    match shape {
        Shape::Line(line) => vec![line.start, line.end],
        Shape::Circle(circle) => vec![circle.center, circle.rim],
        Shape::Rect(rect) => Corner::ALL.iter().map(|corner| rect.corner(*corner)).collect(),
    }
}
