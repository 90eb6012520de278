use std::fmt;

use crate::annotations::hit_test::{apply_drag, HitTestEngine, HotHandle};
use crate::annotations::shape::{Shape, ShapeId};
use crate::annotations::store::{ImageKey, ShapeStore};
use crate::config::ViewerConfig;
use crate::geometry::{ImagePoint, ScreenPoint};
use crate::input::{PointerButton, PointerEvent, PointerEventKind};
use crate::viewer::transform::ViewTransform;

/// Modality units of window centre/width per screen pixel of drag.
const WINDOW_UNITS_PER_PIXEL: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ToolKind {
    /// Select and edit existing shapes; pan, zoom and window elsewhere.
    #[default]
    Cursor,
    Measure,
    Rect,
    Circle,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Cursor,
        ToolKind::Measure,
        ToolKind::Rect,
        ToolKind::Circle,
    ];

    pub fn is_drawing(self) -> bool {
        !matches!(self, ToolKind::Cursor)
    }

    fn shape(self, start: ImagePoint, end: ImagePoint) -> Option<Shape> {
        match self {
            ToolKind::Cursor => None,
            ToolKind::Measure => Some(Shape::line(start, end)),
            ToolKind::Rect => Some(Shape::rect(start, end)),
            ToolKind::Circle => Some(Shape::circle(start, end)),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ToolKind::Cursor => "Cursor",
            ToolKind::Measure => "Measure",
            ToolKind::Rect => "Rect",
            ToolKind::Circle => "Circle",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Interaction {
    Idle,
    Editing {
        hot: HotHandle,
        last: ImagePoint,
    },
    Drawing {
        start: ImagePoint,
        current: ImagePoint,
    },
    Panning {
        button: PointerButton,
        last: ScreenPoint,
    },
    Windowing {
        last: ScreenPoint,
    },
}

/// What the caller should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolOutcome {
    Ignored,
    Redraw,
    /// Shift the VOI window by the given deltas.
    WindowLevel { d_center: f64, d_width: f64 },
    /// A drawing gesture produced a new shape.
    Committed(ShapeId),
}

/// Everything a tool may read or change while handling one event.
pub struct ToolContext<'a> {
    pub transform: &'a mut ViewTransform,
    pub store: &'a ShapeStore,
    /// The image currently displayed; `None` disables annotation.
    pub key: Option<&'a ImageKey>,
}

/// Pointer state machine of one viewer.
#[derive(Debug, Clone)]
pub struct ToolController {
    tool: ToolKind,
    interaction: Interaction,
    hover: Option<HotHandle>,
    engine: HitTestEngine,
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}

impl ToolController {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            tool: ToolKind::Cursor,
            interaction: Interaction::Idle,
            hover: None,
            engine: HitTestEngine::new(config),
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
        self.cancel();
    }

    /// Drops any gesture in progress without committing it.
    pub fn cancel(&mut self) {
        self.interaction = Interaction::Idle;
        self.hover = None;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.interaction, Interaction::Idle)
    }

    /// Handle being dragged, or else the one under the pointer.
    pub fn hot(&self) -> Option<HotHandle> {
        match self.interaction {
            Interaction::Editing { hot, .. } => Some(hot),
            _ => self.hover,
        }
    }

    /// The uncommitted shape of a drawing gesture in progress.
    pub fn preview(&self) -> Option<Shape> {
        match self.interaction {
            Interaction::Drawing { start, current } => self
                .tool
                .shape(start, current)
                .map(|shape| shape.with_id(ShapeId::PREVIEW)),
            _ => None,
        }
    }

    pub fn handle(&mut self, event: PointerEvent, ctx: ToolContext<'_>) -> ToolOutcome {
        match event.kind {
            PointerEventKind::Pressed(button) => self.on_press(button, event.position, ctx),
            PointerEventKind::Moved => self.on_move(event.position, ctx),
            PointerEventKind::Released(button) => self.on_release(button, event.position, ctx),
            PointerEventKind::Wheel(lines) => {
                ctx.transform.zoom_by_wheel(event.position, lines);
                ToolOutcome::Redraw
            }
        }
    }

    fn on_press(
        &mut self,
        button: PointerButton,
        position: ScreenPoint,
        ctx: ToolContext<'_>,
    ) -> ToolOutcome {
        if !self.is_idle() {
            return ToolOutcome::Ignored;
        }
        self.hover = None;

        match button {
            PointerButton::Secondary => {
                self.interaction = Interaction::Windowing { last: position };
                ToolOutcome::Ignored
            }
            PointerButton::Middle => {
                self.interaction = Interaction::Panning {
                    button,
                    last: position,
                };
                ToolOutcome::Ignored
            }
            PointerButton::Primary if self.tool.is_drawing() => {
                let Some(start) = ctx
                    .key
                    .and_then(|_| ctx.transform.screen_to_image(position))
                else {
                    return ToolOutcome::Ignored;
                };
                self.interaction = Interaction::Drawing {
                    start,
                    current: start,
                };
                ToolOutcome::Redraw
            }
            PointerButton::Primary => {
                let transform = &*ctx.transform;
                let grabbed = ctx.key.and_then(|key| {
                    let shapes = ctx.store.snapshot(key);
                    let hot = self.engine.hit_test(position, &shapes, transform)?;
                    let last = transform.screen_to_image(position)?;
                    Some((hot, last))
                });

                match grabbed {
                    Some((hot, last)) => {
                        self.interaction = Interaction::Editing { hot, last };
                        ToolOutcome::Redraw
                    }
                    None => {
                        self.interaction = Interaction::Panning {
                            button,
                            last: position,
                        };
                        ToolOutcome::Ignored
                    }
                }
            }
        }
    }

    fn on_move(&mut self, position: ScreenPoint, ctx: ToolContext<'_>) -> ToolOutcome {
        match self.interaction {
            Interaction::Idle => self.update_hover(position, ctx),
            Interaction::Editing { hot, last } => {
                let (Some(key), Some(now)) = (ctx.key, ctx.transform.screen_to_image(position))
                else {
                    return ToolOutcome::Ignored;
                };
                let next = ctx
                    .store
                    .update(key, hot.shape, |shape| apply_drag(shape, hot.handle, last, now));
                match next {
                    Some(handle) => {
                        self.interaction = Interaction::Editing {
                            hot: HotHandle { handle, ..hot },
                            last: now,
                        };
                    }
                    None => {
                        log::debug!("Shape {:?} vanished during drag", hot.shape);
                        self.interaction = Interaction::Idle;
                    }
                }
                ToolOutcome::Redraw
            }
            Interaction::Drawing { start, .. } => {
                let Some(current) = ctx.transform.screen_to_image(position) else {
                    return ToolOutcome::Ignored;
                };
                self.interaction = Interaction::Drawing { start, current };
                ToolOutcome::Redraw
            }
            Interaction::Panning { button, last } => {
                ctx.transform.pan_by(position.x - last.x, position.y - last.y);
                self.interaction = Interaction::Panning {
                    button,
                    last: position,
                };
                ToolOutcome::Redraw
            }
            Interaction::Windowing { last } => {
                self.interaction = Interaction::Windowing { last: position };
                ToolOutcome::WindowLevel {
                    d_center: f64::from(position.y - last.y) * WINDOW_UNITS_PER_PIXEL,
                    d_width: f64::from(position.x - last.x) * WINDOW_UNITS_PER_PIXEL,
                }
            }
        }
    }

    fn on_release(
        &mut self,
        button: PointerButton,
        position: ScreenPoint,
        ctx: ToolContext<'_>,
    ) -> ToolOutcome {
        match self.interaction {
            Interaction::Editing { .. } if button == PointerButton::Primary => {
                self.interaction = Interaction::Idle;
                ToolOutcome::Redraw
            }
            Interaction::Drawing { start, current } if button == PointerButton::Primary => {
                self.interaction = Interaction::Idle;
                let tool = self.tool;
                self.tool = ToolKind::Cursor;

                let end = ctx.transform.screen_to_image(position).unwrap_or(current);
                match (ctx.key, tool.shape(start, end)) {
                    (Some(key), Some(shape)) if !shape.is_degenerate() => {
                        let id = shape.id();
                        ctx.store.add(key, shape);
                        log::debug!("Committed {tool} shape {id:?} on {key}");
                        ToolOutcome::Committed(id)
                    }
                    _ => ToolOutcome::Redraw,
                }
            }
            Interaction::Panning { button: held, .. } if held == button => {
                self.interaction = Interaction::Idle;
                ToolOutcome::Ignored
            }
            Interaction::Windowing { .. } if button == PointerButton::Secondary => {
                self.interaction = Interaction::Idle;
                ToolOutcome::Ignored
            }
            _ => ToolOutcome::Ignored,
        }
    }

    fn update_hover(&mut self, position: ScreenPoint, ctx: ToolContext<'_>) -> ToolOutcome {
        if self.tool.is_drawing() {
            return ToolOutcome::Ignored;
        }
        let transform = &*ctx.transform;
        let hover = ctx.key.and_then(|key| {
            let shapes = ctx.store.snapshot(key);
            self.engine.hit_test(position, &shapes, transform)
        });
        if hover == self.hover {
            ToolOutcome::Ignored
        } else {
            self.hover = hover;
            ToolOutcome::Redraw
        }
    }
}
