//! The single pointer event type every platform adapter produces.

use crate::geometry::ScreenPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Buttons held down at the time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerButtons {
    pub primary: bool,
    pub secondary: bool,
    pub middle: bool,
}

impl PointerButtons {
    pub fn contains(self, button: PointerButton) -> bool {
        match button {
            PointerButton::Primary => self.primary,
            PointerButton::Secondary => self.secondary,
            PointerButton::Middle => self.middle,
        }
    }

    pub fn set(&mut self, button: PointerButton, down: bool) {
        match button {
            PointerButton::Primary => self.primary = down,
            PointerButton::Secondary => self.secondary = down,
            PointerButton::Middle => self.middle = down,
        }
    }

    pub fn any(self) -> bool {
        self.primary || self.secondary || self.middle
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEventKind {
    Pressed(PointerButton),
    Moved,
    Released(PointerButton),
    /// Scroll in wheel lines; positive scrolls up (zooms in).
    Wheel(f32),
}

/// A pointer event in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: ScreenPoint,
    pub buttons: PointerButtons,
}

impl PointerEvent {
    pub fn pressed(button: PointerButton, position: ScreenPoint) -> Self {
        let mut buttons = PointerButtons::default();
        buttons.set(button, true);
        Self {
            kind: PointerEventKind::Pressed(button),
            position,
            buttons,
        }
    }

    pub fn moved(position: ScreenPoint, buttons: PointerButtons) -> Self {
        Self {
            kind: PointerEventKind::Moved,
            position,
            buttons,
        }
    }

    pub fn released(button: PointerButton, position: ScreenPoint) -> Self {
        Self {
            kind: PointerEventKind::Released(button),
            position,
            buttons: PointerButtons::default(),
        }
    }

    pub fn wheel(lines: f32, position: ScreenPoint) -> Self {
        Self {
            kind: PointerEventKind::Wheel(lines),
            position,
            buttons: PointerButtons::default(),
        }
    }
}
