//! Mouse/touch unification into a single stroke protocol.
//!
//! Pointer events arrive in page (client) coordinates; the container origin is
//! subtracted to get logical surface coordinates. Only one pointer drives the
//! surface at a time: the first mouse button press or the primary touch.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// One touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Stable identifier for the lifetime of the contact.
    pub id: u64,
    pub position: Point,
}

impl TouchPoint {
    pub fn new(id: u64, position: Point) -> Self {
        Self { id, position }
    }
}

/// Raw pointer events from the host.
///
/// Touch events carry the contacts currently on the surface, in the order
/// the host reports them; the first one is the primary contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEvent {
    MouseDown { position: Point, button: MouseButton },
    MouseMove { position: Point },
    MouseUp { position: Point, button: MouseButton },
    /// The cursor left the surface bounds.
    MouseLeave,
    TouchStart { touches: Vec<TouchPoint> },
    TouchMove { touches: Vec<TouchPoint> },
    /// `touches` are the contacts still down after the change.
    TouchEnd { touches: Vec<TouchPoint> },
    TouchCancel,
}

/// What the stroke renderer should do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeCommand {
    Begin(Point),
    Extend(Point),
    End,
}

/// Pointer currently driving a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActivePointer {
    Mouse,
    Touch(u64),
}

/// Tracks which pointer owns the stroke in progress.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    active: Option<ActivePointer>,
    /// Last translated pointer position in logical coordinates.
    pointer_position: Option<Point>,
}

impl InputState {
    /// Create a new input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a pointer currently owns a stroke.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Last known pointer position in logical coordinates.
    pub fn pointer_position(&self) -> Option<Point> {
        self.pointer_position
    }

    /// Forget the active pointer, e.g. after the surface was cleared mid-gesture.
    pub fn reset(&mut self) {
        self.active = None;
    }

    /// Translate a pointer event, given the container's page-space origin.
    pub fn handle_pointer_event(
        &mut self,
        event: &PointerEvent,
        container_origin: Point,
    ) -> Option<StrokeCommand> {
        let offset = container_origin.to_vec2();
        let local = |p: Point| -> Point { p - offset };

        match event {
            PointerEvent::MouseDown { position, button } => {
                if *button != MouseButton::Left || self.active.is_some() {
                    return None;
                }
                self.active = Some(ActivePointer::Mouse);
                Some(StrokeCommand::Begin(self.track(local(*position))))
            }
            PointerEvent::MouseMove { position } => {
                let position = self.track(local(*position));
                (self.active == Some(ActivePointer::Mouse)).then_some(StrokeCommand::Extend(position))
            }
            PointerEvent::MouseUp { position, button } => {
                if *button != MouseButton::Left {
                    return None;
                }
                self.track(local(*position));
                self.finish(ActivePointer::Mouse)
            }
            PointerEvent::MouseLeave => self.finish(ActivePointer::Mouse),
            PointerEvent::TouchStart { touches } => {
                if self.active.is_some() {
                    // Extra contacts never start a second stroke.
                    return None;
                }
                let primary = touches.first()?;
                self.active = Some(ActivePointer::Touch(primary.id));
                Some(StrokeCommand::Begin(self.track(local(primary.position))))
            }
            PointerEvent::TouchMove { touches } => {
                let Some(ActivePointer::Touch(id)) = self.active else {
                    return None;
                };
                let touch = touches.iter().find(|t| t.id == id)?;
                Some(StrokeCommand::Extend(self.track(local(touch.position))))
            }
            PointerEvent::TouchEnd { touches } => {
                let Some(ActivePointer::Touch(id)) = self.active else {
                    return None;
                };
                if touches.iter().any(|t| t.id == id) {
                    // A secondary contact lifted; the primary is still drawing.
                    return None;
                }
                self.active = None;
                Some(StrokeCommand::End)
            }
            PointerEvent::TouchCancel => match self.active {
                Some(ActivePointer::Touch(_)) => {
                    self.active = None;
                    Some(StrokeCommand::End)
                }
                _ => None,
            },
        }
    }

    fn track(&mut self, position: Point) -> Point {
        self.pointer_position = Some(position);
        position
    }

    fn finish(&mut self, pointer: ActivePointer) -> Option<StrokeCommand> {
        if self.active == Some(pointer) {
            self.active = None;
            Some(StrokeCommand::End)
        } else {
            None
        }
    }
}
