//! Pointer drag lifecycle: Idle <-> Dragging, one captured pointer at a time.

use crate::layout::Position;
use glam::DVec2;

pub type PointerId = i32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    pub pointer_id: PointerId,
    pub position: Position,
}

impl PointerInput {
    pub fn new(pointer_id: PointerId, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            position: DVec2::new(x, y),
        }
    }
}

/// Exclusive input session: once a pointer is captured, its move/up events
/// are routed to the capturing session only.
pub trait InputCapture {
    /// Try to capture `pointer_id`. `false` means another session owns input.
    fn capture(&mut self, pointer_id: PointerId) -> bool;
    fn release(&mut self, pointer_id: PointerId);
    fn has_capture(&self, pointer_id: PointerId) -> bool;
}

/// Software capture for hosts without native pointer capture: a single
/// active-session slot shared by every control that takes part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExclusiveSession {
    active: Option<PointerId>,
}

impl ExclusiveSession {
    pub fn active(&self) -> Option<PointerId> {
        self.active
    }
}

impl InputCapture for ExclusiveSession {
    fn capture(&mut self, pointer_id: PointerId) -> bool {
        match self.active {
            Some(current) if current != pointer_id => false,
            _ => {
                self.active = Some(pointer_id);
                true
            }
        }
    }

    fn release(&mut self, pointer_id: PointerId) {
        if self.active == Some(pointer_id) {
            self.active = None;
        }
    }

    fn has_capture(&self, pointer_id: PointerId) -> bool {
        self.active == Some(pointer_id)
    }
}

/// Where the drag started.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub pointer_id: PointerId,
    pub start_pointer: Position,
    pub start_position: Position,
}

impl DragSession {
    /// Start position moved by the pointer travel since pointer-down.
    #[inline]
    pub fn position_for(&self, pointer: Position) -> Position {
        self.start_position + (pointer - self.start_pointer)
    }
}

/// Axis-aligned clamp region supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragBounds {
    pub min: Position,
    pub max: Position,
}

impl DragBounds {
    #[inline]
    pub fn clamp(&self, p: Position) -> Position {
        p.clamp(self.min.min(self.max), self.max.max(self.min))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragEvent {
    Started,
    Moved(Position),
    Ended,
    Ignored,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DragMachine {
    state: DragState,
    bounds: Option<DragBounds>,
}

impl DragMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn set_bounds(&mut self, bounds: Option<DragBounds>) {
        self.bounds = bounds;
    }

    pub fn pointer_down(
        &mut self,
        input: PointerInput,
        current: Position,
        capture: &mut dyn InputCapture,
    ) -> DragEvent {
        if self.is_dragging() {
            return DragEvent::Ignored;
        }
        if !capture.capture(input.pointer_id) {
            log::debug!("[drag] pointer {} refused: input owned elsewhere", input.pointer_id);
            return DragEvent::Ignored;
        }
        self.state = DragState::Dragging(DragSession {
            pointer_id: input.pointer_id,
            start_pointer: input.position,
            start_position: current,
        });
        log::debug!("[drag] begin pointer {} at ({:.1},{:.1})", input.pointer_id, input.position.x, input.position.y);
        DragEvent::Started
    }

    pub fn pointer_move(&mut self, input: PointerInput) -> DragEvent {
        match self.state {
            DragState::Dragging(session) if session.pointer_id == input.pointer_id => {
                let mut next = session.position_for(input.position);
                if let Some(bounds) = &self.bounds {
                    next = bounds.clamp(next);
                }
                DragEvent::Moved(next)
            }
            _ => DragEvent::Ignored,
        }
    }

    /// Pointer-up and pointer-cancel end the session the same way.
    pub fn pointer_up(&mut self, input: PointerInput, capture: &mut dyn InputCapture) -> DragEvent {
        match self.state {
            DragState::Dragging(session) if session.pointer_id == input.pointer_id => {
                if capture.has_capture(session.pointer_id) {
                    capture.release(session.pointer_id);
                }
                self.state = DragState::Idle;
                log::debug!("[drag] end pointer {}", input.pointer_id);
                DragEvent::Ended
            }
            _ => DragEvent::Ignored,
        }
    }

    /// Drop any session, releasing its capture.
    pub fn reset(&mut self, capture: &mut dyn InputCapture) {
        if let DragState::Dragging(session) = self.state {
            capture.release(session.pointer_id);
        }
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_is_delta_additive() {
        let mut capture = ExclusiveSession::default();
        let mut drag = DragMachine::new();
        let down = drag.pointer_down(PointerInput::new(1, 100.0, 100.0), DVec2::new(50.0, 50.0), &mut capture);
        assert_eq!(down, DragEvent::Started);
        assert_eq!(
            drag.pointer_move(PointerInput::new(1, 130.0, 115.0)),
            DragEvent::Moved(DVec2::new(80.0, 65.0))
        );
    }

    #[test]
    fn other_pointers_are_ignored_while_dragging() {
        let mut capture = ExclusiveSession::default();
        let mut drag = DragMachine::new();
        drag.pointer_down(PointerInput::new(1, 0.0, 0.0), DVec2::ZERO, &mut capture);
        assert_eq!(
            drag.pointer_down(PointerInput::new(2, 5.0, 5.0), DVec2::ZERO, &mut capture),
            DragEvent::Ignored
        );
        assert_eq!(drag.pointer_move(PointerInput::new(2, 9.0, 9.0)), DragEvent::Ignored);
        assert_eq!(drag.pointer_up(PointerInput::new(2, 9.0, 9.0), &mut capture), DragEvent::Ignored);
        assert!(drag.is_dragging());
        assert!(capture.has_capture(1));
    }

    #[test]
    fn up_releases_capture_and_stops_moves() {
        let mut capture = ExclusiveSession::default();
        let mut drag = DragMachine::new();
        drag.pointer_down(PointerInput::new(7, 0.0, 0.0), DVec2::ZERO, &mut capture);
        assert_eq!(drag.pointer_up(PointerInput::new(7, 1.0, 1.0), &mut capture), DragEvent::Ended);
        assert_eq!(capture.active(), None);
        assert_eq!(drag.pointer_move(PointerInput::new(7, 4.0, 4.0)), DragEvent::Ignored);
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn capture_held_elsewhere_blocks_drag() {
        // A sub-control (e.g. a slider) already owns pointer 3.
        let mut capture = ExclusiveSession::default();
        assert!(capture.capture(3));
        let mut drag = DragMachine::new();
        assert_eq!(
            drag.pointer_down(PointerInput::new(4, 0.0, 0.0), DVec2::ZERO, &mut capture),
            DragEvent::Ignored
        );
        assert!(!drag.is_dragging());
    }

    #[test]
    fn bounds_clamp_moves() {
        let mut capture = ExclusiveSession::default();
        let mut drag = DragMachine::new();
        drag.set_bounds(Some(DragBounds {
            min: DVec2::ZERO,
            max: DVec2::new(100.0, 100.0),
        }));
        drag.pointer_down(PointerInput::new(1, 50.0, 50.0), DVec2::new(50.0, 50.0), &mut capture);
        assert_eq!(
            drag.pointer_move(PointerInput::new(1, 500.0, -20.0)),
            DragEvent::Moved(DVec2::new(100.0, 0.0))
        );
    }

    #[test]
    fn reset_releases() {
        let mut capture = ExclusiveSession::default();
        let mut drag = DragMachine::new();
        drag.pointer_down(PointerInput::new(1, 0.0, 0.0), DVec2::ZERO, &mut capture);
        drag.reset(&mut capture);
        assert!(!drag.is_dragging());
        assert_eq!(capture.active(), None);
    }
}
