//! Canonical pointer input.
//!
//! Pointer and touch sources are normalized here, once, into [`InputEvent`].
//! Nothing downstream knows which API produced an event.

use telestrator_protocol::Point;

/// Input device class. Pens win pointer arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

impl PointerKind {
    /// Map a `pointerType` string; unknown types are treated as mouse.
    pub fn from_pointer_type(pointer_type: &str) -> Self {
        match pointer_type {
            "pen" => PointerKind::Pen,
            "touch" => PointerKind::Touch,
            _ => PointerKind::Mouse,
        }
    }

    pub fn is_pen(self) -> bool {
        self == PointerKind::Pen
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPhase {
    Down,
    Move,
    Up,
    Leave,
    Out,
    Cancel,
}

impl InputPhase {
    /// Phases that end a stroke.
    pub fn is_stop(self) -> bool {
        matches!(
            self,
            InputPhase::Up | InputPhase::Leave | InputPhase::Out | InputPhase::Cancel
        )
    }
}

/// One touch point of a touch event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub identifier: i64,
    pub page: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub pointer_id: i64,
    pub kind: PointerKind,
    pub phase: InputPhase,
    /// Page-space samples, oldest first. Never empty.
    pub samples: Vec<Point>,
}

impl InputEvent {
    /// Build from a pointer event. `coalesced` holds the high-frequency
    /// samples delivered with it; when empty the event position is used.
    pub fn from_pointer(
        pointer_id: i64,
        pointer_type: &str,
        phase: InputPhase,
        position: Point,
        coalesced: Vec<Point>,
    ) -> Self {
        let samples = if coalesced.is_empty() {
            vec![position]
        } else {
            coalesced
        };
        Self {
            pointer_id,
            kind: PointerKind::from_pointer_type(pointer_type),
            phase,
            samples,
        }
    }

    /// Build from a touch event. Only single-touch frames are drawn; they are
    /// treated as pen input so a stylus on touch-only browsers keeps priority.
    ///
    /// Pass the active touches for start/move and the changed touches for end.
    pub fn from_touch(phase: InputPhase, touches: &[Touch]) -> Option<Self> {
        let [touch] = touches else {
            return None;
        };
        // Identifier 0 is remapped so it never collides with "no pointer"
        let pointer_id = if touch.identifier == 0 {
            1
        } else {
            touch.identifier
        };
        Some(Self {
            pointer_id,
            kind: PointerKind::Pen,
            phase,
            samples: vec![touch.page],
        })
    }

    /// The most recent sample.
    pub fn position(&self) -> Point {
        self.samples.last().copied().unwrap_or_default()
    }
}
