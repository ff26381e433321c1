//! Pointer drag tracking.
//!
//! A [`DragTracker`] turns pointer down/move/up into a drag-start position,
//! per-move deltas and a smoothed "last delta" for release momentum. A move
//! that reports a zero delta on an axis (some devices emit these at the start
//! of a gesture) leaves that axis of the last delta untouched.

use crate::math::Vec2;

/// Distance in pixels under which a press-release counts as a tap.
pub const TAP_THRESHOLD: f64 = 5.0;

/// One pointer move during an active drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragMotion {
    /// Frame-to-frame movement.
    pub delta: Vec2,
    /// Most recent non-zero movement per axis.
    pub last_delta: Vec2,
    /// Movement since the drag started.
    pub total: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct DragTracker {
    dragging: bool,
    start: Vec2,
    previous: Vec2,
    last_delta: Vec2,
    furthest: f64,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the drag origin. Returns the zero delta handed to start hooks.
    pub fn begin(&mut self, pointer: Vec2) -> Vec2 {
        self.dragging = true;
        self.start = pointer;
        self.previous = pointer;
        self.last_delta = Vec2::ZERO;
        self.furthest = 0.0;
        Vec2::ZERO
    }

    /// Track a move. `None` when no drag is active.
    pub fn move_to(&mut self, pointer: Vec2) -> Option<DragMotion> {
        if !self.dragging {
            return None;
        }

        let delta = pointer - self.previous;
        if delta.x != 0.0 {
            self.last_delta.x = delta.x;
        }
        if delta.y != 0.0 {
            self.last_delta.y = delta.y;
        }
        self.previous = pointer;

        let total = pointer - self.start;
        self.furthest = self.furthest.max(total.length());

        Some(DragMotion {
            delta,
            last_delta: self.last_delta,
            total,
        })
    }

    /// Finish the drag. Returns the last non-zero delta for momentum, or
    /// `None` when no drag was active.
    pub fn end(&mut self) -> Option<Vec2> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        let last = self.last_delta;
        self.last_delta = Vec2::ZERO;
        Some(last)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn start(&self) -> Vec2 {
        self.start
    }

    /// Whether the pointer stayed within `threshold` of the start point for
    /// the whole gesture, so a following click counts as a tap.
    pub fn is_tap(&self, pointer: Vec2, threshold: f64) -> bool {
        self.furthest.max((pointer - self.start).length()) < threshold
    }
}
