//! Free pan-and-zoom over panes scattered in 3D, wrapping at the edges.
//!
//! The field box is the union of every pane's extent. Panning never clamps:
//! each pane's rendered coordinate is wrapped independently per axis,
//!
//! ```text
//! v = wrap(offset + pane_position, min − buffer, max + buffer)
//! ```
//!
//! so a pane pushed off one edge comes back from the opposite one. X and Y
//! share one buffer, which makes the wrap periodic in `max − min + 2·buffer`.
//! Depth uses a per-pane buffer that grows with the pane's own depth.
//! Panes fade and blur as they near a wrap edge to hide the seam.

use std::any::Any;

use statig::blocking::{IntoStateMachineExt, StateMachine};
use tracing::trace;

use crate::config::{FieldMotion, MotionConfig};
use crate::drag::DragTracker;
use crate::math::{Axis, Size, Vec2, Vec3, clamp, wrap};
use crate::state_machine::motion_sm::{MotionEvent, MotionMachine, State as MotionState};
use crate::widget::{AttachCx, FrameCx, InputCx, Widget, WidgetCore};
use crate::widgets::pane::Pane;

struct Placed {
    pane: Pane,
    position: Vec3,
}

/// Axis-aligned box spanned by the panes, before buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub min: Vec3,
    pub max: Vec3,
}

/// One pane's wrapped placement for the current offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub opacity: f64,
    pub blur: f64,
}

pub struct PaneField {
    core: WidgetCore,
    motion: FieldMotion,
    panes: Vec<Placed>,
    offset: Vec3,
    target: Vec3,
    machine: StateMachine<MotionMachine>,
    drag: DragTracker,
    drag_start: Vec3,
    /// Screen-space box from the last frame, for wheel hit checks.
    screen_box: Option<(Vec2, Vec2)>,
}

impl Default for PaneField {
    fn default() -> Self {
        Self::new()
    }
}

impl PaneField {
    pub fn new() -> Self {
        Self {
            core: WidgetCore::default(),
            motion: FieldMotion::default(),
            panes: Vec::new(),
            offset: Vec3::ZERO,
            target: Vec3::ZERO,
            machine: MotionMachine::new("field").state_machine(),
            drag: DragTracker::new(),
            drag_start: Vec3::ZERO,
            screen_box: None,
        }
    }

    /// Place `pane` at `position` inside the field.
    pub fn add_pane(&mut self, pane: Pane, position: Vec3) {
        self.panes.push(Placed { pane, position });
    }

    pub fn with_pane(mut self, pane: Pane, position: Vec3) -> Self {
        self.add_pane(pane, position);
        self
    }

    pub fn len(&self) -> usize {
        self.panes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Jump both offset and target, e.g. to restore a saved view.
    pub fn set_offset(&mut self, offset: Vec3) {
        self.offset = offset;
        self.target = offset;
    }

    pub fn motion_state(&self) -> &MotionState {
        self.machine.state()
    }

    pub fn is_settled(&self) -> bool {
        self.machine.state().is_idle()
    }

    pub fn bounds(&self) -> Option<FieldBounds> {
        let first = self.panes.first()?;
        let mut min = first.position;
        let mut max = first.position;

        for placed in &self.panes {
            let size = placed.pane.size();
            let p = placed.position;
            min = Vec3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Vec3::new(
                max.x.max(p.x + size.width),
                max.y.max(p.y + size.height),
                max.z.max(p.z),
            );
        }

        Some(FieldBounds { min, max })
    }

    /// Pan distance after which X/Y placements repeat.
    pub fn period(&self) -> Vec2 {
        match self.bounds() {
            Some(b) => {
                let buffer = 2.0 * self.motion.edge_buffer;
                Vec2::new(b.max.x - b.min.x + buffer, b.max.y - b.min.y + buffer)
            }
            None => Vec2::ZERO,
        }
    }

    fn wrap_window(&self, bounds: &FieldBounds, axis: Axis, depth: f64) -> (f64, f64) {
        let buffer = match axis {
            Axis::X | Axis::Y => self.motion.edge_buffer,
            Axis::Z => self.motion.edge_buffer + depth.abs() * self.motion.depth_buffer_ratio,
        };
        (bounds.min.get(axis) - buffer, bounds.max.get(axis) + buffer)
    }

    /// Wrapped position, opacity and blur of every pane, in insertion order.
    pub fn placements(&self) -> Vec<Placement> {
        let Some(bounds) = self.bounds() else { return Vec::new() };

        self.panes
            .iter()
            .map(|placed| {
                let size = placed.pane.size();
                let extent = Vec3::new(size.width, size.height, 0.0);
                let mut position = Vec3::ZERO;
                let mut edge_distance = f64::INFINITY;

                for axis in Axis::ALL {
                    let (lo, hi) = self.wrap_window(&bounds, axis, placed.position.z);
                    let v = wrap(self.offset.get(axis) + placed.position.get(axis), lo, hi);
                    position.set(axis, v);

                    let near = (v - lo).min(hi - (v + extent.get(axis)));
                    edge_distance = edge_distance.min(near.max(0.0));
                }

                let opacity = if self.motion.fade_distance > 0.0 {
                    clamp(edge_distance / self.motion.fade_distance, 0.0, 1.0)
                } else {
                    1.0
                };

                Placement {
                    position,
                    opacity,
                    blur: (1.0 - opacity) * self.motion.max_blur,
                }
            })
            .collect()
    }

    fn step(&mut self, dt: f64) {
        if matches!(self.machine.state(), MotionState::Idle {} | MotionState::Dragging {}) {
            return;
        }

        self.offset = self.offset.lerp(self.target, (dt * self.motion.ease_rate).min(1.0));

        if (self.offset - self.target).length() < self.motion.settle_distance {
            self.offset = self.target;
            self.machine.handle(&MotionEvent::Settled);
        }
    }
}

impl Widget for PaneField {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn measure(&self) -> Size {
        match self.bounds() {
            Some(b) => Size::new(b.max.x - b.min.x, b.max.y - b.min.y),
            None => Size::ZERO,
        }
    }

    fn attach(&mut self, cx: &mut AttachCx<'_>) {
        self.motion = cx.config.field.clone();
        cx.listen_document();
    }

    fn tick(&mut self, cx: &mut FrameCx<'_>) {
        self.step(cx.dt);

        let root = self.core.position() + cx.origin;
        self.screen_box = self.bounds().map(|b| {
            let lo = root + b.min;
            let hi = root + b.max;
            (lo.xy(), hi.xy())
        });

        for (i, (placed, placement)) in self.panes.iter().zip(self.placements()).enumerate() {
            let draw = placed
                .pane
                .draw(root + placement.position, self.core.rotation)
                .faded(placement.opacity, placement.blur);
            cx.emit(i, draw);
        }
    }

    fn pointer_down(&mut self, part: usize, pointer: Vec2, _cx: &mut InputCx<'_>) -> bool {
        if part >= self.panes.len() {
            return false;
        }
        self.drag.begin(pointer);
        self.drag_start = self.offset;
        self.machine.handle(&MotionEvent::Grab);
        true
    }

    fn pointer_move(&mut self, pointer: Vec2, _cx: &mut InputCx<'_>) {
        if let Some(motion) = self.drag.move_to(pointer) {
            self.offset.x = self.drag_start.x + motion.total.x;
            self.offset.y = self.drag_start.y + motion.total.y;
            self.target.x = self.offset.x;
            self.target.y = self.offset.y;
        }
    }

    fn pointer_up(&mut self, _pointer: Vec2, _cx: &mut InputCx<'_>) {
        let Some(last) = self.drag.end() else { return };
        self.target.x += last.x * self.motion.momentum;
        self.target.y += last.y * self.motion.momentum;
        self.machine.handle(&MotionEvent::Release { coast: !last.is_zero() });
    }

    /// Zoom when the pointer is over the field.
    fn wheel(&mut self, delta: Vec2, pointer: Vec2, _cx: &mut InputCx<'_>) -> bool {
        let Some((lo, hi)) = self.screen_box else { return false };
        if pointer.x < lo.x || pointer.x > hi.x || pointer.y < lo.y || pointer.y > hi.y {
            return false;
        }

        self.target.z -= delta.y * self.motion.zoom_gain;
        trace!(target: "field", depth = self.target.z, "zoom");
        self.machine.handle(&MotionEvent::Retarget);
        true
    }

    fn reconfigure(&mut self, config: &MotionConfig) {
        self.motion = config.field.clone();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
