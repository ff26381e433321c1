//! The stage: root of the scene graph and the single frame coordinator.
//!
//! The stage owns every resident widget, the scroll/drag-driven `origin`
//! and its `target_origin`, the per-stage task [`Scheduler`], and the
//! document-level listener registry. One call to [`Stage::update`] per
//! display refresh runs, in order:
//!
//! 1. queued gesture events,
//! 2. scheduled tasks (tweens, app animations),
//! 3. `tick` on every widget against the current origin,
//! 4. origin easing toward the target (with range pull-back when idle).
//!
//! Input is fed in by the host through `pointer_*`, `click` and `wheel`,
//! synchronously and in arrival order.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};

use statig::blocking::{IntoStateMachineExt, StateMachine};
use tracing::{debug, info, trace};

use crate::animation::{Completion, Flow, Scheduler, TaskId, TweenConfig};
use crate::config::{MotionConfig, StageMotion};
use crate::debug::{DebugSink, NoopDebug};
use crate::drag::DragTracker;
use crate::gestures::GestureEvent;
use crate::math::{Axis, Color, Range, Size, Vec2, Vec3, lerp};
use crate::state_machine::origin_sm::{OriginEvent, OriginMachine, State as OriginState};
use crate::widget::{AttachCx, FrameCx, InputCx, NodeKey, RenderNode, RenderSink, Widget, WidgetId};

/// Hit tests ignore nodes fainter than this.
const HIT_MIN_OPACITY: f64 = 0.05;

/// A range-corrected target this close to its bound snaps onto it.
const RANGE_SNAP: f64 = 0.5;

// ---------------------------------------------------------------------------
// Options and input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageOptions {
    pub scrollable_x: bool,
    pub scrollable_y: bool,
    pub draggable_x: bool,
    pub draggable_y: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            scrollable_x: true,
            scrollable_y: true,
            draggable_x: false,
            draggable_y: false,
        }
    }
}

/// A pointer sample: position in viewport pixels, time in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub position: Vec2,
    pub time: f64,
}

impl Pointer {
    pub fn new(x: f64, y: f64, time: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            time,
        }
    }
}

/// Scrollable range per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ranges {
    pub x: Range,
    pub y: Range,
    pub z: Range,
}

impl Ranges {
    pub fn get(&self, axis: Axis) -> Range {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, range: Range) {
        match axis {
            Axis::X => self.x = range,
            Axis::Y => self.y = range,
            Axis::Z => self.z = range,
        }
    }
}

// ---------------------------------------------------------------------------
// Document listeners
// ---------------------------------------------------------------------------

/// Widgets that receive pointer move/up regardless of where the pointer
/// is. Entries live until their owner leaves the stage.
#[derive(Debug, Default)]
pub struct DocumentListeners {
    registered: Vec<WidgetId>,
}

impl DocumentListeners {
    pub fn add(&mut self, owner: WidgetId) {
        self.registered.push(owner);
    }

    /// Drop every registration held by `owner`. Returns how many went.
    pub fn remove_owner(&mut self, owner: WidgetId) -> usize {
        let before = self.registered.len();
        self.registered.retain(|w| *w != owner);
        before - self.registered.len()
    }

    /// Distinct owners in registration order.
    pub fn owners(&self) -> Vec<WidgetId> {
        let mut owners: Vec<WidgetId> = Vec::with_capacity(self.registered.len());
        for w in &self.registered {
            if !owners.contains(w) {
                owners.push(*w);
            }
        }
        owners
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scroll gate
// ---------------------------------------------------------------------------

/// Drops the trailing wheel events some trackpads emit as part of a drag
/// release.
///
/// After [`ScrollGate::suppress_next`], the next scroll action (a run of
/// wheel events with gaps no longer than the window) is ignored, provided
/// it starts within the window. A gap longer than the window always starts
/// a fresh, admitted action.
#[derive(Debug, Clone)]
pub struct ScrollGate {
    window: f64,
    last_wheel: Option<f64>,
    suppress_until: Option<f64>,
    suppressed: bool,
}

impl ScrollGate {
    pub fn new(window: f64) -> Self {
        Self {
            window,
            last_wheel: None,
            suppress_until: None,
            suppressed: false,
        }
    }

    pub fn set_window(&mut self, window: f64) {
        self.window = window;
    }

    pub fn suppress_next(&mut self, now: f64) {
        self.suppress_until = Some(now + self.window);
    }

    /// Whether a wheel event at `now` should move the stage.
    pub fn admit(&mut self, now: f64) -> bool {
        let is_new_action = self.last_wheel.is_none_or(|last| now - last > self.window);
        self.last_wheel = Some(now);

        if let Some(until) = self.suppress_until.take() {
            if now <= until {
                self.suppressed = true;
                return false;
            }
        }

        if is_new_action {
            self.suppressed = false;
        }

        !self.suppressed
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

struct Resident {
    id: WidgetId,
    widget: Box<dyn Widget>,
}

/// Forwards nodes to the host sink and keeps a copy for hit testing.
struct Recorder<'a> {
    inner: &'a mut dyn RenderSink,
    nodes: Vec<RenderNode>,
}

impl RenderSink for Recorder<'_> {
    fn apply(&mut self, node: RenderNode) {
        self.nodes.push(node.clone());
        self.inner.apply(node);
    }
}

pub struct Stage {
    options: StageOptions,
    config: MotionConfig,
    residents: Vec<Resident>,
    names: HashMap<String, WidgetId>,
    next_id: u64,
    origin: Vec3,
    target_origin: Vec3,
    ranges: Ranges,
    drag: DragTracker,
    origin_sm: StateMachine<OriginMachine>,
    scroll_gate: ScrollGate,
    listeners: DocumentListeners,
    scheduler: Scheduler<Stage>,
    gesture_tx: Option<Sender<GestureEvent>>,
    gesture_rx: Option<Receiver<GestureEvent>>,
    viewport: Size,
    time: f64,
    last_frame: Vec<RenderNode>,
    /// Node under the last press; a click only lands on the same node.
    pressed: Option<NodeKey>,
    debug: Box<dyn DebugSink>,
}

impl Stage {
    pub fn new(options: StageOptions) -> Self {
        Self::with_config(options, MotionConfig::default())
    }

    pub fn with_config(options: StageOptions, config: MotionConfig) -> Self {
        let scroll_gate = ScrollGate::new(config.suppress_window());
        Self {
            options,
            config,
            residents: Vec::new(),
            names: HashMap::new(),
            next_id: 0,
            origin: Vec3::ZERO,
            target_origin: Vec3::ZERO,
            ranges: Ranges::default(),
            drag: DragTracker::new(),
            origin_sm: OriginMachine::default().state_machine(),
            scroll_gate,
            listeners: DocumentListeners::default(),
            scheduler: Scheduler::new(),
            gesture_tx: None,
            gesture_rx: None,
            viewport: Size::new(1280.0, 800.0),
            time: 0.0,
            last_frame: Vec::new(),
            pressed: None,
            debug: Box::new(NoopDebug),
        }
    }

    /// Route diagnostic lines to `sink` instead of discarding them.
    pub fn with_debug(mut self, sink: impl DebugSink + 'static) -> Self {
        self.debug = Box::new(sink);
        self
    }

    // -- Accessors ----------------------------------------------------------

    pub fn options(&self) -> StageOptions {
        self.options
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    fn motion(&self) -> &StageMotion {
        &self.config.stage
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn target_origin(&self) -> Vec3 {
        self.target_origin
    }

    pub fn set_target_origin(&mut self, target: Vec3) {
        self.target_origin = target;
    }

    pub fn move_target_origin(&mut self, delta: Vec3) {
        self.target_origin += delta;
    }

    pub fn range(&self, axis: Axis) -> Range {
        self.ranges.get(axis)
    }

    pub fn set_range(&mut self, axis: Axis, range: Range) {
        self.ranges.set(axis, range);
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Seconds of frame time accumulated so far.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.origin_sm.state(), OriginState::Dragging {})
    }

    pub fn len(&self) -> usize {
        self.residents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residents.is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Nodes emitted during the most recent frame.
    pub fn last_frame(&self) -> &[RenderNode] {
        &self.last_frame
    }

    /// Gradient endpoints scaled by scroll depth.
    pub fn background(&self, top: Color, bottom: Color) -> (Color, Color) {
        let factor = 1.0 - self.origin.y / 2000.0;
        (top.multiply(factor), bottom.multiply(factor))
    }

    // -- Residents ----------------------------------------------------------

    pub fn add<W: Widget>(&mut self, widget: W) -> WidgetId {
        self.add_at(widget, Vec3::ZERO)
    }

    pub fn add_at<W: Widget>(&mut self, widget: W, position: Vec3) -> WidgetId {
        self.add_boxed(Box::new(widget), position)
    }

    /// Make `widget` resident at `position`: assigns its base position,
    /// runs its attach hook and registers its name, if any.
    pub fn add_boxed(&mut self, mut widget: Box<dyn Widget>, position: Vec3) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;

        widget.core_mut().base_position = position;

        let mut cx = AttachCx {
            widget: id,
            viewport: self.viewport,
            config: &self.config,
            listeners: &mut self.listeners,
            ranges: &mut self.ranges,
        };
        widget.attach(&mut cx);

        if let Some(name) = widget.core().name.clone() {
            self.names.insert(name, id);
        }

        info!(target: "stage", id = id.0, name = ?widget.core().name, "widget added");
        self.residents.push(Resident { id, widget });
        id
    }

    /// Stack widgets vertically from `start`, advancing Y by each widget's
    /// measured height plus its own Y offset.
    pub fn add_group(&mut self, start: Vec3, widgets: Vec<Box<dyn Widget>>) -> Vec<WidgetId> {
        let mut running = start;
        let mut ids = Vec::with_capacity(widgets.len());

        for widget in widgets {
            let advance = widget.measure().height + widget.core().offset_position.y;
            ids.push(self.add_boxed(widget, running));
            running.y += advance;
        }

        ids
    }

    /// Detach and return a widget, dropping its listeners and name.
    pub fn remove(&mut self, id: WidgetId) -> Option<Box<dyn Widget>> {
        let pos = self.residents.iter().position(|r| r.id == id)?;
        let mut resident = self.residents.remove(pos);

        resident.widget.detach();
        let dropped = self.listeners.remove_owner(id);
        self.names.retain(|_, w| *w != id);
        self.last_frame.retain(|n| n.key.widget != id);

        info!(target: "stage", id = id.0, listeners = dropped, "widget removed");
        Some(resident.widget)
    }

    /// Name a resident widget, replacing any previous owner of the name.
    pub fn name(&mut self, id: WidgetId, name: impl Into<String>) {
        let name = name.into();
        if let Some(resident) = self.residents.iter_mut().find(|r| r.id == id) {
            resident.widget.core_mut().name = Some(name.clone());
            self.names.insert(name, id);
        }
    }

    pub fn find(&self, name: &str) -> Option<WidgetId> {
        self.names.get(name).copied()
    }

    pub fn widget(&self, id: WidgetId) -> Option<&dyn Widget> {
        self.residents
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.widget.as_ref())
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> Option<&mut dyn Widget> {
        match self.residents.iter_mut().find(|r| r.id == id) {
            Some(r) => Some(r.widget.as_mut()),
            None => None,
        }
    }

    pub fn get<W: Widget>(&self, id: WidgetId) -> Option<&W> {
        self.widget(id)?.as_any().downcast_ref::<W>()
    }

    pub fn get_mut<W: Widget>(&mut self, id: WidgetId) -> Option<&mut W> {
        self.widget_mut(id)?.as_any_mut().downcast_mut::<W>()
    }

    pub fn find_as<W: Widget>(&self, name: &str) -> Option<&W> {
        self.get(self.find(name)?)
    }

    pub fn find_as_mut<W: Widget>(&mut self, name: &str) -> Option<&mut W> {
        let id = self.find(name)?;
        self.get_mut(id)
    }

    /// Aim the target origin so the widget's centre lands mid-viewport.
    pub fn slide_into_view(&mut self, id: WidgetId) {
        let Some(widget) = self.widget(id) else { return };
        let anchor = widget.anchor(self.viewport);
        let half = widget.measure().half();
        let center = self.viewport.half();

        self.target_origin = Vec3::new(
            -anchor.x + center.x - half.x,
            -anchor.y + center.y - half.y,
            -anchor.z,
        );
    }

    // -- Scheduling ---------------------------------------------------------

    /// Run `f` every frame (before widgets tick) until it returns stop.
    pub fn animate<F, R>(&mut self, f: F) -> TaskId
    where
        F: FnMut(&mut Stage, f64) -> R + 'static,
        R: Into<Flow>,
    {
        self.scheduler.animate(f)
    }

    pub fn tween<F>(&mut self, config: TweenConfig, on_update: F) -> (TaskId, Completion)
    where
        F: FnMut(&mut Stage, f64) + 'static,
    {
        self.scheduler.tween(config, on_update)
    }

    pub fn cancel(&mut self, task: TaskId) -> bool {
        self.scheduler.cancel(task)
    }

    fn run_tasks(&mut self, dt: f64) {
        let mut tasks = self.scheduler.take_tasks();
        tasks.retain_mut(|task| {
            if self.scheduler.is_cancelled(task.id()) {
                return false;
            }
            task.call(self, dt) == Flow::Continue
        });
        self.scheduler.restore_tasks(tasks);
    }

    // -- Gestures -----------------------------------------------------------

    /// Sender for swipe events; they are applied at the start of the next
    /// frame. Hand it to `gestures::forward_to`.
    pub fn gesture_inbox(&mut self) -> Sender<GestureEvent> {
        if let Some(tx) = &self.gesture_tx {
            return tx.clone();
        }
        let (tx, rx) = std::sync::mpsc::channel();
        self.gesture_tx = Some(tx.clone());
        self.gesture_rx = Some(rx);
        tx
    }

    /// Move the target origin along the swipe.
    pub fn apply_gesture(&mut self, event: &GestureEvent) {
        let d = event.delta() * self.motion().swipe_gain;
        match event {
            GestureEvent::SwipeLeft(_) | GestureEvent::SwipeRight(_) => {
                if self.options.draggable_x || self.options.scrollable_x {
                    self.target_origin.x += d.x;
                }
            }
            GestureEvent::SwipeUp(_) | GestureEvent::SwipeDown(_) => {
                if self.options.draggable_y || self.options.scrollable_y {
                    self.target_origin.y += d.y;
                }
            }
        }
        self.debug.print(&format!("{:?} {:.0}, {:.0}", event.kind(), d.x, d.y));
    }

    fn drain_gestures(&mut self) {
        let pending: Vec<GestureEvent> = match &self.gesture_rx {
            Some(rx) => rx.try_iter().collect(),
            None => return,
        };
        for event in &pending {
            self.apply_gesture(event);
        }
    }

    // -- Input --------------------------------------------------------------

    /// Topmost node under `p` from the last frame.
    pub fn hit_test(&self, p: Vec2) -> Option<NodeKey> {
        self.last_frame
            .iter()
            .enumerate()
            .filter(|(_, n)| n.opacity > HIT_MIN_OPACITY && n.contains(p))
            .max_by_key(|(i, n)| (n.z_index, *i))
            .map(|(_, n)| n.key)
    }

    pub fn pointer_down(&mut self, pointer: Pointer) {
        self.pressed = self.hit_test(pointer.position);
        if let Some(key) = self.pressed {
            if let Some(resident) = self.residents.iter_mut().find(|r| r.id == key.widget) {
                let mut cx = InputCx::new(self.origin, self.viewport, self.time, &mut self.target_origin);
                if resident.widget.pointer_down(key.part, pointer.position, &mut cx) {
                    return;
                }
            }
        }

        if self.options.draggable_x || self.options.draggable_y {
            self.target_origin = self.origin;
            self.drag.begin(pointer.position);
            self.origin_sm.handle(&OriginEvent::Grab);
        }
    }

    pub fn pointer_move(&mut self, pointer: Pointer) {
        for owner in self.listeners.owners() {
            if let Some(resident) = self.residents.iter_mut().find(|r| r.id == owner) {
                let mut cx = InputCx::new(self.origin, self.viewport, self.time, &mut self.target_origin);
                resident.widget.pointer_move(pointer.position, &mut cx);
            }
        }

        let Some(motion) = self.drag.move_to(pointer.position) else { return };

        if self.options.draggable_x {
            self.target_origin.x += motion.delta.x * self.drag_factor(Axis::X);
        }
        if self.options.draggable_y {
            self.target_origin.y += motion.delta.y * self.drag_factor(Axis::Y);
        }
        self.origin = self.target_origin;
        trace!(target: "stage", x = self.origin.x, y = self.origin.y, "drag");
    }

    pub fn pointer_up(&mut self, pointer: Pointer) {
        for owner in self.listeners.owners() {
            if let Some(resident) = self.residents.iter_mut().find(|r| r.id == owner) {
                let mut cx = InputCx::new(self.origin, self.viewport, self.time, &mut self.target_origin);
                resident.widget.pointer_up(pointer.position, &mut cx);
            }
        }

        let Some(last) = self.drag.end() else { return };
        let momentum = self.motion().momentum;
        let carry = Vec2::new(
            if self.options.draggable_x { last.x * momentum } else { 0.0 },
            if self.options.draggable_y { last.y * momentum } else { 0.0 },
        );

        self.target_origin.x += carry.x;
        self.target_origin.y += carry.y;
        self.origin_sm.handle(&OriginEvent::Release {
            momentum_x: carry.x,
            momentum_y: carry.y,
        });
        self.scroll_gate.suppress_next(pointer.time);
        self.debug.print(&format!("release {:.1}, {:.1}", carry.x, carry.y));
    }

    /// Click on whatever is under the pointer. Hosts send this after
    /// `pointer_up`; it is dropped unless the press began on the same node.
    pub fn click(&mut self, pointer: Pointer) {
        let pressed = self.pressed.take();
        let Some(key) = self.hit_test(pointer.position) else { return };
        if pressed != Some(key) {
            trace!(target: "stage", ?key, ?pressed, "click without matching press");
            return;
        }
        if let Some(resident) = self.residents.iter_mut().find(|r| r.id == key.widget) {
            let mut cx = InputCx::new(self.origin, self.viewport, self.time, &mut self.target_origin);
            resident.widget.click(key.part, pointer.position, &mut cx);
        }
    }

    /// Wheel input. Widgets get first refusal (topmost first); otherwise the
    /// content scrolls against the wheel direction.
    pub fn wheel(&mut self, delta: Vec2, pointer: Pointer) {
        if !self.scroll_gate.admit(pointer.time) {
            debug!(target: "stage", "wheel suppressed");
            return;
        }

        for resident in self.residents.iter_mut().rev() {
            let mut cx = InputCx::new(self.origin, self.viewport, self.time, &mut self.target_origin);
            if resident.widget.wheel(delta, pointer.position, &mut cx) {
                return;
            }
        }

        let gain = self.motion().scroll_gain;
        if self.options.scrollable_x {
            self.target_origin.x -= delta.x * gain;
        }
        if self.options.scrollable_y {
            self.target_origin.y -= delta.y * gain;
        }
    }

    /// Resistance to dragging further out of range on `axis`.
    fn drag_factor(&self, axis: Axis) -> f64 {
        let resistance = self.motion().overscroll_resistance;
        if resistance <= 0.0 {
            return 1.0;
        }
        let overflow = self.ranges.get(axis).overflow(self.target_origin.get(axis));
        1.0 - (overflow / resistance).min(1.0)
    }

    // -- Frame --------------------------------------------------------------

    /// Advance one frame of `dt` seconds, emitting every widget's nodes into
    /// `sink`.
    pub fn update(&mut self, dt: f64, sink: &mut dyn RenderSink) {
        let dt = dt.max(0.0);
        self.time += dt;

        self.drain_gestures();
        self.run_tasks(dt);

        let mut recorder = Recorder {
            inner: sink,
            nodes: Vec::with_capacity(self.last_frame.len()),
        };
        for resident in self.residents.iter_mut() {
            let mut cx = FrameCx::new(resident.id, dt, self.time, self.origin, self.viewport, &mut recorder);
            resident.widget.tick(&mut cx);
        }
        self.last_frame = recorder.nodes;

        self.ease_origin(dt);
    }

    fn ease_origin(&mut self, dt: f64) {
        if !self.is_dragging() {
            let k = (dt * self.motion().range_ease_rate).min(1.0);
            for axis in Axis::ALL {
                let range = self.ranges.get(axis);
                let target = self.target_origin.get(axis);
                if range.contains(target) {
                    continue;
                }
                let bound = range.clamp(target);
                let next = lerp(target, bound, k);
                let next = if (next - bound).abs() < RANGE_SNAP { bound } else { next };
                self.target_origin.set(axis, next);
            }
        }

        let k = (dt * self.motion().ease_rate).min(1.0);
        self.origin = self.origin.lerp(self.target_origin, k);
    }

    /// Push new tuning into the stage and every resident.
    pub fn reconfigure(&mut self, config: MotionConfig) {
        self.scroll_gate.set_window(config.suppress_window());
        for resident in self.residents.iter_mut() {
            resident.widget.reconfigure(&config);
        }
        self.config = config;
        info!(target: "config", "motion config applied");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::RingDebug;
    use crate::math::Size;
    use crate::widget::{Draw, NodeKind, NullSink, Transform, WidgetCore, WidgetExt};
    use crate::widgets::pane::Pane;
    use std::any::Any;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn draggable() -> StageOptions {
        StageOptions {
            draggable_x: true,
            draggable_y: true,
            ..StageOptions::default()
        }
    }

    fn run(stage: &mut Stage, frames: usize) {
        for _ in 0..frames {
            stage.update(1.0 / 60.0, &mut NullSink);
        }
    }

    #[test]
    fn add_assigns_base_and_name() {
        let mut stage = Stage::new(StageOptions::default());
        let id = stage.add_at(Pane::sized(100.0, 50.0).named("hero"), Vec3::new(10.0, 20.0, 0.0));

        assert_eq!(stage.find("hero"), Some(id));
        let pane = stage.find_as::<Pane>("hero").unwrap();
        assert_eq!(pane.core().base_position, Vec3::new(10.0, 20.0, 0.0));
        assert!(stage.get::<crate::widgets::text::Text3D>(id).is_none());
    }

    #[test]
    fn naming_after_attach_registers() {
        let mut stage = Stage::new(StageOptions::default());
        let id = stage.add(Pane::new());
        assert_eq!(stage.find("late"), None);
        stage.name(id, "late");
        assert_eq!(stage.find("late"), Some(id));
    }

    #[test]
    fn add_group_stacks_by_height() {
        let mut stage = Stage::new(StageOptions::default());
        let ids = stage.add_group(
            Vec3::new(250.0, 20.0, 0.0),
            vec![
                Box::new(Pane::sized(100.0, 100.0)),
                Box::new(Pane::sized(100.0, 200.0).transformed(Transform::new().y(15.0))),
                Box::new(Pane::sized(100.0, 50.0)),
            ],
        );

        let y = |i: usize| stage.widget(ids[i]).unwrap().core().base_position.y;
        assert_eq!(y(0), 20.0);
        assert_eq!(y(1), 120.0);
        assert_eq!(y(2), 335.0);
        assert_eq!(stage.widget(ids[2]).unwrap().core().base_position.x, 250.0);
    }

    #[test]
    fn easing_converges_without_overshoot() {
        let mut stage = Stage::new(StageOptions::default());
        stage.set_target_origin(Vec3::new(300.0, -500.0, 40.0));

        let mut previous = stage.origin();
        for _ in 0..600 {
            stage.update(0.01, &mut NullSink);
            let o = stage.origin();
            assert!(o.x >= previous.x && o.x <= 300.0);
            assert!(o.y <= previous.y && o.y >= -500.0);
            assert!(o.z >= previous.z && o.z <= 40.0);
            previous = o;
        }
        assert!((previous.x - 300.0).abs() < 1e-3);
        assert!((previous.y + 500.0).abs() < 1e-3);
    }

    #[test]
    fn wheel_moves_content_against_delta() {
        let mut stage = Stage::new(StageOptions::default());
        stage.wheel(Vec2::new(0.0, 50.0), Pointer::new(10.0, 10.0, 1.0));
        assert_eq!(stage.target_origin().y, -100.0);
    }

    #[test]
    fn drag_release_carries_momentum_in_drag_direction() {
        let mut stage = Stage::new(draggable());
        run(&mut stage, 1);

        stage.pointer_down(Pointer::new(100.0, 100.0, 0.0));
        assert!(stage.is_dragging());
        for step in 1..=10 {
            stage.pointer_move(Pointer::new(100.0 + step as f64 * 10.0, 100.0, step as f64 * 0.016));
        }
        // Origin tracks the drag 1:1.
        assert_eq!(stage.origin().x, 100.0);

        stage.pointer_up(Pointer::new(200.0, 100.0, 0.2));
        assert!(!stage.is_dragging());
        assert_eq!(stage.target_origin().x, 100.0 + 10.0 * 20.0);

        run(&mut stage, 30);
        assert!(stage.origin().x > 100.0);
    }

    #[test]
    fn drag_without_motion_does_not_coast() {
        let mut stage = Stage::new(draggable());
        stage.pointer_down(Pointer::new(5.0, 5.0, 0.0));
        stage.pointer_up(Pointer::new(5.0, 5.0, 0.1));
        assert_eq!(stage.target_origin(), Vec3::ZERO);
    }

    #[test]
    fn trailing_wheel_after_drag_is_suppressed() {
        let mut stage = Stage::new(draggable());
        stage.pointer_down(Pointer::new(0.0, 0.0, 0.0));
        stage.pointer_move(Pointer::new(0.0, 10.0, 0.01));
        stage.pointer_up(Pointer::new(0.0, 10.0, 1.0));
        let after_release = stage.target_origin();

        // Leaked trackpad events right after release are ignored...
        stage.wheel(Vec2::new(0.0, 30.0), Pointer::new(0.0, 0.0, 1.05));
        stage.wheel(Vec2::new(0.0, 30.0), Pointer::new(0.0, 0.0, 1.15));
        stage.wheel(Vec2::new(0.0, 30.0), Pointer::new(0.0, 0.0, 1.30));
        assert_eq!(stage.target_origin(), after_release);

        // ...until a pause longer than the window starts a new action.
        stage.wheel(Vec2::new(0.0, 30.0), Pointer::new(0.0, 0.0, 1.8));
        assert_eq!(stage.target_origin().y, after_release.y - 60.0);
    }

    #[test]
    fn suppression_expires() {
        let mut gate = ScrollGate::new(0.2);
        gate.suppress_next(1.0);
        assert!(gate.admit(1.5));
        assert!(gate.admit(1.6));
    }

    #[test]
    fn out_of_range_target_springs_back() {
        let mut stage = Stage::new(StageOptions::default());
        stage.set_range(Axis::Y, Range::new(-1000.0, 0.0));
        stage.set_target_origin(Vec3::new(0.0, 250.0, 0.0));

        run(&mut stage, 5);
        // Overshoot is visible for a moment...
        assert!(stage.origin().y > 0.0);
        run(&mut stage, 300);
        // ...then both settle on the bound.
        assert_eq!(stage.target_origin().y, 0.0);
        assert!(stage.origin().y.abs() < 1e-3);
    }

    #[test]
    fn drag_is_resisted_out_of_range() {
        let mut stage = Stage::new(draggable());
        stage.set_range(Axis::Y, Range::new(-1000.0, 0.0));
        stage.pointer_down(Pointer::new(0.0, 0.0, 0.0));
        stage.pointer_move(Pointer::new(0.0, 150.0, 0.01));
        stage.pointer_move(Pointer::new(0.0, 300.0, 0.02));
        // Second move applied at half strength (overflow 150 of 300).
        assert!((stage.target_origin().y - 225.0).abs() < 1e-9);
        stage.pointer_move(Pointer::new(0.0, 2000.0, 0.03));
        let capped = stage.target_origin().y;
        assert!(capped < 1200.0);
    }

    #[test]
    fn remove_drops_listeners_and_name() {
        let mut stage = Stage::new(StageOptions::default());
        let id = stage.add(crate::widgets::carousel::PaneCarousel::new().named("projects"));
        assert!(stage.listener_count() > 0);

        assert!(stage.remove(id).is_some());
        assert_eq!(stage.listener_count(), 0);
        assert_eq!(stage.find("projects"), None);
        assert!(stage.remove(id).is_none());
    }

    #[test]
    fn scheduled_tasks_run_before_widgets_and_can_cancel() {
        let mut stage = Stage::new(StageOptions::default());
        let id = stage.add(Pane::new().named("title"));

        let task = stage.animate(move |stage: &mut Stage, _dt| {
            let t = stage.time();
            if let Some(pane) = stage.get_mut::<Pane>(id) {
                pane.transform(Transform::new().y(t * 100.0));
            }
        });
        run(&mut stage, 3);
        let y = stage.get::<Pane>(id).unwrap().core().offset_position.y;
        assert!((y - 5.0).abs() < 1e-9);
        // The frame's node already reflects this frame's task output.
        assert!((stage.last_frame()[0].translation.y - 5.0).abs() < 1e-3);

        assert!(stage.cancel(task));
        run(&mut stage, 3);
        let y2 = stage.get::<Pane>(id).unwrap().core().offset_position.y;
        assert_eq!(y, y2);
    }

    #[test]
    fn tween_on_stage_resolves() {
        let mut stage = Stage::new(StageOptions::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let (_, done) = stage.tween(TweenConfig::new(1.0, 0.0, 0.1), move |_, v| log.borrow_mut().push(v));
        run(&mut stage, 20);
        assert!(done.is_resolved());
        assert_eq!(seen.borrow().last().copied(), Some(0.0));
    }

    #[test]
    fn gestures_move_target_and_log() {
        let debug = Rc::new(RefCell::new(RingDebug::default()));
        let mut stage = Stage::new(draggable()).with_debug(debug.clone());
        let inbox = stage.gesture_inbox();

        inbox.send(GestureEvent::SwipeLeft(Vec2::new(-80.0, 3.0))).unwrap();
        inbox.send(GestureEvent::SwipeUp(Vec2::new(2.0, -40.0))).unwrap();
        run(&mut stage, 1);

        assert_eq!(stage.target_origin().x, -80.0);
        assert_eq!(stage.target_origin().y, -40.0);
        assert_eq!(debug.borrow().lines().count(), 2);
    }

    #[test]
    fn stage_without_gesture_source_runs() {
        let mut stage = Stage::new(StageOptions::default());
        run(&mut stage, 2);
        assert_eq!(stage.target_origin(), Vec3::ZERO);
    }

    #[test]
    fn slide_into_view_centres_widget() {
        let mut stage = Stage::new(StageOptions::default());
        stage.set_viewport(Size::new(1000.0, 800.0));
        let id = stage.add_at(Pane::sized(200.0, 100.0), Vec3::new(0.0, 1500.0, 0.0));
        stage.slide_into_view(id);
        assert_eq!(stage.target_origin(), Vec3::new(400.0, -1500.0 + 400.0 - 50.0, 0.0));
    }

    #[test]
    fn slide_into_view_centres_self_centring_widgets() {
        use crate::widgets::carousel::PaneCarousel;
        use crate::widgets::text::Text3D;

        let mut stage = Stage::new(StageOptions::default());
        stage.set_viewport(Size::new(1000.0, 800.0));
        let mut carousel = PaneCarousel::new();
        for _ in 0..8 {
            carousel.add_pane(Pane::sized(200.0, 300.0));
        }
        let ring = stage.add_at(carousel, Vec3::new(0.0, 1000.0, 0.0));
        let title = stage.add_at(Text3D::new("Projects").centered(), Vec3::new(0.0, 1500.0, 0.0));

        let centre_of = |stage: &Stage, id: WidgetId| {
            let node = stage
                .last_frame()
                .iter()
                .filter(|n| n.key.widget == id)
                .max_by(|a, b| a.translation.z.total_cmp(&b.translation.z))
                .unwrap();
            Vec2::new(
                node.translation.x + node.size.width / 2.0,
                node.translation.y + node.size.height / 2.0,
            )
        };

        stage.slide_into_view(ring);
        run(&mut stage, 600);
        let front = centre_of(&stage, ring);
        assert!((front.x - 500.0).abs() < 1e-3, "front pane at {front:?}");
        // Within the idle bob.
        assert!((front.y - 400.0).abs() <= 5.0 + 1e-3, "front pane at {front:?}");

        stage.slide_into_view(title);
        run(&mut stage, 600);
        let text = centre_of(&stage, title);
        assert!((text.x - 500.0).abs() < 1e-3, "title at {text:?}");
        assert!((text.y - 400.0).abs() < 1e-3, "title at {text:?}");
    }

    /// A fixed box that counts the clicks it receives.
    struct Tally {
        core: WidgetCore,
        clicks: Rc<Cell<usize>>,
    }

    impl Widget for Tally {
        fn core(&self) -> &WidgetCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut WidgetCore {
            &mut self.core
        }

        fn measure(&self) -> Size {
            Size::new(100.0, 100.0)
        }

        fn tick(&mut self, cx: &mut FrameCx<'_>) {
            let at = self.core.position() + cx.origin;
            cx.emit(0, Draw::new(NodeKind::Bar, at, self.measure()));
        }

        fn click(&mut self, _part: usize, _pointer: Vec2, _cx: &mut InputCx<'_>) {
            self.clicks.set(self.clicks.get() + 1);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn click_lands_only_where_the_press_began() {
        let mut stage = Stage::new(draggable());
        let clicks = Rc::new(Cell::new(0));
        stage.add(Tally {
            core: WidgetCore::default(),
            clicks: clicks.clone(),
        });
        run(&mut stage, 1);

        stage.pointer_down(Pointer::new(50.0, 50.0, 0.0));
        stage.pointer_up(Pointer::new(51.0, 50.0, 0.1));
        stage.click(Pointer::new(51.0, 50.0, 0.1));
        assert_eq!(clicks.get(), 1);

        // A page drag released over the box is not a click on it.
        stage.pointer_down(Pointer::new(500.0, 500.0, 1.0));
        stage.pointer_up(Pointer::new(52.0, 50.0, 1.1));
        stage.click(Pointer::new(52.0, 50.0, 1.1));
        assert_eq!(clicks.get(), 1);

        // Nor is a second click for the same press.
        stage.click(Pointer::new(52.0, 50.0, 1.2));
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn listeners_dedupe_owners_and_drop_by_owner() {
        let mut listeners = DocumentListeners::default();
        listeners.add(WidgetId(1));
        listeners.add(WidgetId(2));
        listeners.add(WidgetId(1));
        assert_eq!(listeners.owners(), vec![WidgetId(1), WidgetId(2)]);
        assert_eq!(listeners.remove_owner(WidgetId(1)), 2);
        assert_eq!(listeners.len(), 1);
        assert!(!listeners.is_empty());
    }

    #[test]
    fn hit_test_prefers_nearest() {
        let mut stage = Stage::new(StageOptions::default());
        let back = stage.add_at(Pane::sized(200.0, 200.0), Vec3::new(0.0, 0.0, -100.0));
        let front = stage.add_at(Pane::sized(200.0, 200.0), Vec3::new(50.0, 50.0, 10.0));
        run(&mut stage, 1);

        assert_eq!(stage.hit_test(Vec2::new(100.0, 100.0)).map(|k| k.widget), Some(front));
        assert_eq!(stage.hit_test(Vec2::new(10.0, 10.0)).map(|k| k.widget), Some(back));
        assert_eq!(stage.hit_test(Vec2::new(900.0, 900.0)), None);
    }

    #[test]
    fn background_tracks_depth() {
        let mut stage = Stage::new(StageOptions::default());
        stage.set_target_origin(Vec3::new(0.0, -2000.0, 0.0));
        run(&mut stage, 600);
        let (top, _) = stage.background(Color::rgb(50, 10, 100), Color::rgb(100, 70, 180));
        assert!((top.r - 100.0 / 255.0).abs() < 1e-3);
    }
}
