//! The contract every scene member implements.
//!
//! A widget's `base_position` is owned by its container (the stage or an
//! arrangement widget) and its `offset_position`/`rotation` by its own
//! behaviour. At render time the two are layered on top of the stage origin:
//!
//! ```text
//! translation = base_position + offset_position + origin (+ layout)
//! ```
//!
//! Each frame the stage calls [`Widget::tick`], and the widget emits one
//! [`RenderNode`] per visible part to the render collaborator.

use std::any::Any;

use serde::Serialize;

use crate::config::MotionConfig;
use crate::math::{Axis, Color, Range, Size, Vec2, Vec3};
use crate::stage::{DocumentListeners, Ranges};

/// Paint order base: `z_index = Z_INDEX_BASE + round(z)`.
pub const Z_INDEX_BASE: i32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WidgetId(pub(crate) u64);

// ---------------------------------------------------------------------------
// Core state and transforms
// ---------------------------------------------------------------------------

/// Positional state shared by all widgets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetCore {
    pub name: Option<String>,
    /// Assigned by the container.
    pub base_position: Vec3,
    /// Assigned by the widget's own behaviour.
    pub offset_position: Vec3,
    /// Radians per axis.
    pub rotation: Vec3,
}

impl WidgetCore {
    /// `base + offset`, before the stage origin is applied.
    pub fn position(&self) -> Vec3 {
        self.base_position + self.offset_position
    }

    pub fn apply(&mut self, transform: Transform) {
        self.offset_position = transform.position;
        self.rotation = transform.rotation;
    }
}

/// Local motion: replaces a widget's offset and rotation wholesale; axes
/// left unset are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            rotation: Vec3::ZERO,
        }
    }

    pub fn x(mut self, x: f64) -> Self {
        self.position.x = x;
        self
    }

    pub fn y(mut self, y: f64) -> Self {
        self.position.y = y;
        self
    }

    pub fn z(mut self, z: f64) -> Self {
        self.position.z = z;
        self
    }

    pub fn rotate_y(mut self, radians: f64) -> Self {
        self.rotation.y = radians;
        self
    }
}

// ---------------------------------------------------------------------------
// Render boundary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Accent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Pane { theme: Theme, active: bool },
    Text { text: String, font_size: f64 },
    Particle { color: Color },
    Bar,
}

/// Identifies a drawable part: `part` is the child index inside the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeKey {
    pub widget: WidgetId,
    pub part: usize,
}

/// One transformed surface for the render collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub key: NodeKey,
    pub kind: NodeKind,
    pub translation: Vec3,
    /// Radians per axis.
    pub rotation: Vec3,
    pub size: Size,
    pub z_index: i32,
    pub opacity: f64,
    pub blur: f64,
}

impl RenderNode {
    /// CSS transform: translate first, then rotate X, Y, Z.
    pub fn css_transform(&self) -> String {
        let t = self.translation;
        let r = self.rotation;
        format!(
            "translate3d({}px, {}px, {}px) rotateX({}deg) rotateY({}deg) rotateZ({}deg)",
            t.x,
            t.y,
            t.z,
            r.x.to_degrees(),
            r.y.to_degrees(),
            r.z.to_degrees()
        )
    }

    /// Screen-space hit box, ignoring perspective.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.translation.x
            && p.x <= self.translation.x + self.size.width
            && p.y >= self.translation.y
            && p.y <= self.translation.y + self.size.height
    }
}

/// Anything that applies render nodes to a visible surface.
pub trait RenderSink {
    fn apply(&mut self, node: RenderNode);
}

impl RenderSink for Vec<RenderNode> {
    fn apply(&mut self, node: RenderNode) {
        self.push(node);
    }
}

/// Discards everything.
pub struct NullSink;

impl RenderSink for NullSink {
    fn apply(&mut self, _node: RenderNode) {}
}

/// A node before the stage stamps its key and z-index.
#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub kind: NodeKind,
    pub translation: Vec3,
    pub rotation: Vec3,
    pub size: Size,
    pub opacity: f64,
    pub blur: f64,
}

impl Draw {
    pub fn new(kind: NodeKind, translation: Vec3, size: Size) -> Self {
        Self {
            kind,
            translation,
            rotation: Vec3::ZERO,
            size,
            opacity: 1.0,
            blur: 0.0,
        }
    }

    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn faded(mut self, opacity: f64, blur: f64) -> Self {
        self.opacity = opacity;
        self.blur = blur;
        self
    }
}

// ---------------------------------------------------------------------------
// Contexts
// ---------------------------------------------------------------------------

/// Per-frame context handed to [`Widget::tick`].
pub struct FrameCx<'a> {
    pub dt: f64,
    /// Seconds since the stage started.
    pub time: f64,
    pub origin: Vec3,
    pub viewport: Size,
    pub(crate) widget: WidgetId,
    pub(crate) part_base: usize,
    pub(crate) sink: &'a mut dyn RenderSink,
}

impl<'a> FrameCx<'a> {
    pub fn new(widget: WidgetId, dt: f64, time: f64, origin: Vec3, viewport: Size, sink: &'a mut dyn RenderSink) -> Self {
        Self {
            dt,
            time,
            origin,
            viewport,
            widget,
            part_base: 0,
            sink,
        }
    }

    pub fn emit(&mut self, part: usize, draw: Draw) {
        let z_index = Z_INDEX_BASE + draw.translation.z.round() as i32;
        self.sink.apply(RenderNode {
            key: NodeKey {
                widget: self.widget,
                part: self.part_base + part,
            },
            kind: draw.kind,
            translation: draw.translation,
            rotation: draw.rotation,
            size: draw.size,
            z_index,
            opacity: draw.opacity,
            blur: draw.blur,
        });
    }

    /// A context whose emitted parts are numbered from `part_base`, for
    /// group widgets ticking their children.
    pub fn nested(&mut self, part_base: usize) -> FrameCx<'_> {
        FrameCx {
            dt: self.dt,
            time: self.time,
            origin: self.origin,
            viewport: self.viewport,
            widget: self.widget,
            part_base: self.part_base + part_base,
            sink: &mut *self.sink,
        }
    }

    /// Viewport centre.
    pub fn center(&self) -> Vec2 {
        self.viewport.half()
    }
}

/// Context for input hooks: read the origin, steer its target.
pub struct InputCx<'a> {
    pub origin: Vec3,
    pub viewport: Size,
    pub time: f64,
    pub(crate) target_origin: &'a mut Vec3,
}

impl<'a> InputCx<'a> {
    pub fn new(origin: Vec3, viewport: Size, time: f64, target_origin: &'a mut Vec3) -> Self {
        Self {
            origin,
            viewport,
            time,
            target_origin,
        }
    }

    pub fn target_origin(&self) -> Vec3 {
        *self.target_origin
    }

    pub fn set_target_origin(&mut self, target: Vec3) {
        *self.target_origin = target;
    }
}

/// Context for [`Widget::attach`].
pub struct AttachCx<'a> {
    pub widget: WidgetId,
    pub viewport: Size,
    pub config: &'a MotionConfig,
    pub(crate) listeners: &'a mut DocumentListeners,
    pub(crate) ranges: &'a mut Ranges,
}

impl AttachCx<'_> {
    /// Register for document-level pointer move/up. The stage drops the
    /// registration when the widget is removed.
    pub fn listen_document(&mut self) {
        self.listeners.add(self.widget);
    }

    /// Constrain the stage's scrollable range on `axis`.
    pub fn set_range(&mut self, axis: Axis, range: Range) {
        self.ranges.set(axis, range);
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

pub trait Widget: Any {
    fn core(&self) -> &WidgetCore;
    fn core_mut(&mut self) -> &mut WidgetCore;

    /// Width and height in pixels. Zero for widgets with no surface.
    fn measure(&self) -> Size;

    /// Top-left of the measured box relative to the stage origin. Widgets
    /// that lay themselves out against the viewport override this.
    fn anchor(&self, _viewport: Size) -> Vec3 {
        self.core().position()
    }

    /// Called once when the widget becomes resident on a stage.
    fn attach(&mut self, _cx: &mut AttachCx<'_>) {}

    /// Compute this frame's transforms and emit render nodes.
    fn tick(&mut self, cx: &mut FrameCx<'_>);

    /// Pointer pressed on `part`. Returning `true` claims the press so the
    /// stage does not start its own drag.
    fn pointer_down(&mut self, _part: usize, _pointer: Vec2, _cx: &mut InputCx<'_>) -> bool {
        false
    }

    /// Document-level move; only delivered to widgets that registered.
    fn pointer_move(&mut self, _pointer: Vec2, _cx: &mut InputCx<'_>) {}

    /// Document-level release; only delivered to widgets that registered.
    fn pointer_up(&mut self, _pointer: Vec2, _cx: &mut InputCx<'_>) {}

    fn click(&mut self, _part: usize, _pointer: Vec2, _cx: &mut InputCx<'_>) {}

    /// Returning `true` consumes the wheel event.
    fn wheel(&mut self, _delta: Vec2, _pointer: Vec2, _cx: &mut InputCx<'_>) -> bool {
        false
    }

    fn reconfigure(&mut self, _config: &MotionConfig) {}

    /// Release anything held beyond the widget's own fields.
    fn detach(&mut self) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Builder helpers for any concrete widget.
pub trait WidgetExt: Widget + Sized {
    fn named(mut self, name: impl Into<String>) -> Self {
        self.core_mut().name = Some(name.into());
        self
    }

    fn transformed(mut self, transform: Transform) -> Self {
        self.core_mut().apply(transform);
        self
    }

    fn transform(&mut self, transform: Transform) {
        self.core_mut().apply(transform);
    }
}

impl<W: Widget + Sized> WidgetExt for W {}
