//! Pseudo-3D pane scenes: a stage whose scrollable origin every widget
//! renders against, plus carousel, slider and field arrangements with
//! drag, momentum and settle behaviour.
//!
//! The library computes transforms only. Each frame, [`Stage::update`]
//! hands a [`RenderNode`] per visible surface to a [`RenderSink`]; drawing
//! is the host's job.

pub mod animation;
pub mod config;
pub mod config_watcher;
pub mod debug;
pub mod drag;
pub mod gestures;
pub mod logging;
pub mod math;
pub mod paths;
pub mod stage;
pub mod state_machine;
pub mod widget;
pub mod widgets;

pub use config::MotionConfig;
pub use math::{Color, Range, Size, Vec2, Vec3};
pub use stage::{Pointer, Stage, StageOptions};
pub use widget::{RenderNode, RenderSink, Transform, Widget, WidgetExt, WidgetId};
