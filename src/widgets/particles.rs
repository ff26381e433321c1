//! A stream of small dots drifting upward through the viewport.
//!
//! Particles ignore the stage origin; parallax comes from the widget's own
//! offset position, which callers typically drive from the origin at a
//! fraction of its speed.

use std::any::Any;

use crate::config::{MotionConfig, ParticleMotion};
use crate::math::{Color, Size, Vec3, modulo};
use crate::widget::{AttachCx, Draw, FrameCx, NodeKind, Widget, WidgetCore};

/// Depth behind the content plane.
const PARTICLE_DEPTH: f64 = -300.0;

pub struct Particles {
    core: WidgetCore,
    count: usize,
    base_color: Color,
    motion: ParticleMotion,
}

impl Particles {
    pub fn new(count: usize) -> Self {
        Self {
            core: WidgetCore::default(),
            count,
            base_color: Color::rgb(57, 176, 255),
            motion: ParticleMotion::default(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.base_color = color;
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    fn particle(&self, i: usize, time: f64, viewport: Size) -> Draw {
        let i_f = i as f64;
        let offset = self.core.offset_position;

        let base_size = 4.0 + (i_f * 1.8).sin() * 3.0;
        let speed_factor = 0.6 + 0.4 * (base_size / 8.0);
        let rise = self.motion.rise_speed * (1.0 + (i_f * 1.7).sin() * 0.2) * speed_factor;

        let start_x = viewport.width / 2.0 + (i_f * 1.1).sin() * self.motion.stream_width;
        let start_y = 300.0 + (i_f * 2.3).cos() * viewport.height;
        let x = offset.x + start_x + (time + i_f * 1.3).sin() * self.motion.sway;
        let y = if viewport.height > 0.0 {
            modulo(offset.y + start_y - time * rise, viewport.height)
        } else {
            0.0
        };

        let height_ratio = if viewport.height > 0.0 { y / viewport.height } else { 0.0 };
        let oscillation = 0.8 + i_f.sin() * 0.2;
        let diameter = base_size * (1.0 + height_ratio) * oscillation;
        let color = self.base_color.multiply(0.5 + height_ratio * oscillation);

        Draw::new(
            NodeKind::Particle { color },
            Vec3::new(x, y, PARTICLE_DEPTH + diameter),
            Size::new(diameter, diameter),
        )
        .faded((diameter / 5.0).min(1.0), 0.0)
    }
}

impl Widget for Particles {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn measure(&self) -> Size {
        Size::ZERO
    }

    fn attach(&mut self, cx: &mut AttachCx<'_>) {
        self.motion = cx.config.particles.clone();
    }

    fn tick(&mut self, cx: &mut FrameCx<'_>) {
        for i in 0..self.count {
            let draw = self.particle(i, cx.time, cx.viewport);
            cx.emit(i, draw);
        }
    }

    fn reconfigure(&mut self, config: &MotionConfig) {
        self.motion = config.particles.clone();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{RenderNode, WidgetId};

    fn frame(particles: &mut Particles, time: f64, viewport: Size) -> Vec<RenderNode> {
        let mut nodes = Vec::new();
        let mut cx = FrameCx::new(WidgetId(0), 0.016, time, Vec3::new(500.0, 500.0, 0.0), viewport, &mut nodes);
        particles.tick(&mut cx);
        nodes
    }

    #[test]
    fn particles_stay_inside_viewport_height() {
        let mut particles = Particles::new(40);
        let viewport = Size::new(800.0, 600.0);
        for time in [0.0, 1.3, 17.9, 250.0] {
            let nodes = frame(&mut particles, time, viewport);
            assert_eq!(nodes.len(), 40);
            for node in nodes {
                assert!(node.translation.y >= 0.0 && node.translation.y < 600.0);
                assert!(node.opacity <= 1.0);
            }
        }
    }

    #[test]
    fn particles_rise_over_time() {
        let mut particles = Particles::new(1);
        let viewport = Size::new(800.0, 100_000.0);
        let a = frame(&mut particles, 0.0, viewport)[0].translation.y;
        let b = frame(&mut particles, 0.5, viewport)[0].translation.y;
        assert!(b < a);
    }

    #[test]
    fn zero_height_viewport_is_harmless() {
        let mut particles = Particles::new(3);
        for node in frame(&mut particles, 2.0, Size::new(100.0, 0.0)) {
            assert!(node.translation.y.is_finite());
            assert!(node.size.width.is_finite());
        }
    }
}
