//! Windowed host: drives the showcase stage from winit input and paints its
//! render nodes with vello every frame.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};
use vello::peniko::FontData;
use vello::peniko::color::palette;
use vello::util::{RenderContext, RenderSurface};
use vello::{AaConfig, Renderer, RendererOptions, Scene, wgpu};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowId};

use panes::animation::FrameClock;
use panes::config_watcher::ConfigWatcher;
use panes::gestures::{self, GestureChannel, GestureEvent, GestureKind};
use panes::widgets::PaneCarousel;
use panes::{Color, MotionConfig, Pointer, RenderNode, Size, Stage, Vec2};

use crate::{paint, showcase};

/// Pixels per wheel "line".
const LINE_HEIGHT: f64 = 40.0;
/// Arrow-key swipe distance.
const SWIPE: f64 = 240.0;

const SKY_TOP: Color = Color {
    r: 0.10,
    g: 0.08,
    b: 0.16,
};
const SKY_BOTTOM: Color = Color {
    r: 0.30,
    g: 0.16,
    b: 0.22,
};

#[derive(Debug)]
enum RenderState {
    Active {
        surface: Box<RenderSurface<'static>>,
        valid_surface: bool,
        window: Arc<Window>,
    },
    Suspended(Option<Arc<Window>>),
}

struct Viewer {
    context: RenderContext,
    renderers: Vec<Option<Renderer>>,
    state: RenderState,
    scene: Scene,
    windowed: bool,
    font: Option<FontData>,

    stage: Stage,
    nodes: Vec<RenderNode>,
    clock: FrameClock,
    started: Instant,
    cursor: Vec2,
    gestures: GestureChannel,
    reloads: Receiver<MotionConfig>,

    /// First fatal error; the loop exits and `run` returns it.
    failure: Option<anyhow::Error>,
}

impl Viewer {
    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn pointer(&self) -> Pointer {
        Pointer::new(self.cursor.x, self.cursor.y, self.now())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        warn!("viewer stopping: {error:#}");
        self.failure.get_or_insert(error);
        event_loop.exit();
    }

    fn activate(&mut self, event_loop: &ActiveEventLoop, cached: Option<Arc<Window>>) -> Result<()> {
        let window = match cached {
            Some(window) => window,
            None => create_window(event_loop, self.windowed)?,
        };

        let size = window.inner_size();
        let surface = pollster::block_on(self.context.create_surface(
            window.clone(),
            size.width,
            size.height,
            wgpu::PresentMode::AutoVsync,
        ))
        .context("creating surface")?;

        self.renderers.resize_with(self.context.devices.len(), || None);
        if self.renderers[surface.dev_id].is_none() {
            self.renderers[surface.dev_id] = Some(create_renderer(&self.context, &surface)?);
        }

        self.stage.set_viewport(Size::new(size.width as f64, size.height as f64));
        self.state = RenderState::Active {
            surface: Box::new(surface),
            valid_surface: true,
            window,
        };
        Ok(())
    }

    /// Step the stage once and rebuild the scene from its nodes.
    fn compose(&mut self) {
        for config in self.reloads.try_iter() {
            self.stage.reconfigure(config);
        }

        let dt = self.clock.tick(Instant::now());
        self.nodes.clear();
        self.stage.update(dt, &mut self.nodes);

        let viewport = self.stage.viewport();
        let (top, bottom) = self.stage.background(SKY_TOP, SKY_BOTTOM);
        self.scene.reset();
        paint::draw_background(&mut self.scene, viewport, top, bottom);
        paint::draw_nodes(&mut self.scene, &self.nodes, viewport, self.font.as_ref());
    }

    fn present(&mut self) -> Result<()> {
        let RenderState::Active { surface, window, .. } = &self.state else {
            return Ok(());
        };
        let device_handle = &self.context.devices[surface.dev_id];
        let renderer = self.renderers[surface.dev_id]
            .as_mut()
            .ok_or_else(|| anyhow!("no renderer for device {}", surface.dev_id))?;

        renderer
            .render_to_texture(
                &device_handle.device,
                &device_handle.queue,
                &self.scene,
                &surface.target_view,
                &vello::RenderParams {
                    base_color: palette::css::BLACK,
                    width: surface.config.width,
                    height: surface.config.height,
                    antialiasing_method: AaConfig::Msaa16,
                },
            )
            .context("rendering scene")?;

        let surface_texture = surface.surface.get_current_texture().context("acquiring surface texture")?;

        let mut encoder = device_handle
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Surface Blit"),
            });
        surface.blitter.copy(
            &device_handle.device,
            &mut encoder,
            &surface.target_view,
            &surface_texture.texture.create_view(&wgpu::TextureViewDescriptor::default()),
        );
        device_handle.queue.submit([encoder.finish()]);
        surface_texture.present();
        if let Err(e) = device_handle.device.poll(wgpu::PollType::Poll) {
            warn!("device poll: {e}");
        }

        window.request_redraw();
        Ok(())
    }

    fn key(&mut self, key: &Key) {
        let swipe = match key {
            Key::Named(NamedKey::ArrowDown) => Some((GestureKind::SwipeUp, Vec2::new(0.0, -SWIPE))),
            Key::Named(NamedKey::ArrowUp) => Some((GestureKind::SwipeDown, Vec2::new(0.0, SWIPE))),
            Key::Named(NamedKey::ArrowLeft) => {
                self.step_carousel(-1);
                None
            }
            Key::Named(NamedKey::ArrowRight) => {
                self.step_carousel(1);
                None
            }
            _ => None,
        };
        if let Some((kind, delta)) = swipe {
            self.gestures.emit(GestureEvent::new(kind, delta));
        }
    }

    fn step_carousel(&mut self, step: isize) {
        if let Some(carousel) = self.stage.find_as_mut::<PaneCarousel>(showcase::CAROUSEL) {
            let next = carousel.current_index() as isize + step;
            carousel.focus_by_index(next);
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let RenderState::Suspended(cached) = &mut self.state else {
            return;
        };
        let cached = cached.take();
        if let Err(e) = self.activate(event_loop, cached) {
            self.fail(event_loop, e);
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let RenderState::Active { window, .. } = &self.state {
            self.state = RenderState::Suspended(Some(window.clone()));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let valid_surface = match &self.state {
            RenderState::Active {
                valid_surface, window, ..
            } if window.id() == window_id => *valid_surface,
            _ => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        ref logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.key(logical_key),

            WindowEvent::Resized(size) => {
                let RenderState::Active {
                    surface, valid_surface, ..
                } = &mut self.state
                else {
                    return;
                };
                if size.width != 0 && size.height != 0 {
                    self.context.resize_surface(surface, size.width, size.height);
                    *valid_surface = true;
                    self.stage.set_viewport(Size::new(size.width as f64, size.height as f64));
                } else {
                    *valid_surface = false;
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x, position.y);
                self.stage.pointer_move(self.pointer());
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let pointer = self.pointer();
                match state {
                    ElementState::Pressed => self.stage.pointer_down(pointer),
                    ElementState::Released => {
                        self.stage.pointer_up(pointer);
                        self.stage.click(pointer);
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                // Positive winit deltas mean "scroll toward the top".
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(-x as f64 * LINE_HEIGHT, -y as f64 * LINE_HEIGHT),
                    MouseScrollDelta::PixelDelta(p) => Vec2::new(-p.x, -p.y),
                };
                self.stage.wheel(delta, self.pointer());
            }

            WindowEvent::RedrawRequested => {
                if !valid_surface {
                    return;
                }
                self.compose();
                if let Err(e) = self.present() {
                    self.fail(event_loop, e);
                }
            }

            _ => {}
        }
    }
}

/// Open the showcase in a window and run until it closes.
pub fn run(windowed: bool, config_path: PathBuf) -> Result<()> {
    let (tx, reloads) = mpsc::channel();
    let watcher = ConfigWatcher::start(config_path.clone(), move |config| {
        let _ = tx.send(config);
    });
    let _watcher = match watcher {
        Ok(w) => Some(w),
        Err(e) => {
            warn!("motion config hot reload disabled: {e:#}");
            None
        }
    };

    let config = MotionConfig::load_or_default(&config_path);

    let font = paint::load_font();
    if font.is_none() {
        warn!("no system font found; text renders as blocks");
    }

    let mut stage = showcase::build(Size::new(1280.0, 800.0), config);
    let mut channel = GestureChannel::new();
    gestures::forward_to(&mut channel, stage.gesture_inbox());

    let mut viewer = Viewer {
        context: RenderContext::new(),
        renderers: vec![],
        state: RenderState::Suspended(None),
        scene: Scene::new(),
        windowed,
        font,
        stage,
        nodes: Vec::new(),
        clock: FrameClock::new(),
        started: Instant::now(),
        cursor: Vec2::ZERO,
        gestures: channel,
        reloads,
        failure: None,
    };

    info!("panes viewer v{}", env!("CARGO_PKG_VERSION"));
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut viewer).context("running event loop")?;

    match viewer.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn create_window(event_loop: &ActiveEventLoop, windowed: bool) -> Result<Arc<Window>> {
    let mut attr = Window::default_attributes().with_title("panes");

    if !windowed {
        attr = attr.with_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        attr = attr.with_inner_size(winit::dpi::LogicalSize::new(1280, 800));
    }

    let window = event_loop.create_window(attr).context("creating window")?;
    Ok(Arc::new(window))
}

fn create_renderer(render_cx: &RenderContext, surface: &RenderSurface<'_>) -> Result<Renderer> {
    Renderer::new(&render_cx.devices[surface.dev_id].device, RendererOptions::default())
        .map_err(|e| anyhow!("creating renderer: {e}"))
}
