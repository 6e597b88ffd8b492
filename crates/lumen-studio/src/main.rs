use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use lumen_engine::config::SurfaceSettings;
use lumen_engine::coords::{Rect, Vec2};
use lumen_engine::core::{App, AppControl, SurfaceCtx};
use lumen_engine::device::gpu::GpuInit;
use lumen_engine::input::{InputEvent, Key, MouseButton};
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::paint::Color;
use lumen_engine::surface::{CursorShape, RenderDefaults, SurfaceCallbacks};
use lumen_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

const SETTINGS_FILE: &str = "lumen.json";

struct Bouncer {
    pos: Vec2,
    vel: Vec2,
    size: f32,
    color: Color,
}

/// State shared by both windows. Only the editor window advances it.
struct Scene {
    bouncers: Vec<Bouncer>,
    bounds: Vec2,
    zoom: f32,
    cursor: Option<Vec2>,
}

impl Scene {
    fn new() -> Self {
        let colors = [
            Color::from_rgba8(0xe0, 0x6c, 0x75, 0xff),
            Color::from_rgba8(0x98, 0xc3, 0x79, 0xff),
            Color::from_rgba8(0x61, 0xaf, 0xef, 0xcc),
        ];
        let bouncers = colors
            .iter()
            .enumerate()
            .map(|(i, &color)| Bouncer {
                pos: Vec2::new(40.0 + 120.0 * i as f32, 60.0 + 40.0 * i as f32),
                vel: Vec2::new(180.0 - 70.0 * i as f32, 120.0 + 50.0 * i as f32),
                size: 48.0,
                color,
            })
            .collect();
        Self {
            bouncers,
            bounds: Vec2::new(640.0, 480.0),
            zoom: 1.0,
            cursor: None,
        }
    }

    fn step(&mut self, dt: f32) {
        let bounds = self.bounds;
        for b in &mut self.bouncers {
            b.pos = b.pos + b.vel * dt;
            if b.pos.x < 0.0 || b.pos.x + b.size > bounds.x {
                b.vel.x = -b.vel.x;
                b.pos.x = b.pos.x.clamp(0.0, (bounds.x - b.size).max(0.0));
            }
            if b.pos.y < 0.0 || b.pos.y + b.size > bounds.y {
                b.vel.y = -b.vel.y;
                b.pos.y = b.pos.y.clamp(0.0, (bounds.y - b.size).max(0.0));
            }
        }
    }

    fn spawn(&mut self, at: Vec2) {
        let n = self.bouncers.len() as f32;
        self.bouncers.push(Bouncer {
            pos: at,
            vel: Vec2::new(150.0 - 25.0 * n, 90.0 + 15.0 * n),
            size: 32.0,
            color: Color::from_rgba8(0xe5, 0xc0, 0x7b, 0xee),
        });
    }

    fn draw(&self, painter: &mut lumen_engine::device::Painter, zoom: f32) {
        for b in &self.bouncers {
            painter.fill_rect(
                Rect::new(b.pos.x * zoom, b.pos.y * zoom, b.size * zoom, b.size * zoom),
                b.color,
            );
        }
        if let Some(c) = self.cursor {
            let c = c * zoom;
            let white = Color::new(1.0, 1.0, 1.0, 0.5);
            painter.fill_rect(Rect::new(c.x - 8.0, c.y - 0.5, 16.0, 1.0), white);
            painter.fill_rect(Rect::new(c.x - 0.5, c.y - 8.0, 1.0, 16.0), white);
        }
    }
}

struct Studio {
    scene: Rc<RefCell<Scene>>,
    windows_seen: usize,
    screenshots: usize,
}

impl Studio {
    fn editor_callbacks(&self, scale: f32) -> SurfaceCallbacks {
        let paint = self.scene.clone();
        let init = self.scene.clone();
        let moved = self.scene.clone();
        let pressed = self.scene.clone();
        let zoom_in = self.scene.clone();
        let zoom_out = self.scene.clone();

        SurfaceCallbacks::new()
            .on_init_scene(move |w, h| {
                init.borrow_mut().bounds = Vec2::new(w as f32 / scale, h as f32 / scale);
            })
            .on_paint_scene(move |painter, dt| {
                let mut scene = paint.borrow_mut();
                let (w, h) = painter.state().surface_size;
                scene.bounds = Vec2::new(w as f32 / scale / scene.zoom, h as f32 / scale / scene.zoom);
                scene.step(dt as f32);
                let zoom = scene.zoom * scale;
                scene.draw(painter, zoom);
            })
            .on_mouse_move(move |ev| {
                let mut scene = moved.borrow_mut();
                let zoom = scene.zoom;
                scene.cursor = Some(Vec2::new(ev.x / zoom, ev.y / zoom));
            })
            .on_mouse_press(move |ev| {
                if ev.button == Some(MouseButton::Left) {
                    let mut scene = pressed.borrow_mut();
                    let zoom = scene.zoom;
                    scene.spawn(Vec2::new(ev.x / zoom, ev.y / zoom));
                }
            })
            .on_zoom_in(move || {
                let mut scene = zoom_in.borrow_mut();
                scene.zoom = (scene.zoom * 1.25).min(8.0);
            })
            .on_zoom_out(move || {
                let mut scene = zoom_out.borrow_mut();
                scene.zoom = (scene.zoom / 1.25).max(0.125);
            })
    }

    fn preview_callbacks(&self, scale: f32) -> SurfaceCallbacks {
        let paint = self.scene.clone();
        SurfaceCallbacks::new().on_paint_scene(move |painter, _dt| {
            let scene = paint.borrow();
            let (w, _) = painter.state().surface_size;
            // Fit the editor's visible area into the preview's width.
            let fit = w as f32 / (scene.bounds.x * scene.zoom * scale).max(1.0);
            scene.draw(painter, scene.zoom * scale * fit);
        })
    }
}

impl App for Studio {
    fn init_surface(&mut self, ctx: &mut SurfaceCtx<'_>) {
        let scale = ctx.window.window.scale_factor() as f32;
        let callbacks = if self.windows_seen == 0 {
            ctx.surface.set_cursor_shape(CursorShape::CrossHair);
            self.editor_callbacks(scale)
        } else {
            ctx.surface.set_clear_color(Color::from_rgba8(0x18, 0x1a, 0x1f, 0xff));
            self.preview_callbacks(scale)
        };
        ctx.surface.set_callbacks(callbacks);
        self.windows_seen += 1;
    }

    fn on_input(&mut self, ctx: &mut SurfaceCtx<'_>, event: &InputEvent) -> AppControl {
        let InputEvent::KeyPress(key) = event else {
            return AppControl::Continue;
        };
        match key.key {
            Key::Escape => AppControl::Exit,
            Key::F(12) => {
                self.screenshots += 1;
                let path = format!("lumen-{}.png", self.screenshots);
                match ctx.surface.take_screenshot() {
                    Ok(image) => match image.save(&path) {
                        Ok(()) => log::info!("saved screenshot to {path}"),
                        Err(e) => log::error!("failed to save {path}: {e}"),
                    },
                    Err(e) => log::error!("screenshot failed: {e}"),
                }
                AppControl::Continue
            }
            Key::F(5) => {
                ctx.surface.reload_shaders();
                ctx.surface.reload_textures();
                log::info!("resources: {:?}", ctx.surface.resource_stats());
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let settings = match SurfaceSettings::load_or_default(SETTINGS_FILE) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("ignoring {SETTINGS_FILE}: {e}");
            SurfaceSettings::default()
        }
    };
    let defaults = RenderDefaults::from_settings(&settings);

    let studio = Studio {
        scene: Rc::new(RefCell::new(Scene::new())),
        windows_seen: 0,
        screenshots: 0,
    };

    Runtime::run(
        vec![
            RuntimeConfig {
                title: "lumen studio".to_string(),
                initial_size: LogicalSize::new(960.0, 640.0),
            },
            RuntimeConfig {
                title: "lumen preview".to_string(),
                initial_size: LogicalSize::new(480.0, 320.0),
            },
        ],
        GpuInit::default(),
        defaults,
        studio,
    )
}
