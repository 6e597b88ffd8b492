use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, SurfaceCtx, WindowCtx};
use crate::device::gpu::{GpuInit, WgpuBackend, WgpuTarget};
use crate::input::platform::WinitInput;
use crate::scheduler::{Deferred, RepaintTimer};
use crate::surface::{ContextGroup, KeyOutcome, RenderDefaults, RenderSurface};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn create_window(&mut self, config: RuntimeConfig) {
        self.commands.push(Command::CreateWindow(config));
    }

    pub fn close_window(&mut self, id: WindowId) {
        self.commands.push(Command::CloseWindow(id));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    CreateWindow(RuntimeConfig),
    CloseWindow(WindowId),
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window per entry of `initial`, all sharing one device, and
    /// runs until the last window closes.
    pub fn run<A>(
        initial: Vec<RuntimeConfig>,
        gpu_init: GpuInit,
        defaults: Rc<RenderDefaults>,
        app: A,
    ) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(initial, gpu_init, defaults, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

struct WindowEntry {
    // `surface` is disposed before the entry (and the window) is dropped.
    surface: RenderSurface,
    input: WinitInput,
    window: Arc<Window>,
    title: String,
    fps_in_title: bool,
}

type Windows = HashMap<WindowId, WindowEntry>;

struct AppState<A>
where
    A: CoreApp + 'static,
{
    initial: Vec<RuntimeConfig>,
    backend: Rc<WgpuBackend>,
    defaults: Rc<RenderDefaults>,
    group: Rc<ContextGroup>,
    app: A,

    windows: Windows,
    /// Creation order, used for focus navigation.
    order: Vec<WindowId>,
    deferred: Deferred<Windows>,
    timer: RepaintTimer,
    last_title_update: Option<Instant>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(
        initial: Vec<RuntimeConfig>,
        gpu_init: GpuInit,
        defaults: Rc<RenderDefaults>,
        app: A,
    ) -> Self {
        Self {
            initial,
            backend: WgpuBackend::new(gpu_init),
            defaults,
            group: ContextGroup::new(),
            app,
            windows: HashMap::new(),
            order: Vec::new(),
            deferred: Deferred::new(),
            timer: RepaintTimer::default(),
            last_title_update: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn create_window_entry(
        &mut self,
        event_loop: &ActiveEventLoop,
        config: RuntimeConfig,
    ) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        let id = window.id();

        let target = WgpuTarget::new(&self.backend, window.clone());
        let mut surface =
            RenderSurface::new(Box::new(target), self.group.clone(), self.defaults.clone());

        let mut runtime_ctx = RuntimeCtx::default();
        self.app.init_surface(&mut SurfaceCtx {
            window: WindowCtx { id, window: &window },
            surface: &mut surface,
            runtime: &mut runtime_ctx,
        });

        self.windows.insert(
            id,
            WindowEntry {
                surface,
                input: WinitInput::new(),
                window,
                title: config.title,
                fps_in_title: false,
            },
        );
        self.order.push(id);

        // The window reports its final size only after the platform maps it.
        self.post_initialize(id);

        self.apply_commands(event_loop, runtime_ctx);
        Ok(id)
    }

    /// Initializes the surface on the next loop turn. A zero-sized window
    /// leaves it waiting; the next resize posts another attempt.
    fn post_initialize(&self, id: WindowId) {
        self.deferred.post(move |windows: &mut Windows| {
            let Some(entry) = windows.get_mut(&id) else { return };
            if entry.surface.initialize().is_ok() {
                entry.window.request_redraw();
            }
        });
    }

    fn resize_entry(&mut self, id: WindowId, width: u32, height: u32) {
        let Some(entry) = self.windows.get_mut(&id) else { return };
        entry.surface.resize(width, height);
        let retry = entry.surface.awaits_initialize() && width > 0 && height > 0;
        entry.window.request_redraw();
        if retry {
            self.post_initialize(id);
        }
    }

    fn destroy_window_entry(&mut self, id: WindowId) {
        if let Some(mut entry) = self.windows.remove(&id) {
            entry.surface.dispose();
        }
        self.order.retain(|w| *w != id);
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::CreateWindow(cfg) => {
                    if let Err(e) = self.create_window_entry(event_loop, cfg) {
                        log::error!("failed to create window: {e:#}");
                    }
                }
                Command::CloseWindow(id) => self.destroy_window_entry(id),
                Command::Exit => self.request_exit(),
            }
        }

        if self.windows.is_empty() {
            self.request_exit();
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    /// Moves keyboard focus to the window after (or before) `from`.
    fn focus_neighbor(&self, from: WindowId, forward: bool) {
        let n = self.order.len();
        let Some(pos) = self.order.iter().position(|w| *w == from) else { return };
        if n < 2 {
            return;
        }
        let next = if forward { (pos + 1) % n } else { (pos + n - 1) % n };
        if let Some(entry) = self.windows.get(&self.order[next]) {
            entry.window.focus_window();
        }
    }

    /// One repaint pass over every surface, bracketed for garbage cleanup.
    fn paint_all(&mut self) {
        self.group.begin_frame();
        for id in &self.order {
            if let Some(entry) = self.windows.get_mut(id) {
                entry.surface.paint();
            }
        }
        self.group.end_frame();
    }

    fn update_titles(&mut self, now: Instant) {
        if self
            .last_title_update
            .is_some_and(|t| now.duration_since(t) < Duration::from_secs(1))
        {
            return;
        }
        self.last_title_update = Some(now);

        for entry in self.windows.values_mut() {
            if entry.surface.show_fps() {
                let fps = entry.surface.current_fps();
                entry
                    .window
                    .set_title(&format!("{} ({fps:.0} fps)", entry.title));
                entry.fps_in_title = true;
            } else if entry.fps_in_title {
                entry.window.set_title(&entry.title);
                entry.fps_in_title = false;
            }
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.windows.is_empty() {
            return;
        }

        for config in std::mem::take(&mut self.initial) {
            if let Err(e) = self.create_window_entry(event_loop, config) {
                log::error!("failed to create initial window: {e:#}");
            }
        }
        if self.windows.is_empty() {
            self.request_exit();
            event_loop.exit();
            return;
        }

        self.timer.start(Instant::now());
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        self.deferred.run_pending(&mut self.windows);

        let now = Instant::now();
        if self.timer.poll(now) {
            self.paint_all();
            self.update_titles(now);

            let mut runtime_ctx = RuntimeCtx::default();
            if self.app.on_tick(&mut runtime_ctx) == AppControl::Exit {
                runtime_ctx.exit();
            }
            self.apply_commands(event_loop, runtime_ctx);
        }

        // Pending deferred work must run on the next turn, not after a tick.
        if !self.deferred.is_empty() {
            event_loop.set_control_flow(ControlFlow::Poll);
        } else if let Some(due) = self.timer.next_due() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(due));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let mut runtime_ctx = RuntimeCtx::default();
        let mut outcome = KeyOutcome::Ignored;
        let mut control = AppControl::Continue;

        if let Some(entry) = self.windows.get_mut(&window_id) {
            if let Some(ev) = entry.input.translate(&entry.window, &event) {
                outcome = entry.surface.handle_input(&ev);
                control = self.app.on_input(
                    &mut SurfaceCtx {
                        window: WindowCtx { id: window_id, window: &entry.window },
                        surface: &mut entry.surface,
                        runtime: &mut runtime_ctx,
                    },
                    &ev,
                );
            }
        } else {
            return;
        }

        match outcome {
            KeyOutcome::FocusNext => self.focus_neighbor(window_id, true),
            KeyOutcome::FocusPrev => self.focus_neighbor(window_id, false),
            KeyOutcome::Consumed | KeyOutcome::Ignored => {}
        }

        if control == AppControl::Exit {
            runtime_ctx.exit();
        }

        // Runtime-managed window lifecycle / resize / redraw handling.
        match &event {
            WindowEvent::CloseRequested => runtime_ctx.close_window(window_id),

            WindowEvent::Resized(new_size) => {
                self.resize_entry(window_id, new_size.width, new_size.height);
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.windows.get(&window_id).map(|e| e.window.inner_size()) {
                    self.resize_entry(window_id, size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Some(entry) = self.windows.get_mut(&window_id) {
                    entry.surface.paint();
                }
            }

            _ => {}
        }

        self.apply_commands(event_loop, runtime_ctx);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        for entry in self.windows.values_mut() {
            entry.surface.dispose();
        }
        log::debug!("runtime: all surfaces disposed");
    }
}
