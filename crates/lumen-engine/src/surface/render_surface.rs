use std::rc::Rc;
use std::time::Instant;

use image::RgbaImage;

use crate::device::{Painter, ResourceStats, SharedDevice};
use crate::input::{InputEvent, Key, KeyEvent, MouseEvent, WheelEvent, ZoomGesture, ZoomStep};
use crate::paint::Color;
use crate::time::{FpsCounter, FrameClock};

use super::{
    Acquire, ContextGroup, CursorShape, MouseCursor, RenderDefaults, SurfaceCallbacks,
    SurfaceContext, SurfaceError, SurfaceTarget,
};

/// Lifecycle of a `RenderSurface`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceState {
    Uninitialized,
    Initializing,
    Ready,
    Disposed,
}

/// What the host should do after a key press reached a surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyOutcome {
    /// The key was handled (by the callback or a built-in binding).
    Consumed,
    /// Move input focus to the next surface.
    FocusNext,
    /// Move input focus to the previous surface.
    FocusPrev,
    Ignored,
}

/// A rendering-capable window: GPU context, shared device and painter.
///
/// The host drives it: `initialize()` once the window is exposed, `paint()`
/// on every repaint, input methods as events arrive and `dispose()` before
/// the window is destroyed.
pub struct RenderSurface {
    target: Box<dyn SurfaceTarget>,
    group: Rc<ContextGroup>,
    defaults: Rc<RenderDefaults>,
    callbacks: SurfaceCallbacks,

    context: Option<Box<dyn SurfaceContext>>,
    device: Option<SharedDevice>,
    painter: Option<Painter>,

    state: SurfaceState,
    init_error: Option<String>,

    clear_color: Option<Color>,
    cursor: CursorShape,
    applied_cursor: Option<(CursorShape, MouseCursor)>,
    owns_vsync: bool,
    has_focus: bool,
    show_fps: bool,

    clock: FrameClock,
    fps: FpsCounter,
    time: f64,
    zoom: ZoomGesture,
}

impl RenderSurface {
    pub fn new(
        target: Box<dyn SurfaceTarget>,
        group: Rc<ContextGroup>,
        defaults: Rc<RenderDefaults>,
    ) -> Self {
        Self {
            target,
            group,
            defaults,
            callbacks: SurfaceCallbacks::default(),
            context: None,
            device: None,
            painter: None,
            state: SurfaceState::Uninitialized,
            init_error: None,
            clear_color: None,
            cursor: CursorShape::default(),
            applied_cursor: None,
            owns_vsync: false,
            has_focus: false,
            show_fps: false,
            clock: FrameClock::new(),
            fps: FpsCounter::default(),
            time: 0.0,
            zoom: ZoomGesture::default(),
        }
    }

    pub fn with_callbacks(mut self, callbacks: SurfaceCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn set_callbacks(&mut self, callbacks: SurfaceCallbacks) {
        self.callbacks = callbacks;
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Creates the context and runs the scene init callback.
    ///
    /// A zero-sized target is not exposed yet: this returns `NotReady` and
    /// may be called again once the target has a size. Context creation
    /// itself is attempted once. A failure is logged and kept; the surface
    /// then stays blank and later calls return the same error without
    /// retrying.
    pub fn initialize(&mut self) -> Result<(), SurfaceError> {
        match self.state {
            SurfaceState::Ready => return Ok(()),
            SurfaceState::Disposed => return Err(SurfaceError::Disposed),
            SurfaceState::Initializing => return Err(SurfaceError::NotReady),
            SurfaceState::Uninitialized => {}
        }
        if let Some(reason) = &self.init_error {
            return Err(SurfaceError::ContextCreation(reason.clone()));
        }
        if !self.is_exposed() {
            log::debug!("surface: target has zero size, initialization deferred");
            return Err(SurfaceError::NotReady);
        }

        self.state = SurfaceState::Initializing;

        let want_vsync = self.defaults.vsync() && !self.group.vsync_owned();
        let context = match self.target.create_context(want_vsync) {
            Ok(context) => context,
            Err(e) => {
                let reason = format!("{e:#}");
                log::error!("surface: context creation failed: {reason}");
                self.init_error = Some(reason.clone());
                self.state = SurfaceState::Uninitialized;
                return Err(SurfaceError::ContextCreation(reason));
            }
        };

        let device = context.device();
        self.group.attach_device(&device);
        if context.vsync() {
            self.owns_vsync = true;
            self.group.set_vsync_owned(true);
        }

        self.painter = Some(Painter::new(device.clone()));
        self.device = Some(device);
        self.context = Some(context);
        self.apply_cursor();

        let (width, height) = self.target.size();
        log::debug!(
            "surface: initialized {width}x{height} in group {}",
            self.group.id()
        );
        if let Some(init) = self.callbacks.init_scene.as_mut() {
            init(width, height);
        }

        self.clock.reset();
        self.fps.reset();
        self.state = SurfaceState::Ready;
        Ok(())
    }

    /// Releases painter, device handle and context. Idempotent; safe before
    /// initialization. A disposed surface never initializes again.
    pub fn dispose(&mut self) {
        if self.state == SurfaceState::Disposed {
            return;
        }

        self.painter = None;
        self.device = None;
        if let Some(mut context) = self.context.take() {
            context.release();
        }
        if self.owns_vsync {
            self.owns_vsync = false;
            self.group.set_vsync_owned(false);
        }

        self.state = SurfaceState::Disposed;
        log::debug!("surface: disposed");
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SurfaceState::Ready
    }

    /// Reason the last context creation failed.
    pub fn init_error(&self) -> Option<&str> {
        self.init_error.as_deref()
    }

    /// True while `initialize()` is still worth calling: not yet initialized,
    /// not disposed, no context failure recorded.
    pub fn awaits_initialize(&self) -> bool {
        self.state == SurfaceState::Uninitialized && self.init_error.is_none()
    }

    fn is_exposed(&self) -> bool {
        let (width, height) = self.target.size();
        width > 0 && height > 0
    }

    /// Forwards a window resize to the context.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.target.resize(width, height);
        if let Some(context) = self.context.as_mut() {
            context.resize(width, height);
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.target.size()
    }

    pub fn group(&self) -> &Rc<ContextGroup> {
        &self.group
    }

    pub fn defaults(&self) -> &Rc<RenderDefaults> {
        &self.defaults
    }

    pub fn device(&self) -> Option<&SharedDevice> {
        self.device.as_ref()
    }

    // ---------------------------------------------------------------------
    // Paint cycle
    // ---------------------------------------------------------------------

    pub fn paint(&mut self) {
        self.paint_at(Instant::now());
    }

    /// Runs one frame as if the host repainted at `now`.
    pub fn paint_at(&mut self, now: Instant) {
        if self.state != SurfaceState::Ready {
            return;
        }

        self.coordinate_vsync();
        if self.applied_cursor != Some((self.cursor, self.defaults.mouse_cursor())) {
            self.apply_cursor();
        }

        let ft = self.clock.tick_at(now);
        self.time += ft.dt;
        self.fps.record(ft.dt);

        let clear = self.effective_clear_color();
        let (width, height) = self.target.size();

        let (Some(context), Some(device)) = (self.context.as_mut(), self.device.as_ref()) else {
            return;
        };

        match context.make_current() {
            Acquire::Ready => {}
            Acquire::Skip => {
                log::debug!("surface: frame skipped");
                return;
            }
            Acquire::Fatal => {
                log::error!("surface: context lost, disposing");
                self.dispose();
                return;
            }
        }

        {
            let mut device = device.borrow_mut();
            device.begin_frame();
            device.clear_color(clear);
            device.set_default_min_filter(self.defaults.min_filter());
            device.set_default_mag_filter(self.defaults.mag_filter());
        }

        if let (Some(paint), Some(painter)) =
            (self.callbacks.paint_scene.as_mut(), self.painter.as_mut())
        {
            painter.set_top_left_view(width as f32, height as f32);
            painter.set_viewport(0, 0, width, height);
            painter.set_surface_size(width, height);
            paint(painter, ft.dt);
        }

        device.borrow_mut().end_frame(false);
        context.swap_buffers();
    }

    /// Paints one frame and returns its pixels.
    pub fn take_screenshot(&mut self) -> Result<RgbaImage, SurfaceError> {
        match self.state {
            SurfaceState::Ready => {}
            SurfaceState::Disposed => return Err(SurfaceError::Disposed),
            _ => return Err(SurfaceError::NotReady),
        }
        if let Some(context) = self.context.as_mut() {
            context.request_capture();
        }
        self.paint();

        let Some(context) = self.context.as_mut() else {
            return Err(SurfaceError::CaptureUnavailable);
        };
        // A skipped frame must not leave the request for the next paint.
        match context.take_capture() {
            Some(image) => Ok(image),
            None => {
                context.cancel_capture();
                Err(SurfaceError::CaptureUnavailable)
            }
        }
    }

    /// Accumulated (clamped) frame time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn current_fps(&self) -> f32 {
        self.fps.current()
    }

    pub fn show_fps(&self) -> bool {
        self.show_fps
    }

    pub fn set_show_fps(&mut self, show: bool) {
        self.show_fps = show;
    }

    /// Claims or releases the group's single vsync slot.
    fn coordinate_vsync(&mut self) {
        let Some(context) = self.context.as_mut() else { return };
        let wanted = self.defaults.vsync();

        if wanted && !self.group.vsync_owned() && !context.vsync() {
            context.set_vsync(true);
            self.owns_vsync = true;
            self.group.set_vsync_owned(true);
            log::debug!("surface: took vsync");
        } else if !wanted && self.owns_vsync {
            context.set_vsync(false);
            self.owns_vsync = false;
            self.group.set_vsync_owned(false);
            log::debug!("surface: released vsync");
        }
    }

    pub fn vsync(&self) -> bool {
        self.context.as_ref().is_some_and(|c| c.vsync())
    }

    // ---------------------------------------------------------------------
    // Appearance
    // ---------------------------------------------------------------------

    /// Clear color used by the next paint: the override, else the default.
    pub fn effective_clear_color(&self) -> Color {
        self.clear_color
            .unwrap_or_else(|| self.defaults.clear_color())
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = Some(color);
    }

    /// Drops the override; the surface follows the default again.
    pub fn reset_clear_color(&mut self) {
        self.clear_color = None;
    }

    pub fn cursor_shape(&self) -> CursorShape {
        self.cursor
    }

    pub fn set_cursor_shape(&mut self, shape: CursorShape) {
        self.cursor = shape;
        if self.state == SurfaceState::Ready {
            self.apply_cursor();
        }
    }

    fn apply_cursor(&mut self) {
        let applied = (self.cursor, self.defaults.mouse_cursor());
        self.target.apply_cursor(applied.0, applied.1);
        self.applied_cursor = Some(applied);
    }

    // ---------------------------------------------------------------------
    // Resources
    // ---------------------------------------------------------------------

    /// Drops programs and shaders; they are rebuilt on next use.
    pub fn reload_shaders(&mut self) {
        if let Some(device) = &self.device {
            let mut device = device.borrow_mut();
            device.delete_programs();
            device.delete_shaders();
        }
    }

    pub fn reload_textures(&mut self) {
        if let Some(device) = &self.device {
            device.borrow_mut().delete_textures();
        }
    }

    pub fn resource_stats(&self) -> ResourceStats {
        self.device
            .as_ref()
            .map(|d| d.borrow().resource_stats())
            .unwrap_or_default()
    }

    /// Queues a texture for deletion at the group's next `end_frame`.
    pub fn delete_texture(&self, name: &str) {
        self.group.delete_texture(name);
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    /// Routes a translated platform event. Only key presses produce an
    /// outcome other than `Ignored`.
    pub fn handle_input(&mut self, event: &InputEvent) -> KeyOutcome {
        match event {
            InputEvent::MouseMove(ev) => self.mouse_move(ev),
            InputEvent::MousePress(ev) => self.mouse_press(ev),
            InputEvent::MouseRelease(ev) => self.mouse_release(ev),
            InputEvent::MouseDoubleClick(ev) => self.mouse_double_click(ev),
            InputEvent::Wheel(ev) => self.mouse_wheel(ev),
            InputEvent::KeyPress(ev) => return self.key_press(ev),
            InputEvent::KeyRelease(ev) => {
                self.key_release(ev);
            }
            InputEvent::FocusIn => self.focus_in(),
            InputEvent::FocusOut => self.focus_out(),
        }
        KeyOutcome::Ignored
    }

    pub fn mouse_move(&mut self, ev: &MouseEvent) {
        if let Some(f) = self.callbacks.mouse_move.as_mut() {
            f(ev);
        }
    }

    pub fn mouse_press(&mut self, ev: &MouseEvent) {
        if let Some(f) = self.callbacks.mouse_press.as_mut() {
            f(ev);
        }
    }

    pub fn mouse_release(&mut self, ev: &MouseEvent) {
        if let Some(f) = self.callbacks.mouse_release.as_mut() {
            f(ev);
        }
    }

    pub fn mouse_double_click(&mut self, ev: &MouseEvent) {
        if let Some(f) = self.callbacks.mouse_double_click.as_mut() {
            f(ev);
        }
    }

    /// Forwards the wheel event, then fires one zoom callback per step.
    pub fn mouse_wheel(&mut self, ev: &WheelEvent) {
        if let Some(f) = self.callbacks.mouse_wheel.as_mut() {
            f(ev);
        }

        let (steps, zoom) = match self.zoom.feed(ev) {
            ZoomStep::None => return,
            ZoomStep::In(n) => (n, self.callbacks.zoom_in.as_mut()),
            ZoomStep::Out(n) => (n, self.callbacks.zoom_out.as_mut()),
        };
        if let Some(zoom) = zoom {
            for _ in 0..steps {
                zoom();
            }
        }
    }

    pub fn key_press(&mut self, ev: &KeyEvent) -> KeyOutcome {
        if let Some(f) = self.callbacks.key_press.as_mut() {
            if f(ev) {
                return KeyOutcome::Consumed;
            }
        }

        match ev.key {
            Key::Tab if ev.modifiers.shift => KeyOutcome::FocusPrev,
            Key::Tab => KeyOutcome::FocusNext,
            Key::F(1) => {
                if !ev.repeat {
                    self.show_fps = !self.show_fps;
                }
                KeyOutcome::Consumed
            }
            Key::F(3) => {
                if !ev.repeat {
                    self.defaults.set_vsync(!self.defaults.vsync());
                }
                KeyOutcome::Consumed
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Returns whether the callback consumed the release.
    pub fn key_release(&mut self, ev: &KeyEvent) -> bool {
        self.callbacks
            .key_release
            .as_mut()
            .is_some_and(|f| f(ev))
    }

    pub fn focus_in(&mut self) {
        self.has_focus = true;
    }

    pub fn focus_out(&mut self) {
        self.has_focus = false;
        self.zoom.reset();
    }

    pub fn has_input_focus(&self) -> bool {
        self.has_focus
    }
}

impl Drop for RenderSurface {
    fn drop(&mut self) {
        if self.context.is_some() {
            log::warn!("surface dropped without dispose()");
        }
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::coords::Rect;
    use crate::device::headless::{ContextLog, HeadlessBackend, HeadlessTarget};
    use crate::input::{Modifiers, MouseWheelDelta};

    struct Fixture {
        backend: Rc<HeadlessBackend>,
        group: Rc<ContextGroup>,
        defaults: Rc<RenderDefaults>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                backend: HeadlessBackend::new(),
                group: ContextGroup::new(),
                defaults: RenderDefaults::new(),
            }
        }

        fn surface(&self, w: u32, h: u32) -> (RenderSurface, Rc<ContextLog>) {
            let target = HeadlessTarget::new(&self.backend, w, h);
            let log = target.log();
            let surface =
                RenderSurface::new(Box::new(target), self.group.clone(), self.defaults.clone());
            (surface, log)
        }

        fn ready_surface(&self, w: u32, h: u32) -> (RenderSurface, Rc<ContextLog>) {
            let (mut surface, log) = self.surface(w, h);
            surface.initialize().unwrap();
            (surface, log)
        }
    }

    fn pixel(image: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
        image.get_pixel(x, y).0
    }

    fn key(key: Key) -> KeyEvent {
        KeyEvent::new(key, Modifiers::NONE)
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    #[test]
    fn initialize_runs_init_scene_with_size() {
        let fx = Fixture::new();
        let seen = Rc::new(Cell::new((0, 0)));
        let (surface, _) = fx.surface(32, 16);
        let seen2 = seen.clone();
        let mut surface = surface
            .with_callbacks(SurfaceCallbacks::new().on_init_scene(move |w, h| seen2.set((w, h))));

        assert_eq!(surface.state(), SurfaceState::Uninitialized);
        surface.initialize().unwrap();
        assert_eq!(surface.state(), SurfaceState::Ready);
        assert_eq!(seen.get(), (32, 16));
        assert!(fx.group.device().is_some());
        surface.dispose();
    }

    #[test]
    fn dispose_is_idempotent_and_releases_once() {
        let fx = Fixture::new();
        let (mut surface, log) = fx.ready_surface(8, 8);

        surface.dispose();
        surface.dispose();
        assert_eq!(surface.state(), SurfaceState::Disposed);
        assert_eq!(log.releases(), 1);
        assert!(surface.device().is_none());

        assert!(matches!(surface.initialize(), Err(SurfaceError::Disposed)));
        surface.paint();
        assert_eq!(log.presents(), 0);
        drop(surface);
        assert_eq!(log.releases(), 1);
    }

    #[test]
    fn dispose_before_initialize_is_safe() {
        let fx = Fixture::new();
        let (mut surface, log) = fx.surface(8, 8);
        surface.dispose();
        surface.dispose();
        assert_eq!(log.contexts_created(), 0);
        assert_eq!(log.releases(), 0);
        assert_eq!(surface.resource_stats(), ResourceStats::default());
    }

    #[test]
    fn drop_disposes_surface() {
        let fx = Fixture::new();
        let (surface, log) = fx.ready_surface(8, 8);
        drop(surface);
        assert_eq!(log.releases(), 1);
        assert!(fx.group.device().is_none());
    }

    #[test]
    fn failed_context_is_not_retried() {
        let fx = Fixture::new();
        let target = HeadlessTarget::failing(&fx.backend, "no adapter");
        let log = target.log();
        let mut surface = RenderSurface::new(Box::new(target), fx.group.clone(), fx.defaults.clone());

        assert!(matches!(surface.initialize(), Err(SurfaceError::ContextCreation(_))));
        assert_eq!(surface.state(), SurfaceState::Uninitialized);
        assert!(surface.init_error().is_some_and(|e| e.contains("no adapter")));

        assert!(matches!(surface.initialize(), Err(SurfaceError::ContextCreation(_))));
        surface.paint();
        assert_eq!(log.contexts_created(), 0);
        assert_eq!(log.presents(), 0);
        assert!(matches!(surface.take_screenshot(), Err(SurfaceError::NotReady)));
        surface.dispose();
    }

    #[test]
    fn zero_sized_target_initializes_after_resize() {
        let fx = Fixture::new();
        let (mut surface, log) = fx.surface(0, 0);

        assert!(matches!(surface.initialize(), Err(SurfaceError::NotReady)));
        assert_eq!(surface.state(), SurfaceState::Uninitialized);
        assert!(surface.init_error().is_none());
        assert!(surface.awaits_initialize());
        assert_eq!(log.contexts_created(), 0);

        surface.resize(64, 64);
        assert!(surface.initialize().is_ok());
        assert!(surface.is_ready());
        assert!(!surface.awaits_initialize());

        surface.paint();
        assert_eq!(log.contexts_created(), 1);
        assert_eq!(log.presents(), 1);
        surface.dispose();
    }

    #[test]
    fn surfaces_in_a_group_share_one_device() {
        let fx = Fixture::new();
        let (mut a, _) = fx.ready_surface(8, 8);
        let (mut b, _) = fx.ready_surface(4, 4);
        assert!(Rc::ptr_eq(a.device().unwrap(), b.device().unwrap()));
        assert_eq!(fx.backend.devices_created(), 1);
        a.dispose();
        b.dispose();
    }

    // ---------------------------------------------------------------------
    // Paint cycle
    // ---------------------------------------------------------------------

    #[test]
    fn paint_without_callback_presents_cleared_frame() {
        let fx = Fixture::new();
        let (mut surface, log) = fx.ready_surface(4, 4);

        let image = surface.take_screenshot().unwrap();
        assert_eq!(log.presents(), 1);
        assert_eq!(pixel(&image, 0, 0), [0x23, 0x23, 0x23, 0xff]);
        assert_eq!(pixel(&image, 3, 3), [0x23, 0x23, 0x23, 0xff]);
        surface.dispose();
    }

    #[test]
    fn time_is_monotonic_across_paints() {
        let fx = Fixture::new();
        let (mut surface, _) = fx.ready_surface(4, 4);
        let start = Instant::now();

        let mut last = surface.time();
        for offset_ms in [16, 32, 10, 48, 48, 2000] {
            surface.paint_at(start + Duration::from_millis(offset_ms));
            assert!(surface.time() >= last);
            last = surface.time();
        }
        assert!(surface.current_fps() > 0.0);
        surface.dispose();
    }

    #[test]
    fn paint_callback_receives_elapsed_seconds_and_view() {
        let fx = Fixture::new();
        let (surface, _) = fx.surface(20, 10);
        let dts = Rc::new(RefCell::new(Vec::new()));
        let dts2 = dts.clone();
        let mut surface = surface.with_callbacks(SurfaceCallbacks::new().on_paint_scene(
            move |painter, dt| {
                let state = painter.state();
                assert_eq!(state.surface_size, (20, 10));
                assert_eq!(state.viewport.width, 20);
                dts2.borrow_mut().push(dt);
                painter.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::white());
            },
        ));
        surface.initialize().unwrap();

        let start = Instant::now();
        surface.paint_at(start + Duration::from_millis(100));
        let image = surface.take_screenshot().unwrap();

        assert_eq!(dts.borrow().len(), 2);
        assert!(dts.borrow()[0] > 0.0);
        assert_eq!(pixel(&image, 5, 5), [255, 255, 255, 255]);
        assert_eq!(pixel(&image, 15, 5), [0x23, 0x23, 0x23, 0xff]);
        surface.dispose();
    }

    #[test]
    fn clear_color_override_and_reset() {
        let fx = Fixture::new();
        let (mut surface, _) = fx.ready_surface(2, 2);
        let red = Color::from_rgba8(255, 0, 0, 255);

        surface.set_clear_color(red);
        assert_eq!(surface.effective_clear_color(), red);
        assert_eq!(pixel(&surface.take_screenshot().unwrap(), 0, 0), [255, 0, 0, 255]);

        surface.reset_clear_color();
        assert_eq!(surface.effective_clear_color(), fx.defaults.clear_color());
        assert_eq!(
            pixel(&surface.take_screenshot().unwrap(), 0, 0),
            [0x23, 0x23, 0x23, 0xff]
        );
        surface.dispose();
    }

    #[test]
    fn surfaces_share_default_clear_color() {
        let fx = Fixture::new();
        fx.defaults.set_clear_color(Color::from_rgba8(0x23, 0x23, 0x23, 0xff));
        let (mut a, _) = fx.ready_surface(3, 3);
        let (mut b, _) = fx.ready_surface(5, 5);

        let pa = pixel(&a.take_screenshot().unwrap(), 1, 1);
        let pb = pixel(&b.take_screenshot().unwrap(), 1, 1);
        assert_eq!(pa, pb);
        assert_eq!(pa, [0x23, 0x23, 0x23, 0xff]);

        fx.defaults.set_clear_color(Color::black());
        assert_eq!(pixel(&a.take_screenshot().unwrap(), 0, 0), [0, 0, 0, 255]);
        a.dispose();
        b.dispose();
    }

    #[test]
    fn zero_sized_target_skips_frames() {
        let fx = Fixture::new();
        let (mut surface, log) = fx.ready_surface(4, 4);
        surface.resize(0, 0);
        surface.paint();
        assert_eq!(log.presents(), 0);
        assert!(surface.time() > 0.0);

        surface.resize(6, 3);
        let image = surface.take_screenshot().unwrap();
        assert_eq!(image.dimensions(), (6, 3));
        surface.dispose();
    }

    #[test]
    fn skipped_screenshot_leaves_no_capture_pending() {
        let fx = Fixture::new();
        let (mut surface, log) = fx.ready_surface(4, 4);
        surface.resize(0, 0);
        assert!(matches!(surface.take_screenshot(), Err(SurfaceError::CaptureUnavailable)));

        surface.resize(4, 4);
        surface.paint();
        assert_eq!(log.presents(), 1);
        assert_eq!(log.captures(), 0);

        assert!(surface.take_screenshot().is_ok());
        assert_eq!(log.captures(), 1);
        surface.dispose();
    }

    #[test]
    fn paint_applies_default_filters() {
        let fx = Fixture::new();
        let (mut surface, _) = fx.ready_surface(2, 2);
        fx.defaults.set_min_filter(crate::device::MinFilter::Bilinear);
        surface.paint();

        let device = surface.device().unwrap().clone();
        device.borrow_mut().make_texture("t", 1, 1, &[0; 4]).unwrap();
        let info = device.borrow_mut().find_texture("t").unwrap();
        assert_eq!(info.min_filter, crate::device::MinFilter::Bilinear);
        surface.dispose();
    }

    // ---------------------------------------------------------------------
    // Vsync
    // ---------------------------------------------------------------------

    #[test]
    fn only_one_surface_owns_vsync() {
        let fx = Fixture::new();
        let (mut a, log_a) = fx.ready_surface(2, 2);
        let (mut b, log_b) = fx.ready_surface(2, 2);
        assert!(log_a.vsync());
        assert!(!log_b.vsync());

        a.dispose();
        b.paint();
        assert!(b.vsync());
        assert_eq!(log_b.vsync_changes(), 1);

        fx.defaults.set_vsync(false);
        b.paint();
        assert!(!b.vsync());
        assert_eq!(log_b.vsync_changes(), 2);
        b.dispose();
    }

    #[test]
    fn f3_toggles_vsync_wish() {
        let fx = Fixture::new();
        let (mut surface, _) = fx.ready_surface(2, 2);
        assert_eq!(surface.key_press(&key(Key::F(3))), KeyOutcome::Consumed);
        assert!(!fx.defaults.vsync());
        surface.paint();
        assert!(!surface.vsync());
        surface.dispose();
    }

    // ---------------------------------------------------------------------
    // Resources
    // ---------------------------------------------------------------------

    #[test]
    fn deleted_texture_is_gone_after_end_frame() {
        let fx = Fixture::new();
        let (mut surface, _) = fx.ready_surface(2, 2);
        let device = surface.device().unwrap().clone();
        device.borrow_mut().make_texture("sprite", 2, 2, &[1; 16]).unwrap();
        assert_eq!(surface.resource_stats().textures, 1);

        fx.group.begin_frame();
        surface.paint();
        surface.delete_texture("sprite");
        assert_eq!(surface.resource_stats().textures, 1);
        assert!(fx.group.end_frame());
        assert_eq!(surface.resource_stats().textures, 0);
        surface.dispose();
    }

    #[test]
    fn reload_drops_shaders_and_textures() {
        let fx = Fixture::new();
        let (surface, _) = fx.surface(4, 4);
        let mut surface = surface.with_callbacks(SurfaceCallbacks::new().on_paint_scene(
            |painter, _| painter.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white()),
        ));
        surface.initialize().unwrap();
        surface.paint();
        surface.device().unwrap().borrow_mut().make_texture("t", 1, 1, &[0; 4]).unwrap();

        let stats = surface.resource_stats();
        assert_eq!((stats.textures, stats.programs, stats.shaders), (1, 1, 1));

        surface.reload_shaders();
        surface.reload_textures();
        let stats = surface.resource_stats();
        assert_eq!((stats.textures, stats.programs, stats.shaders), (0, 0, 0));

        surface.paint();
        assert_eq!(surface.resource_stats().programs, 1);
        surface.dispose();
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    #[test]
    fn consumed_key_skips_focus_navigation() {
        let fx = Fixture::new();
        let (surface, _) = fx.surface(2, 2);
        let consume = Rc::new(Cell::new(true));
        let consume2 = consume.clone();
        let mut surface = surface
            .with_callbacks(SurfaceCallbacks::new().on_key_press(move |_| consume2.get()));

        assert_eq!(surface.key_press(&key(Key::Tab)), KeyOutcome::Consumed);
        consume.set(false);
        assert_eq!(surface.key_press(&key(Key::Tab)), KeyOutcome::FocusNext);
        assert_eq!(
            surface.key_press(&KeyEvent::new(Key::Tab, Modifiers::SHIFT)),
            KeyOutcome::FocusPrev
        );
        assert_eq!(surface.key_press(&key(Key::Char('a'))), KeyOutcome::Ignored);
    }

    #[test]
    fn f1_toggles_fps_display_unless_repeat() {
        let fx = Fixture::new();
        let (mut surface, _) = fx.surface(2, 2);
        surface.key_press(&key(Key::F(1)));
        assert!(surface.show_fps());

        let mut repeat = key(Key::F(1));
        repeat.repeat = true;
        assert_eq!(surface.key_press(&repeat), KeyOutcome::Consumed);
        assert!(surface.show_fps());
    }

    #[test]
    fn wheel_with_ctrl_fires_zoom_steps() {
        let fx = Fixture::new();
        let (surface, _) = fx.surface(2, 2);
        let zoom = Rc::new(Cell::new(0i32));
        let wheels = Rc::new(Cell::new(0));
        let (zin, zout, w) = (zoom.clone(), zoom.clone(), wheels.clone());
        let mut surface = surface.with_callbacks(
            SurfaceCallbacks::new()
                .on_zoom_in(move || zin.set(zin.get() + 1))
                .on_zoom_out(move || zout.set(zout.get() - 1))
                .on_mouse_wheel(move |_| w.set(w.get() + 1)),
        );

        let wheel = |y: f32, modifiers| WheelEvent {
            x: 0.0,
            y: 0.0,
            delta: MouseWheelDelta::Line { x: 0.0, y },
            modifiers,
        };
        surface.mouse_wheel(&wheel(2.0, Modifiers::CTRL));
        assert_eq!(zoom.get(), 2);
        surface.mouse_wheel(&wheel(-1.0, Modifiers::CTRL));
        assert_eq!(zoom.get(), 1);
        surface.mouse_wheel(&wheel(3.0, Modifiers::NONE));
        assert_eq!(zoom.get(), 1);
        assert_eq!(wheels.get(), 3);
    }

    #[test]
    fn input_events_reach_callbacks_and_focus() {
        let fx = Fixture::new();
        let (surface, _) = fx.surface(2, 2);
        let last = Rc::new(Cell::new((0.0f32, 0.0f32)));
        let doubles = Rc::new(Cell::new(0));
        let (l, d) = (last.clone(), doubles.clone());
        let mut surface = surface.with_callbacks(
            SurfaceCallbacks::new()
                .on_mouse_move(move |ev| l.set((ev.x, ev.y)))
                .on_mouse_double_click(move |_| d.set(d.get() + 1)),
        );

        let ev = MouseEvent { x: 3.5, y: 7.25, button: None, modifiers: Modifiers::NONE };
        assert_eq!(surface.handle_input(&InputEvent::MouseMove(ev)), KeyOutcome::Ignored);
        surface.handle_input(&InputEvent::MouseDoubleClick(ev));
        let (x, y) = last.get();
        assert_approx_eq!(x, 3.5);
        assert_approx_eq!(y, 7.25);
        assert_eq!(doubles.get(), 1);

        surface.handle_input(&InputEvent::FocusIn);
        assert!(surface.has_input_focus());
        surface.handle_input(&InputEvent::FocusOut);
        assert!(!surface.has_input_focus());
    }

    #[test]
    fn cursor_follows_shape_and_mode() {
        let fx = Fixture::new();
        let (mut surface, log) = fx.ready_surface(2, 2);
        assert_eq!(log.cursor(), (CursorShape::Arrow, MouseCursor::Native));

        surface.set_cursor_shape(CursorShape::CrossHair);
        assert_eq!(log.cursor(), (CursorShape::CrossHair, MouseCursor::Native));

        fx.defaults.set_mouse_cursor(MouseCursor::Custom);
        surface.paint();
        assert_eq!(log.cursor(), (CursorShape::CrossHair, MouseCursor::Custom));
        surface.dispose();
    }
}
