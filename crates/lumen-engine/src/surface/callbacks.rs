use crate::device::Painter;
use crate::input::{KeyEvent, MouseEvent, WheelEvent};

type PaintFn = Box<dyn FnMut(&mut Painter, f64)>;
type InitFn = Box<dyn FnMut(u32, u32)>;
type MouseFn = Box<dyn FnMut(&MouseEvent)>;
type WheelFn = Box<dyn FnMut(&WheelEvent)>;
type KeyFn = Box<dyn FnMut(&KeyEvent) -> bool>;
type ZoomFn = Box<dyn FnMut()>;

/// Host-supplied behavior of a surface. Unset callbacks are no-ops.
///
/// Key callbacks return whether they consumed the key; a consumed key skips
/// the surface's built-in handling.
#[derive(Default)]
pub struct SurfaceCallbacks {
    pub(crate) paint_scene: Option<PaintFn>,
    pub(crate) init_scene: Option<InitFn>,
    pub(crate) mouse_move: Option<MouseFn>,
    pub(crate) mouse_press: Option<MouseFn>,
    pub(crate) mouse_release: Option<MouseFn>,
    pub(crate) mouse_double_click: Option<MouseFn>,
    pub(crate) mouse_wheel: Option<WheelFn>,
    pub(crate) key_press: Option<KeyFn>,
    pub(crate) key_release: Option<KeyFn>,
    pub(crate) zoom_in: Option<ZoomFn>,
    pub(crate) zoom_out: Option<ZoomFn>,
}

impl SurfaceCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called every frame with the painter and the seconds since the last frame.
    pub fn on_paint_scene(mut self, f: impl FnMut(&mut Painter, f64) + 'static) -> Self {
        self.paint_scene = Some(Box::new(f));
        self
    }

    /// Called once after the context is created, with the surface size.
    pub fn on_init_scene(mut self, f: impl FnMut(u32, u32) + 'static) -> Self {
        self.init_scene = Some(Box::new(f));
        self
    }

    pub fn on_mouse_move(mut self, f: impl FnMut(&MouseEvent) + 'static) -> Self {
        self.mouse_move = Some(Box::new(f));
        self
    }

    pub fn on_mouse_press(mut self, f: impl FnMut(&MouseEvent) + 'static) -> Self {
        self.mouse_press = Some(Box::new(f));
        self
    }

    pub fn on_mouse_release(mut self, f: impl FnMut(&MouseEvent) + 'static) -> Self {
        self.mouse_release = Some(Box::new(f));
        self
    }

    pub fn on_mouse_double_click(mut self, f: impl FnMut(&MouseEvent) + 'static) -> Self {
        self.mouse_double_click = Some(Box::new(f));
        self
    }

    pub fn on_mouse_wheel(mut self, f: impl FnMut(&WheelEvent) + 'static) -> Self {
        self.mouse_wheel = Some(Box::new(f));
        self
    }

    pub fn on_key_press(mut self, f: impl FnMut(&KeyEvent) -> bool + 'static) -> Self {
        self.key_press = Some(Box::new(f));
        self
    }

    pub fn on_key_release(mut self, f: impl FnMut(&KeyEvent) -> bool + 'static) -> Self {
        self.key_release = Some(Box::new(f));
        self
    }

    pub fn on_zoom_in(mut self, f: impl FnMut() + 'static) -> Self {
        self.zoom_in = Some(Box::new(f));
        self
    }

    pub fn on_zoom_out(mut self, f: impl FnMut() + 'static) -> Self {
        self.zoom_out = Some(Box::new(f));
        self
    }
}
