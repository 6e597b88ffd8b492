use crate::input::InputEvent;
use crate::window::RuntimeCtx;

use super::ctx::SurfaceCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by hosts of render surfaces.
pub trait App {
    /// Called once for every window the runtime creates, before the surface
    /// is initialized. Install callbacks and per-surface settings here.
    fn init_surface(&mut self, ctx: &mut SurfaceCtx<'_>);

    /// Called after the surface has handled an input event.
    fn on_input(&mut self, ctx: &mut SurfaceCtx<'_>, event: &InputEvent) -> AppControl {
        let _ = (ctx, event);
        AppControl::Continue
    }

    /// Called once per repaint tick, after every surface has painted.
    fn on_tick(&mut self, runtime: &mut RuntimeCtx) -> AppControl {
        let _ = runtime;
        AppControl::Continue
    }
}
