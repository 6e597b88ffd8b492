use winit::window::{Window, WindowId};

use crate::surface::RenderSurface;
use crate::window::RuntimeCtx;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id:     WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Returns the logical window size as `(width, height)` in logical pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        let phys  = self.window.inner_size();
        let scale = self.window.scale_factor();
        let logi: winit::dpi::LogicalSize<f64> = phys.to_logical(scale);
        (logi.width as f32, logi.height as f32)
    }
}

/// Context passed to `core::App` callbacks that concern one window.
pub struct SurfaceCtx<'a> {
    pub window:  WindowCtx<'a>,
    pub surface: &'a mut RenderSurface,
    pub runtime: &'a mut RuntimeCtx,
}
