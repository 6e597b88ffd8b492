use crate::coords::{PixelRect, Rect, Vec2};
use crate::paint::Color;

use super::{DrawState, Quad, SharedDevice};

/// Issues draw commands against a shared device for one surface.
///
/// The surface owns its painter exclusively and resets view, viewport and
/// surface size before every paint callback.
pub struct Painter {
    device: SharedDevice,
    state: DrawState,
}

impl Painter {
    pub fn new(device: SharedDevice) -> Self {
        Self {
            device,
            state: DrawState::default(),
        }
    }

    pub fn device(&self) -> &SharedDevice {
        &self.device
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    /// Sets up a top-left origin view of `width x height` logical units.
    pub fn set_top_left_view(&mut self, width: f32, height: f32) {
        self.state.view = Vec2::new(width.max(1.0), height.max(1.0));
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.state.viewport = PixelRect::new(x, y, width, height);
    }

    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.state.surface_size = (width, height);
    }

    /// Clears the whole render target, ignoring the viewport.
    pub fn clear(&mut self, color: Color) {
        self.device.borrow_mut().clear_color(color);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = rect.normalized();
        if rect.is_empty() {
            return;
        }
        self.fill_quads(&[Quad { rect, color }]);
    }

    pub fn fill_quads(&mut self, quads: &[Quad]) {
        if quads.is_empty() || self.state.viewport.is_empty() {
            return;
        }
        self.device.borrow_mut().draw_quads(&self.state, quads);
    }
}
