use image::RgbaImage;

use crate::device::SharedDevice;

use super::{CursorShape, MouseCursor};

/// Native window side of a surface.
///
/// Implemented by each backend for whatever it renders into (a winit
/// window, an off-screen framebuffer). The surface keeps its target alive
/// until after `dispose()`, so contexts may borrow the native handle.
pub trait SurfaceTarget {
    /// Current drawable size in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Records a host resize. Called whether or not a context exists yet.
    fn resize(&mut self, width: u32, height: u32);

    /// Creates the rendering context. Shared devices are reused across
    /// targets of the same backend.
    fn create_context(&mut self, vsync: bool) -> anyhow::Result<Box<dyn SurfaceContext>>;

    /// Applies cursor shape and visibility.
    fn apply_cursor(&mut self, shape: CursorShape, mode: MouseCursor);
}

/// Outcome of acquiring a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Acquire {
    /// The device is bound to this context's next frame.
    Ready,
    /// Transient failure; skip this frame.
    Skip,
    /// Unrecoverable; the surface should stop rendering.
    Fatal,
}

/// A created GPU context bound to one target.
pub trait SurfaceContext {
    fn device(&self) -> SharedDevice;

    /// Drawable size in physical pixels.
    fn size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32);

    /// Binds the shared device to this context's next frame.
    fn make_current(&mut self) -> Acquire;

    /// Presents the frame acquired by `make_current`.
    fn swap_buffers(&mut self);

    /// Reconfigures the presentation with or without sync to vblank.
    fn set_vsync(&mut self, vsync: bool);

    fn vsync(&self) -> bool;

    /// Asks the next `swap_buffers` to keep a copy of the frame.
    fn request_capture(&mut self);

    /// Takes the frame captured by the last `swap_buffers`, if any.
    fn take_capture(&mut self) -> Option<RgbaImage>;

    /// Drops a pending capture request that no frame served.
    fn cancel_capture(&mut self);

    /// Releases native resources. Called exactly once, by `dispose()`.
    fn release(&mut self);
}
