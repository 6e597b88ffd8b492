use std::cell::RefCell;
use std::rc::Rc;

use crate::paint::Color;

use super::types::{DeviceKind, DrawState, MagFilter, MinFilter, Quad, ResourceStats, TextureInfo};
use super::DeviceError;

/// Device handle shared by every surface and painter of a context group.
///
/// Single-threaded by construction: all access happens on the event-loop
/// thread, so `Rc<RefCell<_>>` is enough.
pub type SharedDevice = Rc<RefCell<dyn Device>>;

/// Graphics device: resource pools plus clear/draw against the current target.
///
/// Resources are named. Every lookup or use stamps the resource with the
/// current frame number; `clean_garbage` drops whatever has been idle for too
/// long. Deleted programs and shaders are rebuilt lazily on next use.
pub trait Device {
    fn kind(&self) -> DeviceKind;

    /// Starts a frame on the current render target.
    fn begin_frame(&mut self);

    /// Finishes the frame. `display` is a request to present as well; surfaces
    /// pass `false` and present through their own context.
    fn end_frame(&mut self, display: bool);

    /// Number of frames begun on this device.
    fn frame_number(&self) -> u64;

    /// Clears the whole current render target.
    fn clear_color(&mut self, color: Color);

    fn set_default_min_filter(&mut self, filter: MinFilter);
    fn set_default_mag_filter(&mut self, filter: MagFilter);

    /// Creates or replaces a named RGBA8 texture using the default filters.
    fn make_texture(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<(), DeviceError>;

    /// Looks up a texture and marks it used this frame.
    fn find_texture(&mut self, name: &str) -> Option<TextureInfo>;

    /// Deletes a texture immediately. Returns whether it existed.
    fn delete_texture(&mut self, name: &str) -> bool;

    fn delete_textures(&mut self);
    fn delete_programs(&mut self);
    fn delete_shaders(&mut self);

    /// Fills solid quads into the current render target.
    fn draw_quads(&mut self, state: &DrawState, quads: &[Quad]);

    /// Deletes resources idle for more than `max_idle_frames` frames.
    /// Returns how many were released.
    fn clean_garbage(&mut self, max_idle_frames: u64) -> usize;

    fn resource_stats(&self) -> ResourceStats;
}

/// Validates RGBA8 texture input shared by all backends.
pub(crate) fn check_texture_data(
    name: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<(), DeviceError> {
    if width == 0 || height == 0 {
        return Err(DeviceError::InvalidTextureSize {
            name: name.to_string(),
            width,
            height,
        });
    }
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(DeviceError::TextureDataSize {
            name: name.to_string(),
            expected,
            actual: rgba.len(),
        });
    }
    Ok(())
}
