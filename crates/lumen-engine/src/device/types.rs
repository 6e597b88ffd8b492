use serde::{Deserialize, Serialize};

use crate::coords::{PixelRect, Rect, Vec2};
use crate::paint::Color;

/// Backend implementing a `Device`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeviceKind {
    Wgpu,
    Headless,
}

/// Texture minification filter.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum MinFilter {
    #[default]
    Nearest,
    Linear,
    Mipmap,
    Bilinear,
    Trilinear,
}

/// Texture magnification filter.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum MagFilter {
    #[default]
    Nearest,
    Linear,
}

/// Counts and sizes of live device resources.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ResourceStats {
    pub textures: usize,
    pub texture_bytes: u64,
    pub shaders: usize,
    pub programs: usize,
}

/// Metadata of a live texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub min_filter: MinFilter,
    pub mag_filter: MagFilter,
}

impl TextureInfo {
    /// RGBA8 storage size.
    pub fn bytes(&self) -> u64 {
        self.width as u64 * self.height as u64 * 4
    }
}

/// Painter state applied to a draw call.
///
/// `view` is the size of the logical top-left view that is mapped onto
/// `viewport` (physical pixels) of a render target sized `surface_size`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawState {
    pub view: Vec2,
    pub viewport: PixelRect,
    pub surface_size: (u32, u32),
}

impl DrawState {
    /// Maps a rect from view units to physical pixels of the render target.
    pub fn to_pixels(&self, rect: Rect) -> Rect {
        let sx = self.viewport.width as f32 / self.view.x.max(f32::EPSILON);
        let sy = self.viewport.height as f32 / self.view.y.max(f32::EPSILON);
        Rect::new(
            self.viewport.x as f32 + rect.origin.x * sx,
            self.viewport.y as f32 + rect.origin.y * sy,
            rect.size.x * sx,
            rect.size.y * sy,
        )
    }
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            view: Vec2::new(1.0, 1.0),
            viewport: PixelRect::from_size(1, 1),
            surface_size: (1, 1),
        }
    }
}

/// A solid, axis-aligned quad in view units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad {
    pub rect: Rect,
    pub color: Color,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_pixels_scales_view_onto_viewport() {
        let state = DrawState {
            view: Vec2::new(100.0, 50.0),
            viewport: PixelRect::new(10, 20, 200, 100),
            surface_size: (400, 300),
        };
        let px = state.to_pixels(Rect::new(50.0, 25.0, 10.0, 10.0));
        assert_eq!(px, Rect::new(110.0, 70.0, 20.0, 20.0));
    }
}
