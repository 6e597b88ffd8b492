use image::RgbaImage;

use crate::coords::PixelRect;
use crate::paint::Color;

/// RGBA8 pixel buffer, rows top to bottom.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Reallocates to the new size; contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        *self = Self::new(width, height);
    }

    pub fn fill(&mut self, color: Color) {
        let px = color.to_rgba8();
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Source-over blends `color` into `area` (already clipped to the buffer).
    pub fn blend_rect(&mut self, area: PixelRect, color: Color) {
        let Some(area) = area.clamp_to(self.width, self.height) else { return };
        let src = color.premultiplied();
        let inv = 1.0 - src.a;
        let stride = self.width as usize * 4;

        for y in area.y as usize..area.y as usize + area.height as usize {
            let row = &mut self.pixels[y * stride..(y + 1) * stride];
            for x in area.x as usize..area.x as usize + area.width as usize {
                let p = &mut row[x * 4..x * 4 + 4];
                let dst_a = p[3] as f32 / 255.0;
                let out = Color::new(
                    src.r + p[0] as f32 / 255.0 * dst_a * inv,
                    src.g + p[1] as f32 / 255.0 * dst_a * inv,
                    src.b + p[2] as f32 / 255.0 * dst_a * inv,
                    src.a + dst_a * inv,
                );
                // Back to straight alpha for storage.
                let stored = if out.a > 0.0 {
                    Color::new(out.r / out.a, out.g / out.a, out.b / out.a, out.a)
                } else {
                    Color::transparent()
                };
                p.copy_from_slice(&stored.to_rgba8());
            }
        }
    }

    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_sets_every_pixel() {
        let mut fb = Framebuffer::new(3, 2);
        fb.fill(Color::from_rgba8(1, 2, 3, 255));
        assert_eq!(fb.pixel(0, 0), Some([1, 2, 3, 255]));
        assert_eq!(fb.pixel(2, 1), Some([1, 2, 3, 255]));
        assert_eq!(fb.pixel(3, 0), None);
    }

    #[test]
    fn opaque_blend_replaces_pixels_inside_area_only() {
        let mut fb = Framebuffer::new(4, 4);
        fb.fill(Color::black());
        fb.blend_rect(PixelRect::new(1, 1, 2, 2), Color::white());
        assert_eq!(fb.pixel(1, 1), Some([255, 255, 255, 255]));
        assert_eq!(fb.pixel(2, 2), Some([255, 255, 255, 255]));
        assert_eq!(fb.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(fb.pixel(3, 3), Some([0, 0, 0, 255]));
    }

    #[test]
    fn half_transparent_blend_mixes() {
        let mut fb = Framebuffer::new(1, 1);
        fb.fill(Color::black());
        fb.blend_rect(PixelRect::new(0, 0, 1, 1), Color::new(1.0, 1.0, 1.0, 0.5));
        assert_eq!(fb.pixel(0, 0), Some([128, 128, 128, 255]));
    }

    #[test]
    fn image_has_buffer_size() {
        let fb = Framebuffer::new(5, 7);
        let img = fb.to_image();
        assert_eq!((img.width(), img.height()), (5, 7));
    }
}
