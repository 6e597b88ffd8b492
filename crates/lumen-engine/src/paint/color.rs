use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA color with `f32` channels in `[0, 1]`.
///
/// This is the color type used for clear colors and painter fills. Devices
/// convert to whatever their backend wants (premultiplied, `wgpu::Color`,
/// 8-bit pixels).
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Creates a color from 8-bit channels (`0`–`255`).
    #[inline]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Converts to 8-bit channels, clamping out-of-range values.
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Returns the color with RGB multiplied by alpha.
    #[inline]
    pub fn premultiplied(self) -> Self {
        let a = self.a.clamp(0.0, 1.0);
        Self::new(self.r * a, self.g * a, self.b * a, a)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_survives_conversion() {
        let c = Color::from_rgba8(0x23, 0x23, 0x23, 0xff);
        assert_eq!(c.to_rgba8(), [0x23, 0x23, 0x23, 0xff]);
    }

    #[test]
    fn to_rgba8_clamps() {
        assert_eq!(Color::new(2.0, -1.0, 0.5, 1.0).to_rgba8(), [255, 0, 128, 255]);
    }

    #[test]
    fn premultiplied_scales_rgb_by_alpha() {
        let p = Color::new(1.0, 0.5, 0.0, 0.5).premultiplied();
        assert_eq!(p, Color::new(0.5, 0.25, 0.0, 0.5));
    }
}
