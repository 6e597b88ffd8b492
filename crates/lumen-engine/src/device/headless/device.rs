use std::cell::RefCell;
use std::rc::Rc;

use crate::coords::PixelRect;
use crate::device::{
    check_texture_data, Device, DeviceError, DeviceKind, DrawState, MagFilter, MinFilter, Quad,
    ResourceCache, ResourceStats, TextureInfo,
};
use crate::paint::Color;

use super::Framebuffer;

const SOLID_SHADER: &str = "headless/solid";
const SOLID_PROGRAM: &str = "headless/solid";

struct Texture {
    info: TextureInfo,
    pixels: Vec<u8>,
}

/// Software device rasterizing into the framebuffer of the current context.
///
/// Shaders and programs carry no code; they exist so that resource
/// bookkeeping (reload, garbage collection, stats) behaves like the GPU
/// backend.
pub struct HeadlessDevice {
    target: Option<Rc<RefCell<Framebuffer>>>,
    textures: ResourceCache<Texture>,
    shaders: ResourceCache<()>,
    programs: ResourceCache<()>,
    min_filter: MinFilter,
    mag_filter: MagFilter,
    frame: u64,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self {
            target: None,
            textures: ResourceCache::new(),
            shaders: ResourceCache::new(),
            programs: ResourceCache::new(),
            min_filter: MinFilter::default(),
            mag_filter: MagFilter::default(),
            frame: 0,
        }
    }

    /// Binds `framebuffer` as the render target for subsequent clears and draws.
    pub(crate) fn bind_target(&mut self, framebuffer: Rc<RefCell<Framebuffer>>) {
        self.target = Some(framebuffer);
    }

    /// Unbinds `framebuffer` if it is the current target.
    pub(crate) fn unbind_target(&mut self, framebuffer: &Rc<RefCell<Framebuffer>>) {
        if self
            .target
            .as_ref()
            .is_some_and(|t| Rc::ptr_eq(t, framebuffer))
        {
            self.target = None;
        }
    }

    /// RGBA8 contents of a texture, without marking it used.
    pub fn texture_pixels(&self, name: &str) -> Option<&[u8]> {
        self.textures.get(name).map(|t| t.pixels.as_slice())
    }

    pub fn default_filters(&self) -> (MinFilter, MagFilter) {
        (self.min_filter, self.mag_filter)
    }

    fn ensure_solid_program(&mut self) {
        let frame = self.frame;
        if self.shaders.touch(SOLID_SHADER, frame).is_none() {
            log::debug!("headless: building shader '{SOLID_SHADER}'");
            self.shaders.insert(SOLID_SHADER, (), frame);
        }
        if self.programs.touch(SOLID_PROGRAM, frame).is_none() {
            log::debug!("headless: building program '{SOLID_PROGRAM}'");
            self.programs.insert(SOLID_PROGRAM, (), frame);
        }
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for HeadlessDevice {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Headless
    }

    fn begin_frame(&mut self) {
        self.frame += 1;
    }

    fn end_frame(&mut self, _display: bool) {}

    fn frame_number(&self) -> u64 {
        self.frame
    }

    fn clear_color(&mut self, color: Color) {
        if let Some(fb) = &self.target {
            fb.borrow_mut().fill(color);
        }
    }

    fn set_default_min_filter(&mut self, filter: MinFilter) {
        self.min_filter = filter;
    }

    fn set_default_mag_filter(&mut self, filter: MagFilter) {
        self.mag_filter = filter;
    }

    fn make_texture(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<(), DeviceError> {
        check_texture_data(name, width, height, rgba)?;
        let info = TextureInfo {
            width,
            height,
            min_filter: self.min_filter,
            mag_filter: self.mag_filter,
        };
        self.textures.insert(
            name,
            Texture { info, pixels: rgba.to_vec() },
            self.frame,
        );
        Ok(())
    }

    fn find_texture(&mut self, name: &str) -> Option<TextureInfo> {
        self.textures.touch(name, self.frame).map(|t| t.info)
    }

    fn delete_texture(&mut self, name: &str) -> bool {
        self.textures.remove(name).is_some()
    }

    fn delete_textures(&mut self) {
        self.textures.clear();
    }

    fn delete_programs(&mut self) {
        self.programs.clear();
    }

    fn delete_shaders(&mut self) {
        self.shaders.clear();
    }

    fn draw_quads(&mut self, state: &DrawState, quads: &[Quad]) {
        let Some(fb) = self.target.clone() else { return };
        self.ensure_solid_program();

        let mut fb = fb.borrow_mut();
        let (w, h) = fb.size();
        let Some(viewport) = state.viewport.clamp_to(w, h) else { return };
        let vx1 = viewport.x + viewport.width as i32;
        let vy1 = viewport.y + viewport.height as i32;

        for quad in quads {
            let px = state.to_pixels(quad.rect.normalized());
            // A pixel is covered when its center is inside the rect.
            let x0 = ((px.origin.x - 0.5).ceil() as i32).max(viewport.x);
            let y0 = ((px.origin.y - 0.5).ceil() as i32).max(viewport.y);
            let x1 = ((px.right() - 0.5).ceil() as i32).min(vx1);
            let y1 = ((px.bottom() - 0.5).ceil() as i32).min(vy1);
            if x1 <= x0 || y1 <= y0 {
                continue;
            }
            fb.blend_rect(
                PixelRect::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32),
                quad.color,
            );
        }
    }

    fn clean_garbage(&mut self, max_idle_frames: u64) -> usize {
        let frame = self.frame;
        self.textures.collect_idle(frame, max_idle_frames)
            + self.programs.collect_idle(frame, max_idle_frames)
            + self.shaders.collect_idle(frame, max_idle_frames)
    }

    fn resource_stats(&self) -> ResourceStats {
        ResourceStats {
            textures: self.textures.len(),
            texture_bytes: self.textures.values().map(|t| t.info.bytes()).sum(),
            shaders: self.shaders.len(),
            programs: self.programs.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Vec2};

    fn state(w: u32, h: u32) -> DrawState {
        DrawState {
            view: Vec2::new(w as f32, h as f32),
            viewport: PixelRect::from_size(w, h),
            surface_size: (w, h),
        }
    }

    #[test]
    fn draws_into_bound_target() {
        let fb = Rc::new(RefCell::new(Framebuffer::new(8, 8)));
        let mut dev = HeadlessDevice::new();
        dev.bind_target(fb.clone());
        dev.begin_frame();
        dev.clear_color(Color::black());
        dev.draw_quads(
            &state(8, 8),
            &[Quad { rect: Rect::new(2.0, 2.0, 2.0, 2.0), color: Color::white() }],
        );
        let fb = fb.borrow();
        assert_eq!(fb.pixel(2, 2), Some([255, 255, 255, 255]));
        assert_eq!(fb.pixel(3, 3), Some([255, 255, 255, 255]));
        assert_eq!(fb.pixel(4, 4), Some([0, 0, 0, 255]));
    }

    #[test]
    fn draw_builds_program_lazily() {
        let fb = Rc::new(RefCell::new(Framebuffer::new(4, 4)));
        let mut dev = HeadlessDevice::new();
        dev.bind_target(fb);
        assert_eq!(dev.resource_stats().programs, 0);
        dev.draw_quads(
            &state(4, 4),
            &[Quad { rect: Rect::new(0.0, 0.0, 1.0, 1.0), color: Color::white() }],
        );
        let stats = dev.resource_stats();
        assert_eq!((stats.programs, stats.shaders), (1, 1));

        dev.delete_programs();
        dev.delete_shaders();
        assert_eq!(dev.resource_stats().programs, 0);
    }

    #[test]
    fn texture_validation_and_stats() {
        let mut dev = HeadlessDevice::new();
        assert!(dev.make_texture("bad", 0, 4, &[]).is_err());
        assert!(dev.make_texture("short", 2, 2, &[0; 3]).is_err());
        dev.make_texture("ok", 2, 2, &[7; 16]).unwrap();
        assert_eq!(dev.texture_pixels("ok"), Some(&[7u8; 16][..]));
        let stats = dev.resource_stats();
        assert_eq!(stats.textures, 1);
        assert_eq!(stats.texture_bytes, 16);
    }

    #[test]
    fn textures_pick_up_default_filters() {
        let mut dev = HeadlessDevice::new();
        dev.set_default_min_filter(MinFilter::Trilinear);
        dev.set_default_mag_filter(MagFilter::Linear);
        dev.make_texture("t", 1, 1, &[0; 4]).unwrap();
        let info = dev.find_texture("t").unwrap();
        assert_eq!(info.min_filter, MinFilter::Trilinear);
        assert_eq!(info.mag_filter, MagFilter::Linear);
    }

    #[test]
    fn garbage_collects_idle_textures() {
        let mut dev = HeadlessDevice::new();
        dev.make_texture("old", 1, 1, &[0; 4]).unwrap();
        dev.make_texture("hot", 1, 1, &[0; 4]).unwrap();
        for _ in 0..10 {
            dev.begin_frame();
            dev.find_texture("hot");
        }
        assert_eq!(dev.clean_garbage(5), 1);
        assert!(dev.find_texture("hot").is_some());
        assert!(dev.find_texture("old").is_none());
    }
}
