use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbaImage;
use winit::window::{CursorIcon, Window};

use crate::device::SharedDevice;
use crate::surface::{Acquire, CursorShape, MouseCursor, SurfaceContext, SurfaceTarget};

use super::device::FrameTarget;
use super::readback::Capture;
use super::{GpuInit, WgpuDevice};

/// Owns the wgpu instance and hands out the shared `WgpuDevice`.
///
/// The device is created against the first window's surface and dropped
/// once the last context using it is gone.
pub struct WgpuBackend {
    instance: wgpu::Instance,
    init: GpuInit,
    device: RefCell<Option<Weak<RefCell<WgpuDevice>>>>,
}

impl WgpuBackend {
    pub fn new(init: GpuInit) -> Rc<Self> {
        // Use all backends to allow wgpu to select the optimal platform backend.
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        Rc::new(Self {
            instance,
            init,
            device: RefCell::new(None),
        })
    }

    pub fn init(&self) -> &GpuInit {
        &self.init
    }

    fn shared_device(&self, surface: &wgpu::Surface<'_>) -> Result<Rc<RefCell<WgpuDevice>>> {
        if let Some(device) = self.device.borrow().as_ref().and_then(Weak::upgrade) {
            return Ok(device);
        }
        let device = pollster::block_on(WgpuDevice::new(&self.instance, surface, &self.init))?;
        let device = Rc::new(RefCell::new(device));
        *self.device.borrow_mut() = Some(Rc::downgrade(&device));
        Ok(device)
    }
}

/// A winit window as a render target.
pub struct WgpuTarget {
    backend: Rc<WgpuBackend>,
    window: Arc<Window>,
}

impl WgpuTarget {
    pub fn new(backend: &Rc<WgpuBackend>, window: Arc<Window>) -> Self {
        Self {
            backend: backend.clone(),
            window,
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl SurfaceTarget for WgpuTarget {
    fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    // The window's inner size is authoritative.
    fn resize(&mut self, _width: u32, _height: u32) {}

    fn create_context(&mut self, vsync: bool) -> Result<Box<dyn SurfaceContext>> {
        let size = self.window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let surface = self
            .backend
            .instance
            .create_surface(self.window.clone())
            .context("failed to create wgpu surface")?;
        let device = self.backend.shared_device(&surface)?;

        let init = &self.backend.init;
        let (config, present_modes) = {
            let dev = device.borrow();
            let caps = surface.get_capabilities(dev.adapter());
            let format = choose_surface_format(&caps, init.prefer_srgb)
                .context("no supported surface formats")?;

            let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
            if caps.usages.contains(wgpu::TextureUsages::COPY_SRC) {
                usage |= wgpu::TextureUsages::COPY_SRC;
            }

            let config = wgpu::SurfaceConfiguration {
                usage,
                format,
                width: size.width,
                height: size.height,
                present_mode: pick_present_mode(&caps.present_modes, init.present_mode(vsync)),
                alpha_mode: choose_alpha_mode(&caps, init.alpha_mode),
                view_formats: vec![],
                desired_maximum_frame_latency: init.desired_maximum_frame_latency,
            };
            surface.configure(dev.device(), &config);
            (config, caps.present_modes)
        };
        log::debug!(
            "gpu: context {}x{} {:?} {:?}",
            size.width,
            size.height,
            config.format,
            config.present_mode
        );

        Ok(Box::new(WgpuContext {
            surface,
            device,
            present_modes,
            backend: self.backend.clone(),
            config,
            size: (size.width, size.height),
            vsync,
            frame: None,
            capture_requested: false,
            captured: None,
        }))
    }

    fn apply_cursor(&mut self, shape: CursorShape, mode: MouseCursor) {
        let icon = match shape {
            CursorShape::Arrow => CursorIcon::Default,
            CursorShape::CrossHair => CursorIcon::Crosshair,
        };
        self.window.set_cursor(icon);
        self.window.set_cursor_visible(mode == MouseCursor::Native);
    }
}

/// Per-window swapchain bound to the shared device.
pub struct WgpuContext {
    surface: wgpu::Surface<'static>,
    device: Rc<RefCell<WgpuDevice>>,
    present_modes: Vec<wgpu::PresentMode>,
    backend: Rc<WgpuBackend>,
    config: wgpu::SurfaceConfiguration,
    size: (u32, u32),
    vsync: bool,

    /// Texture acquired by `make_current`, presented by `swap_buffers`.
    frame: Option<wgpu::SurfaceTexture>,

    capture_requested: bool,
    captured: Option<RgbaImage>,
}

impl WgpuContext {
    fn reconfigure(&mut self) {
        if self.size.0 == 0 || self.size.1 == 0 {
            return;
        }
        self.surface.configure(self.device.borrow().device(), &self.config);
    }

    fn present_mode(&self, vsync: bool) -> wgpu::PresentMode {
        pick_present_mode(&self.present_modes, self.backend.init().present_mode(vsync))
    }
}

impl SurfaceContext for WgpuContext {
    fn device(&self) -> SharedDevice {
        self.device.clone()
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    /// wgpu does not support configuring a surface with a 0x0 size; in that
    /// case only the stored size changes and configuration waits.
    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }

    fn make_current(&mut self) -> Acquire {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Acquire::Skip;
        }

        let texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Acquire::Skip;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Acquire::Fatal,
            Err(e) => {
                log::debug!("gpu: frame skipped: {e}");
                return Acquire::Skip;
            }
        };

        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut device = self.device.borrow_mut();
        let encoder = device
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen frame encoder"),
            });
        device.bind_target(FrameTarget {
            view,
            encoder,
            format: self.config.format,
            size: self.size,
        });
        self.frame = Some(texture);
        Acquire::Ready
    }

    fn swap_buffers(&mut self) {
        let Some(frame) = self.frame.take() else { return };
        let mut device = self.device.borrow_mut();
        let Some(mut target) = device.take_target() else {
            frame.present();
            return;
        };

        let capture = if std::mem::take(&mut self.capture_requested) {
            if self.config.usage.contains(wgpu::TextureUsages::COPY_SRC) {
                Some(Capture::record(device.device(), &mut target.encoder, &frame.texture))
            } else {
                log::warn!("gpu: surface does not support capture");
                None
            }
        } else {
            None
        };

        device.queue().submit(std::iter::once(target.encoder.finish()));

        if let Some(capture) = capture {
            match capture.read(device.device()) {
                Ok(image) => self.captured = Some(image),
                Err(e) => log::error!("gpu: capture failed: {e:#}"),
            }
        }

        drop(device);
        frame.present();
    }

    fn set_vsync(&mut self, vsync: bool) {
        self.vsync = vsync;
        self.config.present_mode = self.present_mode(vsync);
        self.reconfigure();
    }

    fn vsync(&self) -> bool {
        self.vsync
    }

    fn request_capture(&mut self) {
        self.capture_requested = true;
    }

    fn take_capture(&mut self) -> Option<RgbaImage> {
        self.captured.take()
    }

    fn cancel_capture(&mut self) {
        self.capture_requested = false;
    }

    fn release(&mut self) {
        // An acquired frame is dropped without presenting.
        self.frame = None;
        let _ = self.device.borrow_mut().take_target();
        self.captured = None;
    }
}

fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// `Auto*` modes are always accepted; others fall back to FIFO, which every
/// platform supports.
fn pick_present_mode(supported: &[wgpu::PresentMode], wanted: wgpu::PresentMode) -> wgpu::PresentMode {
    match wanted {
        wgpu::PresentMode::AutoVsync | wgpu::PresentMode::AutoNoVsync => wanted,
        mode if supported.contains(&mode) => mode,
        _ => wgpu::PresentMode::Fifo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_present_mode_falls_back_to_fifo() {
        let supported = [wgpu::PresentMode::Fifo];
        assert_eq!(
            pick_present_mode(&supported, wgpu::PresentMode::Mailbox),
            wgpu::PresentMode::Fifo
        );
        assert_eq!(
            pick_present_mode(&supported, wgpu::PresentMode::AutoNoVsync),
            wgpu::PresentMode::AutoNoVsync
        );
        assert_eq!(
            pick_present_mode(&[wgpu::PresentMode::Immediate], wgpu::PresentMode::Immediate),
            wgpu::PresentMode::Immediate
        );
    }
}
