use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use image::RgbaImage;

use crate::device::SharedDevice;
use crate::surface::{Acquire, CursorShape, MouseCursor, SurfaceContext, SurfaceTarget};

use super::{Framebuffer, HeadlessDevice};

/// Hands out the single shared `HeadlessDevice`.
///
/// The backend only keeps a weak reference: once every context using the
/// device is gone, the next context creates a fresh one.
#[derive(Default)]
pub struct HeadlessBackend {
    device: RefCell<Weak<RefCell<HeadlessDevice>>>,
    devices_created: Cell<usize>,
}

impl HeadlessBackend {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn shared_device(&self) -> Rc<RefCell<HeadlessDevice>> {
        if let Some(device) = self.device.borrow().upgrade() {
            return device;
        }
        let device = Rc::new(RefCell::new(HeadlessDevice::new()));
        *self.device.borrow_mut() = Rc::downgrade(&device);
        self.devices_created.set(self.devices_created.get() + 1);
        log::debug!("headless: created device");
        device
    }

    /// How many devices this backend has created so far.
    pub fn devices_created(&self) -> usize {
        self.devices_created.get()
    }
}

/// Observable record of what happened to a headless target's contexts.
#[derive(Debug, Default)]
pub struct ContextLog {
    contexts_created: Cell<usize>,
    presents: Cell<usize>,
    captures: Cell<usize>,
    releases: Cell<usize>,
    vsync_changes: Cell<usize>,
    vsync: Cell<bool>,
    cursor: Cell<(CursorShape, MouseCursor)>,
}

impl ContextLog {
    pub fn contexts_created(&self) -> usize {
        self.contexts_created.get()
    }

    pub fn presents(&self) -> usize {
        self.presents.get()
    }

    /// Presented frames that were copied for a capture.
    pub fn captures(&self) -> usize {
        self.captures.get()
    }

    pub fn releases(&self) -> usize {
        self.releases.get()
    }

    pub fn vsync_changes(&self) -> usize {
        self.vsync_changes.get()
    }

    /// Vsync setting of the most recent context.
    pub fn vsync(&self) -> bool {
        self.vsync.get()
    }

    pub fn cursor(&self) -> (CursorShape, MouseCursor) {
        self.cursor.get()
    }
}

fn bump(c: &Cell<usize>) {
    c.set(c.get() + 1);
}

/// Off-screen target of a fixed (resizable) pixel size.
pub struct HeadlessTarget {
    backend: Rc<HeadlessBackend>,
    size: Rc<Cell<(u32, u32)>>,
    log: Rc<ContextLog>,
    failure: Option<String>,
}

impl HeadlessTarget {
    pub fn new(backend: &Rc<HeadlessBackend>, width: u32, height: u32) -> Self {
        Self {
            backend: backend.clone(),
            size: Rc::new(Cell::new((width, height))),
            log: Rc::new(ContextLog::default()),
            failure: None,
        }
    }

    /// A target whose context creation always fails with `reason`.
    pub fn failing(backend: &Rc<HeadlessBackend>, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new(backend, 1, 1)
        }
    }

    pub fn log(&self) -> Rc<ContextLog> {
        self.log.clone()
    }
}

impl SurfaceTarget for HeadlessTarget {
    fn size(&self) -> (u32, u32) {
        self.size.get()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size.set((width, height));
    }

    fn create_context(&mut self, vsync: bool) -> anyhow::Result<Box<dyn SurfaceContext>> {
        if let Some(reason) = &self.failure {
            anyhow::bail!("headless context refused: {reason}");
        }
        let (w, h) = self.size.get();
        anyhow::ensure!(w > 0 && h > 0, "target has zero size");

        bump(&self.log.contexts_created);
        self.log.vsync.set(vsync);

        Ok(Box::new(HeadlessContext {
            device: self.backend.shared_device(),
            framebuffer: Rc::new(RefCell::new(Framebuffer::new(w, h))),
            size: self.size.clone(),
            log: self.log.clone(),
            vsync,
            capture_requested: false,
            captured: None,
        }))
    }

    fn apply_cursor(&mut self, shape: CursorShape, mode: MouseCursor) {
        self.log.cursor.set((shape, mode));
    }
}

/// Context presenting into a private framebuffer.
pub struct HeadlessContext {
    device: Rc<RefCell<HeadlessDevice>>,
    framebuffer: Rc<RefCell<Framebuffer>>,
    size: Rc<Cell<(u32, u32)>>,
    log: Rc<ContextLog>,
    vsync: bool,
    capture_requested: bool,
    captured: Option<RgbaImage>,
}

impl HeadlessContext {
    pub fn framebuffer(&self) -> Rc<RefCell<Framebuffer>> {
        self.framebuffer.clone()
    }
}

impl SurfaceContext for HeadlessContext {
    fn device(&self) -> SharedDevice {
        self.device.clone()
    }

    fn size(&self) -> (u32, u32) {
        self.framebuffer.borrow().size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size.set((width, height));
        if width > 0 && height > 0 {
            self.framebuffer.borrow_mut().resize(width, height);
        }
    }

    fn make_current(&mut self) -> Acquire {
        let (w, h) = self.size.get();
        if w == 0 || h == 0 {
            return Acquire::Skip;
        }
        self.device.borrow_mut().bind_target(self.framebuffer.clone());
        Acquire::Ready
    }

    fn swap_buffers(&mut self) {
        bump(&self.log.presents);
        if std::mem::take(&mut self.capture_requested) {
            bump(&self.log.captures);
            self.captured = Some(self.framebuffer.borrow().to_image());
        }
        self.device.borrow_mut().unbind_target(&self.framebuffer);
    }

    fn set_vsync(&mut self, vsync: bool) {
        self.vsync = vsync;
        self.log.vsync.set(vsync);
        bump(&self.log.vsync_changes);
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
        bump(&self.log.releases);
        self.device.borrow_mut().unbind_target(&self.framebuffer);
        self.captured = None;
    }
}
