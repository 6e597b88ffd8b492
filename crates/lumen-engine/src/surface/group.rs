use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::device::{Device, SharedDevice};

/// Resources unused for this many frames are released by `clean_garbage`.
pub const GARBAGE_IDLE_FRAMES: u64 = 120;

static NEXT_GROUP_ID: AtomicU32 = AtomicU32::new(1);

/// Surfaces sharing one device and one garbage queue.
///
/// The host brackets each pass over the group's surfaces with
/// `begin_frame`/`end_frame`. Texture deletions requested mid-frame are
/// deferred to `end_frame`, after every surface has drawn.
pub struct ContextGroup {
    id: u32,
    device: RefCell<Option<Weak<RefCell<dyn Device>>>>,
    in_frame: Cell<bool>,
    pending_deletes: RefCell<Vec<String>>,
    vsync_owned: Cell<bool>,
}

impl ContextGroup {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            id: NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed),
            device: RefCell::new(None),
            in_frame: Cell::new(false),
            pending_deletes: RefCell::new(Vec::new()),
            vsync_owned: Cell::new(false),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Records the device created by a member surface. The group never keeps
    /// the device alive on its own.
    pub(crate) fn attach_device(&self, device: &SharedDevice) {
        let mut slot = self.device.borrow_mut();
        if let Some(current) = slot.as_ref().and_then(Weak::upgrade) {
            if !Rc::ptr_eq(&current, device) {
                log::warn!("context group {}: replacing shared device", self.id);
            }
        }
        *slot = Some(Rc::downgrade(device));
    }

    /// The group's device, while any member surface still holds it.
    pub fn device(&self) -> Option<SharedDevice> {
        self.device.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn in_frame(&self) -> bool {
        self.in_frame.get()
    }

    pub fn begin_frame(&self) {
        if self.in_frame.replace(true) {
            log::warn!("context group {}: begin_frame called twice", self.id);
        }
    }

    /// Closes the frame bracket, then flushes deferred texture deletions and
    /// collects garbage. Returns whether any resource was released; an
    /// unbalanced call returns `false` and does nothing.
    pub fn end_frame(&self) -> bool {
        if !self.in_frame.replace(false) {
            log::warn!("context group {}: end_frame without begin_frame", self.id);
            return false;
        }

        let pending = std::mem::take(&mut *self.pending_deletes.borrow_mut());
        let Some(device) = self.device() else {
            if !pending.is_empty() {
                log::debug!(
                    "context group {}: dropping {} texture deletions, no device",
                    self.id,
                    pending.len()
                );
            }
            return false;
        };

        let mut released = 0;
        {
            let mut device = device.borrow_mut();
            for name in &pending {
                if device.delete_texture(name) {
                    released += 1;
                }
            }
        }
        released += self.clean_garbage();
        released > 0
    }

    /// Releases device resources idle for more than `GARBAGE_IDLE_FRAMES`.
    pub fn clean_garbage(&self) -> usize {
        let Some(device) = self.device() else { return 0 };
        let released = device.borrow_mut().clean_garbage(GARBAGE_IDLE_FRAMES);
        if released > 0 {
            log::debug!("context group {}: released {released} idle resources", self.id);
        }
        released
    }

    /// Queues `name` for deletion at the next `end_frame`.
    pub fn delete_texture(&self, name: impl Into<String>) {
        self.pending_deletes.borrow_mut().push(name.into());
    }

    pub fn pending_deletes(&self) -> usize {
        self.pending_deletes.borrow().len()
    }

    pub(crate) fn vsync_owned(&self) -> bool {
        self.vsync_owned.get()
    }

    pub(crate) fn set_vsync_owned(&self, owned: bool) {
        self.vsync_owned.set(owned);
    }
}
