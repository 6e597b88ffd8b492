//! Software backend.
//!
//! Renders into CPU framebuffers. Used for tests, off-screen rendering and
//! machines without a usable GPU. Mirrors the wgpu backend's sharing model:
//! one `HeadlessDevice` per backend, one framebuffer per target.

mod device;
mod framebuffer;
mod target;

pub use device::HeadlessDevice;
pub use framebuffer::Framebuffer;
pub use target::{ContextLog, HeadlessBackend, HeadlessContext, HeadlessTarget};
