//! wgpu backend.
//!
//! One `WgpuDevice` (adapter, device, queue, resource caches) is shared by
//! every window of a `WgpuBackend`. Each window gets a `WgpuContext` owning
//! its `wgpu::Surface` and swapchain configuration.

mod context;
mod device;
mod init;
mod readback;

pub use context::{WgpuBackend, WgpuContext, WgpuTarget};
pub use device::WgpuDevice;
pub use init::GpuInit;
