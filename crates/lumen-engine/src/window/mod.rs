//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and windows, and hosts one `RenderSurface` per
//! window on the shared wgpu device.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
