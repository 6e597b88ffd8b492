//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and
//! applications hosting render surfaces. It keeps runtime internals out of
//! user code.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{SurfaceCtx, WindowCtx};
