//! Render surface: GPU context + shared device + painter, driven by the host.
//!
//! A surface is created against a `SurfaceTarget` (the native window side),
//! belongs to a `ContextGroup` (surfaces sharing one device and one garbage
//! queue) and reads unset settings from a shared `RenderDefaults`.

mod callbacks;
mod context;
mod cursor;
mod defaults;
mod error;
mod group;
mod render_surface;

pub use callbacks::SurfaceCallbacks;
pub use context::{Acquire, SurfaceContext, SurfaceTarget};
pub use cursor::{CursorShape, MouseCursor};
pub use defaults::RenderDefaults;
pub use error::SurfaceError;
pub use group::{ContextGroup, GARBAGE_IDLE_FRAMES};
pub use render_surface::{KeyOutcome, RenderSurface, SurfaceState};
