//! Graphics device abstraction and backends.
//!
//! A `Device` owns GPU resources (textures, shaders, programs) and executes
//! clears and draws for whichever surface context is current. Devices are
//! shared between all surfaces of a `ContextGroup` through `SharedDevice`;
//! each surface owns its own `Painter`.
//!
//! Backends:
//! - `gpu`: wgpu device + winit window targets
//! - `headless`: software framebuffer, no GPU required

mod cache;
mod error;
mod painter;
mod traits;
mod types;

pub mod gpu;
pub mod headless;

pub(crate) use cache::ResourceCache;
pub(crate) use traits::check_texture_data;
pub use traits::{Device, SharedDevice};
pub use error::DeviceError;
pub use painter::Painter;
pub use types::{
    DeviceKind, DrawState, MagFilter, MinFilter, Quad, ResourceStats, TextureInfo,
};
