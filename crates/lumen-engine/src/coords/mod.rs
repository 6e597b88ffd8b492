//! Coordinate and geometry types shared by painters and devices.
//!
//! Canonical CPU space:
//! - pixels, origin top-left
//! - +X right, +Y down

mod rect;
mod vec2;

pub use rect::{PixelRect, Rect};
pub use vec2::Vec2;
