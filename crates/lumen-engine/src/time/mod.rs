//! Time subsystem.
//!
//! Frame timing utilities with no coupling to the runtime:
//! - one `FrameClock` per surface, ticked once per painted frame
//! - one `FpsCounter` per surface, fed with the clock's deltas

mod fps;
mod frame_clock;

pub use fps::FpsCounter;
pub use frame_clock::{FrameClock, FrameTime};
