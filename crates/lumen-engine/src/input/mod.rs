//! Input subsystem.
//!
//! The public API is platform-agnostic. `platform::winit` translates winit
//! window events into `InputEvent`s that a `RenderSurface` consumes.

mod click;
mod state;
mod types;
mod zoom;

pub mod platform;

pub use click::ClickTracker;
pub use state::PointerState;
pub use types::{
    InputEvent,
    Key,
    KeyEvent,
    Modifiers,
    MouseButton,
    MouseEvent,
    MouseWheelDelta,
    WheelEvent,
};
pub use zoom::{ZoomGesture, ZoomStep};
