//! Platform event translation.

pub mod winit;

pub use self::winit::WinitInput;
