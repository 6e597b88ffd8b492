//! Lumen engine crate.
//!
//! Owns the render surface (GPU context + shared device + painter), its frame
//! lifecycle and the platform runtime that hosts surfaces in winit windows.

pub mod coords;
pub mod paint;
pub mod time;
pub mod input;
pub mod device;
pub mod surface;
pub mod scheduler;
pub mod config;

pub mod logging;
pub mod core;
pub mod window;
