//! Color model shared between surfaces, painters and devices.

mod color;

pub use color::Color;
