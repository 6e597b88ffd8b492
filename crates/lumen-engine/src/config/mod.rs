//! Persisted rendering settings.

mod settings;

pub use settings::{ConfigError, SurfaceSettings};
