use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::{MagFilter, MinFilter};
use crate::paint::Color;
use crate::surface::{MouseCursor, RenderDefaults};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rendering settings as stored on disk.
///
/// Missing fields fall back to the built-in defaults, so older files keep
/// loading as fields are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSettings {
    pub clear_color: Color,
    pub vsync: bool,
    pub mouse_cursor: MouseCursor,
    pub min_filter: MinFilter,
    pub mag_filter: MagFilter,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            clear_color: RenderDefaults::DEFAULT_CLEAR_COLOR,
            vsync: true,
            mouse_cursor: MouseCursor::default(),
            min_filter: MinFilter::default(),
            mag_filter: MagFilter::default(),
        }
    }
}

impl SurfaceSettings {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let settings = SurfaceSettings {
            clear_color: Color::from_rgba8(1, 2, 3, 255),
            vsync: false,
            mouse_cursor: MouseCursor::Custom,
            min_filter: MinFilter::Mipmap,
            mag_filter: MagFilter::Linear,
        };
        let json = settings.to_json().unwrap();
        assert_eq!(SurfaceSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let s = SurfaceSettings::from_json(r#"{ "vsync": false }"#).unwrap();
        assert!(!s.vsync);
        assert_eq!(s.clear_color, RenderDefaults::DEFAULT_CLEAR_COLOR);
        assert_eq!(s.min_filter, MinFilter::Nearest);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            SurfaceSettings::from_json("{ vsync: nope"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn file_round_trip_and_missing_file() {
        let dir = std::env::temp_dir().join(format!("lumen-settings-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lumen.json");

        let settings = SurfaceSettings { vsync: false, ..Default::default() };
        settings.save(&path).unwrap();
        assert_eq!(SurfaceSettings::load(&path).unwrap(), settings);

        let missing = dir.join("missing.json");
        assert_eq!(SurfaceSettings::load_or_default(&missing).unwrap(), SurfaceSettings::default());
        assert!(matches!(SurfaceSettings::load(&missing), Err(ConfigError::Io(_))));

        fs::remove_dir_all(&dir).unwrap();
    }
}
