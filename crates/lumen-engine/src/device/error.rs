use thiserror::Error;

/// Errors reported by device resource operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("texture '{name}' has an invalid size {width}x{height}")]
    InvalidTextureSize { name: String, width: u32, height: u32 },

    #[error("texture '{name}' expects {expected} bytes of RGBA data, got {actual}")]
    TextureDataSize { name: String, expected: usize, actual: usize },
}
