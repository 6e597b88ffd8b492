use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The target could not create a rendering context.
    #[error("failed to create rendering context: {0}")]
    ContextCreation(String),

    /// The surface has not been initialized (or initialization failed).
    #[error("surface is not ready")]
    NotReady,

    #[error("surface has been disposed")]
    Disposed,

    /// The frame was painted but the context produced no capture.
    #[error("frame capture unavailable")]
    CaptureUnavailable,
}
