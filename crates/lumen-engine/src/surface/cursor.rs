use serde::{Deserialize, Serialize};

/// Who draws the mouse cursor over a surface.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum MouseCursor {
    /// The platform cursor.
    #[default]
    Native,
    /// The application draws its own cursor; the platform cursor is hidden.
    Custom,
}

/// Shape of the native cursor while it is over a surface.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CursorShape {
    #[default]
    Arrow,
    CrossHair,
}
