use std::collections::HashSet;

use super::types::{Modifiers, MouseButton};

/// Pointer and modifier state tracked per window.
///
/// winit reports modifiers and cursor position as separate events; button and
/// wheel events need both, so the translator keeps them here.
#[derive(Debug, Default)]
pub struct PointerState {
    pub modifiers: Modifiers,

    /// Pointer position in logical pixels, `None` when outside the window.
    pub pointer_pos: Option<(f32, f32)>,

    pub buttons_down: HashSet<MouseButton>,
}

impl PointerState {
    pub fn position(&self) -> (f32, f32) {
        self.pointer_pos.unwrap_or((0.0, 0.0))
    }

    /// Forget held buttons; called on focus loss to avoid stuck buttons.
    pub fn release_all(&mut self) {
        self.buttons_down.clear();
    }
}
