use std::time::Instant;

use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::Window;

use crate::input::{
    ClickTracker, InputEvent, Key, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseWheelDelta,
    PointerState, WheelEvent,
};

/// Per-window translator from winit `WindowEvent`s to engine `InputEvent`s.
///
/// Tracks modifiers and pointer position (winit reports them separately) and
/// synthesizes double-clicks.
#[derive(Debug, Default)]
pub struct WinitInput {
    pub pointer: PointerState,
    clicks: ClickTracker,
}

impl WinitInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` for events that are not input or only update tracked state.
    pub fn translate(&mut self, window: &Window, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::ModifiersChanged(m) => {
                self.pointer.modifiers = map_modifiers(m.state());
                None
            }

            WindowEvent::Focused(true) => Some(InputEvent::FocusIn),
            WindowEvent::Focused(false) => {
                self.pointer.release_all();
                self.clicks.reset();
                Some(InputEvent::FocusOut)
            }

            WindowEvent::CursorLeft { .. } => {
                self.pointer.pointer_pos = None;
                None
            }

            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = to_logical_f32(window, *position);
                self.pointer.pointer_pos = Some((x, y));
                Some(InputEvent::MouseMove(MouseEvent {
                    x,
                    y,
                    button: None,
                    modifiers: self.pointer.modifiers,
                }))
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_mouse_button(*button);
                let (x, y) = self.pointer.position();
                let ev = MouseEvent {
                    x,
                    y,
                    button: Some(button),
                    modifiers: self.pointer.modifiers,
                };
                match state {
                    ElementState::Pressed => {
                        self.pointer.buttons_down.insert(button);
                        if self.clicks.press(button, (x, y), Instant::now()) {
                            Some(InputEvent::MouseDoubleClick(ev))
                        } else {
                            Some(InputEvent::MousePress(ev))
                        }
                    }
                    ElementState::Released => {
                        self.pointer.buttons_down.remove(&button);
                        Some(InputEvent::MouseRelease(ev))
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => MouseWheelDelta::Line { x: *x, y: *y },
                    MouseScrollDelta::PixelDelta(p) => {
                        let (x, y) = to_logical_f32(window, *p);
                        MouseWheelDelta::Pixel { x, y }
                    }
                };
                let (x, y) = self.pointer.position();
                Some(InputEvent::Wheel(WheelEvent {
                    x,
                    y,
                    delta,
                    modifiers: self.pointer.modifiers,
                }))
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let (key, code) = map_key(event.physical_key);
                let ev = KeyEvent {
                    key,
                    modifiers: self.pointer.modifiers,
                    code,
                    repeat: event.repeat,
                };
                match event.state {
                    ElementState::Pressed => Some(InputEvent::KeyPress(ev)),
                    ElementState::Released => Some(InputEvent::KeyRelease(ev)),
                }
            }

            _ => None,
        }
    }
}

fn to_logical_f32(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let logical = pos.to_logical::<f64>(window.scale_factor());
    (logical.x as f32, logical.y as f32)
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

const LETTERS: [KeyCode; 26] = [
    KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE,
    KeyCode::KeyF, KeyCode::KeyG, KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ,
    KeyCode::KeyK, KeyCode::KeyL, KeyCode::KeyM, KeyCode::KeyN, KeyCode::KeyO,
    KeyCode::KeyP, KeyCode::KeyQ, KeyCode::KeyR, KeyCode::KeyS, KeyCode::KeyT,
    KeyCode::KeyU, KeyCode::KeyV, KeyCode::KeyW, KeyCode::KeyX, KeyCode::KeyY,
    KeyCode::KeyZ,
];

const DIGITS: [KeyCode; 10] = [
    KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
    KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
];

const FUNCTION_KEYS: [KeyCode; 12] = [
    KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4, KeyCode::F5, KeyCode::F6,
    KeyCode::F7, KeyCode::F8, KeyCode::F9, KeyCode::F10, KeyCode::F11, KeyCode::F12,
];

fn map_key(pk: PhysicalKey) -> (Key, u32) {
    let PhysicalKey::Code(code) = pk else {
        // NativeKeyCode has no stable numeric form.
        return (Key::Unknown(0), 0);
    };

    let key = match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,
        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,
        other => {
            if let Some(i) = LETTERS.iter().position(|c| *c == other) {
                Key::Char((b'a' + i as u8) as char)
            } else if let Some(i) = DIGITS.iter().position(|c| *c == other) {
                Key::Char((b'0' + i as u8) as char)
            } else if let Some(i) = FUNCTION_KEYS.iter().position(|c| *c == other) {
                Key::F(i as u8 + 1)
            } else {
                Key::Unknown(other as u32)
            }
        }
    };

    (key, code as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_digits_and_function_keys_fold() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyQ)).0, Key::Char('q'));
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Digit7)).0, Key::Char('7'));
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::F12)).0, Key::F(12));
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Tab)).0, Key::Tab);
    }
}
