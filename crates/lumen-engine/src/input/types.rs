use std::fmt;

/// Keyboard key identifier.
///
/// Letters and digits are folded into `Char` (lowercase ASCII); keys that
/// have no variant keep their platform code in `Unknown`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,
    Meta,

    /// `'a'..='z'` or `'0'..='9'`.
    Char(char),

    /// Function key `F1..=F12`.
    F(u8),

    Unknown(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            Key::F(n) => write!(f, "F{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

/// Modifier keys state.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { shift: false, ctrl: false, alt: false, meta: false };
    pub const CTRL: Modifiers = Modifiers { shift: false, ctrl: true, alt: false, meta: false };
    pub const SHIFT: Modifiers = Modifiers { shift: true, ctrl: false, alt: false, meta: false };

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Mouse wheel delta.
///
/// `Line` is notched-wheel style input; `Pixel` is high precision (touchpads).
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MouseWheelDelta {
    Line { x: f32, y: f32 },
    Pixel { x: f32, y: f32 },
}

/// Mouse move/press/release/double-click payload.
///
/// Coordinates are logical pixels relative to the surface; the surface never
/// reinterprets them.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseEvent {
    pub x: f32,
    pub y: f32,
    /// Button that changed state; `None` for moves.
    pub button: Option<MouseButton>,
    pub modifiers: Modifiers,
}

/// Mouse wheel payload.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WheelEvent {
    pub x: f32,
    pub y: f32,
    pub delta: MouseWheelDelta,
    pub modifiers: Modifiers,
}

/// Key press/release payload.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// Stable platform code when available.
    pub code: u32,
    /// True when the event is an auto-repeat.
    pub repeat: bool,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers, code: 0, repeat: false }
    }
}

/// Host-delivered input, already translated from the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MouseMove(MouseEvent),
    MousePress(MouseEvent),
    MouseRelease(MouseEvent),
    MouseDoubleClick(MouseEvent),
    Wheel(WheelEvent),
    KeyPress(KeyEvent),
    KeyRelease(KeyEvent),
    FocusIn,
    FocusOut,
}
