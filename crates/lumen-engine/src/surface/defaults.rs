use std::cell::Cell;
use std::rc::Rc;

use crate::config::SurfaceSettings;
use crate::device::{MagFilter, MinFilter};
use crate::paint::Color;

use super::MouseCursor;

/// Process-wide rendering defaults.
///
/// One instance is created at startup and shared by `Rc` with every surface.
/// Surfaces read it on each paint, so a setter takes effect on the next frame
/// of every surface that does not override the value.
#[derive(Debug)]
pub struct RenderDefaults {
    min_filter: Cell<MinFilter>,
    mag_filter: Cell<MagFilter>,
    clear_color: Cell<Color>,
    vsync: Cell<bool>,
    mouse_cursor: Cell<MouseCursor>,
}

impl RenderDefaults {
    pub const DEFAULT_CLEAR_COLOR: Color = Color {
        r: 0x23 as f32 / 255.0,
        g: 0x23 as f32 / 255.0,
        b: 0x23 as f32 / 255.0,
        a: 1.0,
    };

    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn from_settings(settings: &SurfaceSettings) -> Rc<Self> {
        let defaults = Self::default();
        defaults.apply_settings(settings);
        Rc::new(defaults)
    }

    pub fn min_filter(&self) -> MinFilter {
        self.min_filter.get()
    }

    pub fn set_min_filter(&self, filter: MinFilter) {
        self.min_filter.set(filter);
    }

    pub fn mag_filter(&self) -> MagFilter {
        self.mag_filter.get()
    }

    pub fn set_mag_filter(&self, filter: MagFilter) {
        self.mag_filter.set(filter);
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color.get()
    }

    pub fn set_clear_color(&self, color: Color) {
        self.clear_color.set(color);
    }

    /// Whether surfaces should present synced to vblank.
    pub fn vsync(&self) -> bool {
        self.vsync.get()
    }

    pub fn set_vsync(&self, vsync: bool) {
        self.vsync.set(vsync);
    }

    pub fn mouse_cursor(&self) -> MouseCursor {
        self.mouse_cursor.get()
    }

    pub fn set_mouse_cursor(&self, mode: MouseCursor) {
        self.mouse_cursor.set(mode);
    }

    /// Overwrites every default from persisted settings. Non-finite colors
    /// are ignored.
    pub fn apply_settings(&self, settings: &SurfaceSettings) {
        if settings.clear_color.is_finite() {
            self.clear_color.set(settings.clear_color);
        } else {
            log::warn!("ignoring non-finite clear color in settings");
        }
        self.vsync.set(settings.vsync);
        self.mouse_cursor.set(settings.mouse_cursor);
        self.min_filter.set(settings.min_filter);
        self.mag_filter.set(settings.mag_filter);
    }

    pub fn settings(&self) -> SurfaceSettings {
        SurfaceSettings {
            clear_color: self.clear_color.get(),
            vsync: self.vsync.get(),
            mouse_cursor: self.mouse_cursor.get(),
            min_filter: self.min_filter.get(),
            mag_filter: self.mag_filter.get(),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            min_filter: Cell::new(MinFilter::default()),
            mag_filter: Cell::new(MagFilter::default()),
            clear_color: Cell::new(Self::DEFAULT_CLEAR_COLOR),
            vsync: Cell::new(true),
            mouse_cursor: Cell::new(MouseCursor::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clear_color_is_dark_grey() {
        let d = RenderDefaults::default();
        assert_eq!(d.clear_color().to_rgba8(), [0x23, 0x23, 0x23, 0xff]);
        assert_eq!(d.min_filter(), MinFilter::Nearest);
        assert_eq!(d.mag_filter(), MagFilter::Nearest);
        assert!(d.vsync());
    }

    #[test]
    fn settings_round_trip_through_defaults() {
        let d = RenderDefaults::default();
        d.set_clear_color(Color::from_rgba8(10, 20, 30, 255));
        d.set_vsync(false);
        d.set_mouse_cursor(MouseCursor::Custom);
        d.set_min_filter(MinFilter::Trilinear);

        let other = RenderDefaults::from_settings(&d.settings());
        assert_eq!(other.settings(), d.settings());
    }

    #[test]
    fn non_finite_clear_color_is_ignored() {
        let d = RenderDefaults::default();
        let mut s = d.settings();
        s.clear_color = Color::new(f32::NAN, 0.0, 0.0, 1.0);
        s.vsync = false;
        d.apply_settings(&s);
        assert_eq!(d.clear_color(), RenderDefaults::DEFAULT_CLEAR_COLOR);
        assert!(!d.vsync());
    }
}
