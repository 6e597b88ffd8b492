use super::types::{MouseWheelDelta, WheelEvent};

/// Result of feeding one wheel event into a `ZoomGesture`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ZoomStep {
    None,
    In(u32),
    Out(u32),
}

/// Turns raw wheel deltas into discrete zoom steps.
///
/// One wheel line is one step. Pixel deltas (touchpads) accumulate and emit
/// one step per `pixels_per_step`. Partial steps carry over to the next event
/// until the scroll direction flips or the modifier is released.
#[derive(Debug, Clone)]
pub struct ZoomGesture {
    pub pixels_per_step: f32,
    /// Only zoom while Ctrl is held.
    pub require_ctrl: bool,
    pending: f32,
}

impl ZoomGesture {
    pub const DEFAULT_PIXELS_PER_STEP: f32 = 50.0;
    /// Upper bound on steps reported for a single event.
    pub const MAX_STEPS_PER_EVENT: u32 = 16;

    pub fn new(pixels_per_step: f32, require_ctrl: bool) -> Self {
        Self {
            pixels_per_step: pixels_per_step.max(1.0),
            require_ctrl,
            pending: 0.0,
        }
    }

    pub fn feed(&mut self, wheel: &WheelEvent) -> ZoomStep {
        if self.require_ctrl && !wheel.modifiers.ctrl {
            self.pending = 0.0;
            return ZoomStep::None;
        }

        // Only the vertical axis zooms.
        let delta = match wheel.delta {
            MouseWheelDelta::Line { y, .. } => y,
            MouseWheelDelta::Pixel { y, .. } => y / self.pixels_per_step,
        };
        if delta == 0.0 || !delta.is_finite() {
            return ZoomStep::None;
        }
        if delta.signum() != self.pending.signum() {
            self.pending = 0.0;
        }
        self.pending += delta;

        let whole = self.pending.trunc();
        self.pending -= whole;

        let steps = (whole.abs() as u32).min(Self::MAX_STEPS_PER_EVENT);
        match (steps, whole > 0.0) {
            (0, _) => ZoomStep::None,
            (n, true) => ZoomStep::In(n),
            (n, false) => ZoomStep::Out(n),
        }
    }

    pub fn reset(&mut self) {
        self.pending = 0.0;
    }
}

impl Default for ZoomGesture {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PIXELS_PER_STEP, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;

    fn wheel(delta: MouseWheelDelta, modifiers: Modifiers) -> WheelEvent {
        WheelEvent { x: 0.0, y: 0.0, delta, modifiers }
    }

    fn lines(y: f32) -> WheelEvent {
        wheel(MouseWheelDelta::Line { x: 0.0, y }, Modifiers::CTRL)
    }

    fn pixels(y: f32) -> WheelEvent {
        wheel(MouseWheelDelta::Pixel { x: 0.0, y }, Modifiers::CTRL)
    }

    #[test]
    fn line_deltas_map_to_steps() {
        let mut z = ZoomGesture::default();
        assert_eq!(z.feed(&lines(1.0)), ZoomStep::In(1));
        assert_eq!(z.feed(&lines(-3.0)), ZoomStep::Out(3));
    }

    #[test]
    fn pixel_deltas_accumulate_until_threshold() {
        let mut z = ZoomGesture::default();
        assert_eq!(z.feed(&pixels(25.0)), ZoomStep::None);
        assert_eq!(z.feed(&pixels(25.0)), ZoomStep::In(1));
        assert_eq!(z.feed(&pixels(25.0)), ZoomStep::None);
        // Half a step carried over.
        assert_eq!(z.feed(&pixels(75.0)), ZoomStep::In(2));
    }

    #[test]
    fn direction_flip_discards_partial_step() {
        let mut z = ZoomGesture::default();
        assert_eq!(z.feed(&pixels(37.5)), ZoomStep::None);
        assert_eq!(z.feed(&pixels(-37.5)), ZoomStep::None);
        assert_eq!(z.feed(&pixels(-12.5)), ZoomStep::Out(1));
    }

    #[test]
    fn huge_deltas_are_capped() {
        let mut z = ZoomGesture::default();
        assert_eq!(z.feed(&lines(1.0e30)), ZoomStep::In(ZoomGesture::MAX_STEPS_PER_EVENT));
        assert_eq!(z.feed(&pixels(-1.0e12)), ZoomStep::Out(ZoomGesture::MAX_STEPS_PER_EVENT));
        // Nothing left over after a capped event.
        assert_eq!(z.feed(&pixels(-25.0)), ZoomStep::None);
    }

    #[test]
    fn without_ctrl_nothing_happens() {
        let mut z = ZoomGesture::default();
        let ev = wheel(MouseWheelDelta::Line { x: 0.0, y: 5.0 }, Modifiers::NONE);
        assert_eq!(z.feed(&ev), ZoomStep::None);
    }

    #[test]
    fn horizontal_scroll_is_ignored() {
        let mut z = ZoomGesture::default();
        let ev = wheel(MouseWheelDelta::Line { x: 4.0, y: 0.0 }, Modifiers::CTRL);
        assert_eq!(z.feed(&ev), ZoomStep::None);
    }

    #[test]
    fn modifier_requirement_can_be_disabled() {
        let mut z = ZoomGesture::new(50.0, false);
        let ev = wheel(MouseWheelDelta::Line { x: 0.0, y: 2.0 }, Modifiers::NONE);
        assert_eq!(z.feed(&ev), ZoomStep::In(2));
    }
}
