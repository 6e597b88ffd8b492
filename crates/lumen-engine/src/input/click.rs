use std::time::{Duration, Instant};

use super::types::MouseButton;

/// Detects double-clicks from a stream of button presses.
///
/// winit has no double-click event; a second press of the same button within
/// `interval` and `max_distance` of the first counts as one. A detected
/// double-click consumes both presses, so a triple click is one double-click
/// followed by a fresh first press.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    pub interval: Duration,
    pub max_distance: f32,
    last: Option<(MouseButton, Instant, (f32, f32))>,
}

impl ClickTracker {
    pub fn new(interval: Duration, max_distance: f32) -> Self {
        Self { interval, max_distance, last: None }
    }

    /// Records a press; returns `true` when it completes a double-click.
    pub fn press(&mut self, button: MouseButton, pos: (f32, f32), now: Instant) -> bool {
        if let Some((prev_button, at, prev_pos)) = self.last {
            let dx = pos.0 - prev_pos.0;
            let dy = pos.1 - prev_pos.1;
            let close = (dx * dx + dy * dy).sqrt() <= self.max_distance;
            let quick = now.saturating_duration_since(at) <= self.interval;
            if prev_button == button && close && quick {
                self.last = None;
                return true;
            }
        }
        self.last = Some((button, now, pos));
        false
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(400), 4.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_quick_presses_make_a_double_click() {
        let t0 = Instant::now();
        let mut c = ClickTracker::default();
        assert!(!c.press(MouseButton::Left, (10.0, 10.0), t0));
        assert!(c.press(MouseButton::Left, (11.0, 10.0), t0 + Duration::from_millis(200)));
    }

    #[test]
    fn slow_second_press_is_a_new_click() {
        let t0 = Instant::now();
        let mut c = ClickTracker::default();
        c.press(MouseButton::Left, (0.0, 0.0), t0);
        assert!(!c.press(MouseButton::Left, (0.0, 0.0), t0 + Duration::from_millis(600)));
    }

    #[test]
    fn different_button_or_far_away_does_not_count() {
        let t0 = Instant::now();
        let mut c = ClickTracker::default();
        c.press(MouseButton::Left, (0.0, 0.0), t0);
        assert!(!c.press(MouseButton::Right, (0.0, 0.0), t0));
        assert!(!c.press(MouseButton::Right, (50.0, 0.0), t0));
    }

    #[test]
    fn triple_click_restarts_detection() {
        let t0 = Instant::now();
        let mut c = ClickTracker::default();
        c.press(MouseButton::Left, (0.0, 0.0), t0);
        assert!(c.press(MouseButton::Left, (0.0, 0.0), t0));
        assert!(!c.press(MouseButton::Left, (0.0, 0.0), t0));
    }
}
