/// Smoothed frames-per-second estimate.
///
/// Exponential moving average over instantaneous rates (`1 / dt`). The first
/// sample seeds the average directly.
#[derive(Debug, Copy, Clone)]
pub struct FpsCounter {
    alpha: f32,
    current: f32,
    frames: u64,
}

impl FpsCounter {
    /// Smoothing factor used by `Default`.
    pub const DEFAULT_ALPHA: f32 = 0.1;

    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(f32::EPSILON, 1.0),
            current: 0.0,
            frames: 0,
        }
    }

    /// Feeds one frame delta (seconds). Non-positive deltas are ignored.
    pub fn record(&mut self, dt: f64) {
        if !(dt > 0.0) {
            return;
        }
        let instant = (1.0 / dt) as f32;
        self.current = if self.frames == 0 {
            instant
        } else {
            self.current + self.alpha * (instant - self.current)
        };
        self.frames += 1;
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Number of frames recorded since construction or the last reset.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn reset(&mut self) {
        self.current = 0.0;
        self.frames = 0;
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ALPHA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn first_sample_seeds_estimate() {
        let mut fps = FpsCounter::default();
        fps.record(1.0 / 60.0);
        assert_approx_eq!(fps.current(), 60.0, 1e-3);
    }

    #[test]
    fn estimate_moves_towards_new_rate() {
        let mut fps = FpsCounter::new(0.5);
        fps.record(1.0 / 60.0);
        fps.record(1.0 / 30.0);
        assert_approx_eq!(fps.current(), 45.0, 1e-3);
    }

    #[test]
    fn steady_rate_converges() {
        let mut fps = FpsCounter::default();
        fps.record(1.0 / 10.0);
        for _ in 0..200 {
            fps.record(1.0 / 60.0);
        }
        assert_approx_eq!(fps.current(), 60.0, 0.01);
        assert_eq!(fps.frames(), 201);
    }

    #[test]
    fn zero_delta_is_ignored() {
        let mut fps = FpsCounter::default();
        fps.record(0.0);
        assert_eq!(fps.frames(), 0);
        assert_eq!(fps.current(), 0.0);
    }
}
