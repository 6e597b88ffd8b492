use std::time::{Duration, Instant};

/// Periodic repaint timer.
///
/// The runtime sleeps until `next_due()` and calls `poll()` on wake-up.
/// Missed ticks are coalesced: a late poll fires once and the schedule
/// restarts from that moment.
#[derive(Debug, Clone)]
pub struct RepaintTimer {
    interval: Duration,
    next: Option<Instant>,
}

impl RepaintTimer {
    pub const DEFAULT_HZ: u32 = 60;

    pub fn new(hz: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / hz.max(1),
            next: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedules the first tick one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next
    }

    /// Returns true when a tick is due at `now`, and schedules the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next else { return false };
        if now < due {
            return false;
        }
        let mut next = due + self.interval;
        if next <= now {
            next = now + self.interval;
        }
        self.next = Some(next);
        true
    }
}

impl Default for RepaintTimer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_interval() {
        let t0 = Instant::now();
        let mut timer = RepaintTimer::new(50);
        assert!(!timer.poll(t0));

        timer.start(t0);
        assert_eq!(timer.interval(), Duration::from_millis(20));
        assert!(!timer.poll(t0 + Duration::from_millis(10)));
        assert!(timer.poll(t0 + Duration::from_millis(20)));
        assert_eq!(timer.next_due(), Some(t0 + Duration::from_millis(40)));
        assert!(!timer.poll(t0 + Duration::from_millis(30)));
    }

    #[test]
    fn late_poll_coalesces_missed_ticks() {
        let t0 = Instant::now();
        let mut timer = RepaintTimer::new(50);
        timer.start(t0);

        let late = t0 + Duration::from_millis(95);
        assert!(timer.poll(late));
        assert_eq!(timer.next_due(), Some(late + Duration::from_millis(20)));
        assert!(!timer.poll(late));
    }

    #[test]
    fn stop_disarms() {
        let t0 = Instant::now();
        let mut timer = RepaintTimer::default();
        timer.start(t0);
        timer.stop();
        assert!(!timer.is_running());
        assert!(!timer.poll(t0 + Duration::from_secs(1)));
    }
}
