//! Interval throttling on a monotonic clock.

use std::time::{Duration, Instant};

/// Fires at most once per `interval`.
///
/// The throttle starts armed at its creation instant, so the first
/// [`ready`](Self::ready) returns `true` only after a full interval has
/// elapsed. A zero interval fires on every check.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Instant,
}

impl Throttle {
    /// Create a throttle whose first window starts now
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    /// Create a throttle whose first window starts at `start`
    #[must_use]
    pub fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last: start,
        }
    }

    /// Configured minimum interval between firings
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Instant of the last firing (or of creation)
    #[must_use]
    pub fn last_fired(&self) -> Instant {
        self.last
    }

    /// Check against the current instant, see [`ready_at`](Self::ready_at).
    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    /// Returns `true` and starts a new window if at least `interval` has
    /// elapsed between the last firing and `now`.
    ///
    /// An instant earlier than the last firing counts as zero elapsed time.
    pub fn ready_at(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_always_fires() {
        let start = Instant::now();
        let mut throttle = Throttle::starting_at(Duration::ZERO, start);
        assert!(throttle.ready_at(start));
        assert!(throttle.ready_at(start));
        assert!(throttle.ready());
    }

    #[test]
    fn waits_for_full_interval() {
        let start = Instant::now();
        let mut throttle = Throttle::starting_at(Duration::from_secs(10), start);

        assert!(!throttle.ready_at(start + Duration::from_secs(9)));
        assert!(throttle.ready_at(start + Duration::from_secs(10)));
        assert_eq!(throttle.last_fired(), start + Duration::from_secs(10));

        // New window starts at the firing instant.
        assert!(!throttle.ready_at(start + Duration::from_secs(15)));
        assert!(throttle.ready_at(start + Duration::from_secs(20)));
    }

    #[test]
    fn earlier_instant_does_not_fire() {
        let start = Instant::now() + Duration::from_secs(5);
        let mut throttle = Throttle::starting_at(Duration::from_secs(1), start);
        assert!(!throttle.ready_at(start - Duration::from_secs(3)));
        assert_eq!(throttle.last_fired(), start);
    }

    #[test]
    fn reports_interval() {
        let throttle = Throttle::new(Duration::from_millis(250));
        assert_eq!(throttle.interval(), Duration::from_millis(250));
    }
}
