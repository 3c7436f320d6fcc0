//! Cancellable timers driven by an externally supplied clock.
//!
//! Nothing in here reads the system clock: every call takes the current
//! `Instant`, so a host event loop (or a test) decides when time advances.

use std::time::{Duration, Instant};

/// Default delay between the last resize event and the re-layout.
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 200;

/// A one-shot timer that only fires for the last arm in a burst.
///
/// Re-arming replaces the pending deadline, so a rapid series of
/// `arm` calls results in a single fire `delay` after the final one.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    /// Create a disarmed debounce with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Get the debounce delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm (or re-arm) the timer relative to `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drop any pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Check if a fire is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Pending deadline, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once when the deadline has passed, disarming the timer.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_RESIZE_DEBOUNCE_MS))
    }
}

/// A periodic timer. Each fire schedules the next one a full period later.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    next: Option<Instant>,
}

impl Interval {
    /// Create a stopped interval.
    pub fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Change the period. A running interval is rescheduled from `now`.
    pub fn set_period(&mut self, period: Duration, now: Instant) {
        self.period = period;
        if self.next.is_some() {
            self.next = Some(now + period);
        }
    }

    /// Start (or restart) the interval; the first fire is one period from `now`.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// When the next fire is due, if running.
    pub fn next_fire(&self) -> Option<Instant> {
        self.next
    }

    /// Returns true when a period has elapsed.
    ///
    /// Missed periods are coalesced into a single fire.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next {
            Some(next) if now >= next => {
                self.next = Some(now + self.period);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_debounce_fires_once_after_delay() {
        let t0 = Instant::now();
        let mut debounce = Debounce::new(ms(200));
        assert!(!debounce.poll(t0));

        debounce.arm(t0);
        assert!(debounce.is_armed());
        assert!(!debounce.poll(t0 + ms(199)));
        assert!(debounce.poll(t0 + ms(200)));
        assert!(!debounce.poll(t0 + ms(500)));
        assert!(!debounce.is_armed());
    }

    #[test]
    fn test_debounce_rearm_supersedes_pending() {
        let t0 = Instant::now();
        let mut debounce = Debounce::new(ms(200));

        debounce.arm(t0);
        debounce.arm(t0 + ms(150));
        debounce.arm(t0 + ms(300));

        // The earlier deadlines no longer apply.
        assert!(!debounce.poll(t0 + ms(350)));
        assert!(debounce.poll(t0 + ms(500)));
    }

    #[test]
    fn test_debounce_cancel() {
        let t0 = Instant::now();
        let mut debounce = Debounce::default();
        assert_eq!(debounce.delay(), ms(DEFAULT_RESIZE_DEBOUNCE_MS));

        debounce.arm(t0);
        debounce.cancel();
        assert!(!debounce.poll(t0 + ms(1_000)));
    }

    #[test]
    fn test_interval_periodic() {
        let t0 = Instant::now();
        let mut interval = Interval::new(ms(1_000));
        assert!(!interval.poll(t0 + ms(5_000)), "stopped interval never fires");

        interval.start(t0);
        assert!(!interval.poll(t0 + ms(999)));
        assert!(interval.poll(t0 + ms(1_000)));
        assert!(!interval.poll(t0 + ms(1_500)));
        assert!(interval.poll(t0 + ms(2_000)));
    }

    #[test]
    fn test_interval_coalesces_missed_periods() {
        let t0 = Instant::now();
        let mut interval = Interval::new(ms(100));
        interval.start(t0);

        assert!(interval.poll(t0 + ms(1_000)));
        assert!(!interval.poll(t0 + ms(1_050)));
        assert!(interval.poll(t0 + ms(1_100)));
    }

    #[test]
    fn test_interval_stop_and_set_period() {
        let t0 = Instant::now();
        let mut interval = Interval::new(ms(100));
        interval.start(t0);
        interval.set_period(ms(500), t0 + ms(50));
        assert!(!interval.poll(t0 + ms(200)));
        assert!(interval.poll(t0 + ms(550)));

        interval.stop();
        assert!(!interval.is_running());
        assert!(!interval.poll(t0 + ms(10_000)));
    }
}
