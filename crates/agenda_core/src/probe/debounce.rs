//! Time-injected debouncer.
//!
//! # Responsibility
//! - Coalesce bursts of input into a single value once the input has been
//!   stable for the configured delay.
//!
//! # Invariants
//! - At most one value is pending; a new push replaces it and restarts the
//!   delay window. Intermediate values are dropped, never queued.
//! - A pending value is emitted at most once.
//! - The debouncer never reads the clock; callers pass `now`.

use std::time::{Duration, Instant};

/// Debounces a stream of values over a fixed quiet window.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records `value` as the latest input observed at `now`.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.delay,
        });
    }

    /// Emits the pending value if its quiet window has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => {
                self.pending.take().map(|pending| pending.value)
            }
            _ => None,
        }
    }

    /// Deadline of the pending value, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops the pending value without emitting it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;
    use std::time::{Duration, Instant};

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn emits_last_value_after_quiet_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.push("m", start);
        debouncer.push("me", start + Duration::from_millis(100));
        debouncer.push("meu", start + Duration::from_millis(200));

        assert_eq!(debouncer.poll(start + Duration::from_millis(650)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(700)), Some("meu"));
    }

    #[test]
    fn emits_at_most_once_per_quiet_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.push(1, start);
        assert_eq!(debouncer.poll(start + DELAY), Some(1));
        assert_eq!(debouncer.poll(start + DELAY * 3), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn every_push_resets_the_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.push("a", start);
        assert_eq!(debouncer.deadline(), Some(start + DELAY));

        let later = start + Duration::from_millis(400);
        debouncer.push("b", later);
        assert_eq!(debouncer.deadline(), Some(later + DELAY));
        assert_eq!(debouncer.poll(start + DELAY), None);
    }

    #[test]
    fn cancel_drops_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.push("a", start);
        debouncer.cancel();
        assert_eq!(debouncer.deadline(), None);
        assert_eq!(debouncer.poll(start + DELAY), None);
    }

    #[test]
    fn random_bursts_emit_last_value_of_each_burst() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        let mut emitted = Vec::new();

        // Two bursts separated by a gap longer than the delay.
        let inputs = [(0, 1), (120, 2), (480, 3), (1_500, 4), (1_600, 5)];
        let mut clock_ms = 0;
        for (at_ms, value) in inputs {
            while clock_ms < at_ms {
                clock_ms += 10;
                if let Some(v) = debouncer.poll(start + Duration::from_millis(clock_ms)) {
                    emitted.push(v);
                }
            }
            debouncer.push(value, start + Duration::from_millis(at_ms));
        }
        while let Some(deadline) = debouncer.deadline() {
            if let Some(v) = debouncer.poll(deadline) {
                emitted.push(v);
            }
        }

        assert_eq!(emitted, vec![3, 5]);
    }
}
