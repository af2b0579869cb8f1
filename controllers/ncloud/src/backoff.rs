//! # Fibonacci Backoff
//!
//! Provides the progressive interval used between status polls. It grows more
//! slowly than exponential backoff, which suits resources that take anywhere
//! from seconds (subnets) to many minutes (Kubernetes clusters) to settle.
//!
//! Sequence for a 2s minimum and 20s cap: 2s, 2s, 4s, 6s, 10s, 16s, 20s (max).

use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, capped at `max`.
#[derive(Debug, Clone)]
pub struct PollBackoff {
    prev: Duration,
    current: Duration,
    max: Duration,
}

impl PollBackoff {
    /// Create a new backoff starting at `min` and capped at `max`
    ///
    /// A `max` below `min` is raised to `min`.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            prev: Duration::ZERO,
            current: min,
            max: max.max(min),
        }
    }

    /// Get the next delay and advance the sequence
    pub fn next_delay(&mut self) -> Duration {
        let result = self.current;
        let next = self.prev.saturating_add(self.current);
        self.prev = self.current;
        self.current = next.min(self.max);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = PollBackoff::new(secs(2), secs(20));

        assert_eq!(backoff.next_delay(), secs(2));
        assert_eq!(backoff.next_delay(), secs(2));
        assert_eq!(backoff.next_delay(), secs(4));
        assert_eq!(backoff.next_delay(), secs(6));
        assert_eq!(backoff.next_delay(), secs(10));
        assert_eq!(backoff.next_delay(), secs(16));
        assert_eq!(backoff.next_delay(), secs(20)); // max
    }

    #[test]
    fn test_fibonacci_backoff_max_cap() {
        let mut backoff = PollBackoff::new(secs(1), secs(3));
        let delays: Vec<_> = (0..6).map(|_| backoff.next_delay()).collect();
        assert_eq!(delays, vec![secs(1), secs(1), secs(2), secs(3), secs(3), secs(3)]);
    }

    #[test]
    fn test_fixed_interval_when_max_equals_min() {
        let mut backoff = PollBackoff::new(secs(5), secs(1));
        assert_eq!(backoff.next_delay(), secs(5));
        assert_eq!(backoff.next_delay(), secs(5));
        assert_eq!(backoff.next_delay(), secs(5));
    }
}
