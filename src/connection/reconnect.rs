// Backoff policy for (re)opening the MIDI output port

use std::time::Duration;

/// Exponential backoff: `base * 2^attempt`, capped, for a bounded number of attempts
#[derive(Debug, Clone)]
pub struct ReconnectionStrategy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    current_attempt: u32,
}

impl ReconnectionStrategy {
    pub fn new() -> Self {
        Self::with_limits(10, 1000, 30_000)
    }

    pub fn with_limits(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
            current_attempt: 0,
        }
    }

    /// Never wait, fail on the first error
    pub fn none() -> Self {
        Self::with_limits(0, 0, 0)
    }

    /// Delay before the next attempt, `None` once attempts are exhausted
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.current_attempt >= self.max_attempts {
            return None;
        }

        let factor = 2u64.saturating_pow(self.current_attempt);
        let delay_ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);

        self.current_attempt += 1;

        Some(Duration::from_millis(delay_ms))
    }

    pub fn reset(&mut self) {
        self.current_attempt = 0;
    }

    pub fn should_retry(&self) -> bool {
        self.current_attempt < self.max_attempts
    }

    pub fn current_attempt(&self) -> u32 {
        self.current_attempt
    }
}

impl Default for ReconnectionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let mut strategy = ReconnectionStrategy::new();

        assert_eq!(strategy.next_delay(), Some(Duration::from_millis(1000)));
        assert_eq!(strategy.next_delay(), Some(Duration::from_millis(2000)));
        assert_eq!(strategy.next_delay(), Some(Duration::from_millis(4000)));
        assert_eq!(strategy.next_delay(), Some(Duration::from_millis(8000)));
    }

    #[test]
    fn test_delay_is_capped() {
        let mut strategy = ReconnectionStrategy::with_limits(20, 1000, 30_000);
        let delays: Vec<_> = std::iter::from_fn(|| strategy.next_delay()).collect();
        assert_eq!(delays.len(), 20);
        assert_eq!(*delays.last().unwrap(), Duration::from_millis(30_000));
    }

    #[test]
    fn test_reset() {
        let mut strategy = ReconnectionStrategy::new();

        strategy.next_delay();
        strategy.next_delay();
        assert_eq!(strategy.current_attempt(), 2);

        strategy.reset();
        assert_eq!(strategy.current_attempt(), 0);
        assert!(strategy.should_retry());
    }

    #[test]
    fn test_none_gives_up_immediately() {
        let mut strategy = ReconnectionStrategy::none();
        assert!(!strategy.should_retry());
        assert!(strategy.next_delay().is_none());
    }
}
