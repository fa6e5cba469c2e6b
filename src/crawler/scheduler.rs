//! Pacing between navigations
//!
//! Every navigation is followed by a randomized pause drawn uniformly from the
//! configured window before the page is handed to the decoder. The session is
//! strictly sequential, so the pause also bounds the request rate.

use crate::config::PacingConfig;
use rand::Rng;
use std::time::Duration;

/// Randomized post-navigation pause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Pacer {
    /// Creates a pacer drawing pauses from `[min, max]`
    ///
    /// The bounds are swapped if given in the wrong order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draws the next pause length
    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    /// Sleeps for a freshly drawn pause
    pub async fn pause(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        tracing::trace!("Pausing for {}ms", delay.as_millis());
        tokio::time::sleep(delay).await;
    }
}

impl From<&PacingConfig> for Pacer {
    fn from(config: &PacingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_delay),
            Duration::from_millis(config.max_delay),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_window() {
        let pacer = Pacer::new(Duration::from_millis(1000), Duration::from_millis(3000));
        for _ in 0..200 {
            let delay = pacer.next_delay();
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(3000));
        }
    }

    #[test]
    fn test_swapped_bounds() {
        let pacer = Pacer::new(Duration::from_secs(5), Duration::from_secs(2));
        assert_eq!(pacer.min(), Duration::from_secs(2));
        assert_eq!(pacer.max(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_config() {
        let pacer = Pacer::from(&PacingConfig {
            min_delay: 5000,
            max_delay: 15000,
        });
        assert_eq!(pacer.min(), Duration::from_secs(5));
        assert_eq!(pacer.max(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_zero_window_returns_immediately() {
        let start = std::time::Instant::now();
        Pacer::new(Duration::ZERO, Duration::ZERO).pause().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
