//! Randomized courtesy delays between external calls.
//!
//! Scraping targets and search APIs dislike bursts, so the stage runner
//! waits a random interval before every network-bound unit of work except
//! the first of a run. This is a politeness throttle, not a rate limiter:
//! there is no token bucket and no budget shared across runs.

use rand::{Rng, rng};
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Draws a delay of `base + uniform(min_secs..=max_secs)` seconds.
#[derive(Debug, Clone)]
pub struct Pacer {
    base: Duration,
    min_secs: f64,
    max_secs: f64,
}

impl Pacer {
    /// Create a pacer. The range is validated up front so a bad
    /// configuration fails at startup instead of mid-batch.
    pub fn new(base: Duration, min_secs: f64, max_secs: f64) -> Result<Self, Box<dyn Error>> {
        if !min_secs.is_finite() || !max_secs.is_finite() || min_secs < 0.0 {
            return Err("pacing bounds must be finite and non-negative".into());
        }
        if min_secs > max_secs {
            return Err(format!(
                "pacing minimum ({min_secs}s) must not exceed maximum ({max_secs}s)"
            )
            .into());
        }
        Ok(Self {
            base,
            min_secs,
            max_secs,
        })
    }

    /// Draw the next delay without sleeping. Split out from [`wait`] so
    /// the distribution is testable.
    ///
    /// [`wait`]: Pacer::wait
    pub fn draw(&self) -> Duration {
        let jitter = rng().random_range(self.min_secs..=self.max_secs);
        self.base + Duration::from_secs_f64(jitter)
    }

    /// Sleep for one drawn delay.
    pub async fn wait(&self) {
        let delay = self.draw();
        debug!(?delay, "Pacing before external call");
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_stays_within_bounds() {
        let pacer = Pacer::new(Duration::from_secs(1), 1.0, 5.0).unwrap();
        for _ in 0..200 {
            let delay = pacer.draw();
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_secs(6));
        }
    }

    #[test]
    fn test_zero_width_range_is_allowed() {
        let pacer = Pacer::new(Duration::ZERO, 2.0, 2.0).unwrap();
        assert_eq!(pacer.draw(), Duration::from_secs(2));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        assert!(Pacer::new(Duration::ZERO, 5.0, 1.0).is_err());
    }

    #[test]
    fn test_negative_minimum_is_rejected() {
        assert!(Pacer::new(Duration::ZERO, -1.0, 1.0).is_err());
    }
}
