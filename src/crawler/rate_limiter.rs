//! Randomized inter-request spacing
//!
//! Every request is preceded by a sleep drawn uniformly from a configured
//! range so that traffic from the crawler has no fixed rhythm.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless `cancel` fires first
///
/// Returns true if the full duration elapsed, false if cancelled.
pub async fn sleep_cancellable(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }

    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}

/// Converts configured seconds to a duration
///
/// Negative values and values a [`Duration`] cannot hold become zero.
pub fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::ZERO)
}

/// A `[min, max]` delay range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayProfile {
    min: Duration,
    max: Duration,
}

impl DelayProfile {
    /// Builds a profile from seconds
    ///
    /// Negative bounds are treated as zero and reversed bounds are swapped.
    pub fn from_seconds(min: f64, max: f64) -> Self {
        let min = seconds(min);
        let max = seconds(max);
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A profile that never sleeps
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

/// Enforces randomized spacing between requests
#[derive(Debug, Clone)]
pub struct RateLimiter {
    profile: DelayProfile,
}

impl RateLimiter {
    pub fn new(profile: DelayProfile) -> Self {
        Self { profile }
    }

    /// The per-request profile (`min-delay-seconds` to `max-delay-seconds`)
    pub fn per_request(config: &CrawlerConfig) -> Self {
        Self::new(DelayProfile::from_seconds(
            config.min_delay_seconds,
            config.max_delay_seconds,
        ))
    }

    /// The profile applied between two partitions
    pub fn inter_partition(config: &CrawlerConfig) -> Self {
        let [min, max] = config.inter_partition_delay;
        Self::new(DelayProfile::from_seconds(min, max))
    }

    pub fn profile(&self) -> DelayProfile {
        self.profile
    }

    /// Draws the next delay uniformly from the profile's range
    pub fn next_delay(&self) -> Duration {
        let DelayProfile { min, max } = self.profile;
        if min == max {
            return min;
        }

        let secs = rand::rng().random_range(min.as_secs_f64()..=max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Sleeps for a freshly drawn delay
    pub async fn wait(&self) {
        let delay = self.next_delay();
        tracing::trace!(delay_ms = delay.as_millis() as u64, "Rate limit wait");
        tokio::time::sleep(delay).await;
    }

    /// Sleeps for a freshly drawn delay, returning early on cancellation
    ///
    /// Returns false if the wait was cut short.
    pub async fn wait_cancellable(&self, cancel: &CancellationToken) -> bool {
        let delay = self.next_delay();
        tracing::trace!(delay_ms = delay.as_millis() as u64, "Rate limit wait");
        sleep_cancellable(delay, cancel).await
    }
}
