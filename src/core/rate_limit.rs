use crate::domain::ports::ConfigProvider;
use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_LISTING_DELAY: Duration = Duration::from_millis(5000);

const MAX_BACKOFF_FACTOR: u32 = 8;

/// Serial spacing between enrichment fetches.
///
/// The spacing is measured from the end of the previous fetch, so the first
/// fetch of a visit goes out immediately and no delay trails the last one.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    jitter: Duration,
    backoff: bool,
    consecutive_failures: u32,
    last_fetch: Option<Instant>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter: Duration::ZERO,
            backoff: false,
            consecutive_failures: 0,
            last_fetch: None,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(config.listing_delay())
            .with_jitter(config.delay_jitter())
            .with_backoff(config.backoff_on_failure())
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_backoff(mut self, enabled: bool) -> Self {
        self.backoff = enabled;
        self
    }

    /// Spacing to apply after the most recent fetch.
    pub fn current_spacing(&self) -> Duration {
        let factor = if self.backoff && self.consecutive_failures > 0 {
            2u32.saturating_pow(self.consecutive_failures)
                .min(MAX_BACKOFF_FACTOR)
        } else {
            1
        };

        let jitter = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            let max_ms = self.jitter.as_millis() as u64;
            Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
        };

        self.delay * factor + jitter
    }

    /// Waits until the next fetch may start. Returns `false` if cancelled while waiting.
    pub async fn wait_turn(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        let Some(last) = self.last_fetch else {
            return true;
        };

        let deadline = last + self.current_spacing();
        if deadline <= Instant::now() {
            return true;
        }

        tracing::debug!(
            "⏳ Waiting {:?} before next listing",
            deadline.saturating_duration_since(Instant::now())
        );

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => true,
            _ = cancel.cancelled() => false,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.last_fetch = Some(Instant::now());
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_fetch = Some(Instant::now());
    }

    /// Stamps a fetch that was abandoned before it finished.
    pub fn record_attempt(&mut self) {
        self.last_fetch = Some(Instant::now());
    }
}
