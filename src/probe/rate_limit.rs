// src/probe/rate_limit.rs
// =============================================================================
// Token-bucket rate limiter shared by all workers.
//
// How it works:
// 1. The bucket starts full with `rate` tokens (so a short burst is allowed)
// 2. A background task adds one token every 1/rate seconds
// 3. If the bucket is already full, that token is simply dropped
// 4. `wait()` takes one token, sleeping until one is available
//
// The bucket is a tokio Semaphore: permits are tokens. Taking a token means
// acquiring a permit and forgetting it, so it never goes back by itself.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

const MIN_PERIOD: Duration = Duration::from_nanos(1);

#[derive(Debug)]
pub struct RateLimiter {
    bucket: Option<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: Arc<Semaphore>,
    refill: JoinHandle<()>,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second` on average
    ///
    /// A rate of 0 disables limiting. Must be called inside a tokio runtime
    /// because it spawns the refill task.
    pub fn new(requests_per_second: u32) -> Self {
        if requests_per_second == 0 {
            return Self::unlimited();
        }

        let capacity = requests_per_second as usize;
        let tokens = Arc::new(Semaphore::new(capacity));
        // Above 1e9 rps the division rounds to zero, which interval_at rejects
        let period = (Duration::from_secs(1) / requests_per_second).max(MIN_PERIOD);

        // The task only holds a weak handle, so it stops once the limiter is gone
        let bucket = Arc::downgrade(&tokens);
        let refill = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(tokens) = bucket.upgrade() else {
                    break;
                };
                // Only this task adds permits, so the check can't overshoot
                if tokens.available_permits() < capacity {
                    tokens.add_permits(1);
                }
            }
        });

        Self {
            bucket: Some(Bucket { tokens, refill }),
        }
    }

    /// A limiter that never waits
    pub fn unlimited() -> Self {
        Self { bucket: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.bucket.is_some()
    }

    /// Blocks the caller until a token is available, then consumes it
    pub async fn wait(&self) {
        let Some(bucket) = &self.bucket else {
            return;
        };

        // acquire() only fails if the semaphore is closed, which we never do
        if let Ok(permit) = bucket.tokens.acquire().await {
            permit.forget();
        }
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(bucket) = &self.bucket {
            bucket.refill.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant as StdInstant;

    #[tokio::test]
    async fn test_zero_rate_never_waits() {
        let limiter = RateLimiter::new(0);
        assert!(!limiter.is_enabled());

        let start = StdInstant::now();
        for _ in 0..1000 {
            limiter.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_initial_burst_is_bucket_capacity() {
        let limiter = RateLimiter::new(5);

        let start = StdInstant::now();
        for _ in 0..5 {
            limiter.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_throttles_to_configured_rate() {
        let limiter = RateLimiter::new(5);

        // 5 burst tokens, then 10 more at one per 200ms = ~2s
        let start = StdInstant::now();
        for _ in 0..15 {
            limiter.wait().await;
        }
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(1800), "too fast: {:?}", elapsed);
        assert!(elapsed <= Duration::from_millis(2200), "too slow: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_huge_rate_keeps_refilling() {
        let limiter = RateLimiter::new(2_000_000_000);
        limiter.wait().await;
        time::sleep(Duration::from_millis(50)).await;

        let bucket = limiter.bucket.as_ref().unwrap();
        assert!(!bucket.refill.is_finished());
    }

    #[tokio::test]
    async fn test_idle_bucket_does_not_overfill() {
        let limiter = RateLimiter::new(10);

        // Let the refill task tick a few times while the bucket is full
        time::sleep(Duration::from_millis(350)).await;

        let start = StdInstant::now();
        for _ in 0..13 {
            limiter.wait().await;
        }
        // 10 buffered tokens, the remaining 3 must wait for refills
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}
