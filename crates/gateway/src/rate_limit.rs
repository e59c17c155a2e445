//! Sliding-window rate limiter shared by every upstream fetch.
//!
//! The limiter admits at most `max_calls` upstream calls inside any trailing
//! window of length `window`. It knows nothing about cache categories.

use std::collections::VecDeque;
use std::time::Duration;

use gateway_core::RateLimitConfig;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Sliding-window admission gate.
///
/// Purge, check and record run under one lock, so no two callers can both
/// claim the last free slot. A caller that finds the window full releases the
/// lock, sleeps until the oldest call leaves the window and checks again.
/// The lock is never held across a wait, so [`RateLimiter::in_window`] always
/// answers immediately.
#[derive(Debug)]
pub struct RateLimiter {
    calls: Mutex<VecDeque<Instant>>,
    window: Duration,
    max_calls: usize,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiter {
    /// Create a limiter with an empty window. A zero `max_calls` is raised to one.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        let max_calls = config.max_calls.max(1);
        Self {
            calls: Mutex::new(VecDeque::with_capacity(max_calls)),
            window: config.window,
            max_calls,
        }
    }

    /// Length of the trailing window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Maximum number of admissions per window.
    #[must_use]
    pub const fn max_calls(&self) -> usize {
        self.max_calls
    }

    /// Waits until a call can be admitted, then records it.
    pub async fn admit(&self) {
        loop {
            let wait_time = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                self.purge(&mut calls, now);

                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return;
                }

                let oldest = calls.front().copied().unwrap_or(now);
                let wait_time = self.window.saturating_sub(now.duration_since(oldest));
                debug!(
                    "Rate limiting: waiting {}ms ({} calls in window)",
                    wait_time.as_millis(),
                    calls.len()
                );
                wait_time
            };
            sleep(wait_time).await;
        }
    }

    /// Number of admissions inside the current window.
    pub async fn in_window(&self) -> usize {
        let mut calls = self.calls.lock().await;
        self.purge(&mut calls, Instant::now());
        calls.len()
    }

    fn purge(&self, calls: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = calls.front() {
            if now.duration_since(oldest) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(max_calls: usize, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            window: Duration::from_secs(window_secs),
            max_calls,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_admits_up_to_capacity_without_waiting() {
        let limiter = limiter(3, 60);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.admit().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.in_window().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_oldest_to_leave_window() {
        let limiter = limiter(2, 60);
        limiter.admit().await;
        tokio::time::advance(Duration::from_secs(10)).await;
        limiter.admit().await;

        let start = Instant::now();
        limiter.admit().await;
        // Oldest call was 10s ago, so the third caller waits the remaining 50s.
        assert_eq!(start.elapsed(), Duration::from_secs(50));
        assert_eq!(limiter.in_window().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_calls_are_purged() {
        let limiter = limiter(2, 60);
        limiter.admit().await;
        limiter.admit().await;
        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(limiter.in_window().await, 0);
        let start = Instant::now();
        limiter.admit().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_never_exceed_capacity() {
        const CAPACITY: usize = 100;
        const CALLERS: usize = 250;
        let window = Duration::from_secs(60);

        let limiter = Arc::new(limiter(CAPACITY, 60));
        let origin = Instant::now();

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.admit().await;
                    Instant::now()
                })
            })
            .collect();

        let mut admitted = Vec::with_capacity(CALLERS);
        for handle in handles {
            admitted.push(handle.await.unwrap());
        }
        admitted.sort();

        for (i, start) in admitted.iter().enumerate() {
            let in_window = admitted[i..]
                .iter()
                .take_while(|t| t.duration_since(*start) < window)
                .count();
            assert!(
                in_window <= CAPACITY,
                "{in_window} admissions within one window"
            );
        }

        // 250 callers at 100 per minute need two full windows of waiting.
        let last = admitted.last().unwrap().duration_since(origin);
        assert_eq!(last, Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_occupancy_is_readable_while_a_caller_waits() {
        let limiter = Arc::new(limiter(1, 60));
        limiter.admit().await;

        let waiting = tokio::spawn({
            let limiter = Arc::clone(&limiter);
            async move { limiter.admit().await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!waiting.is_finished());

        let start = Instant::now();
        assert_eq!(limiter.in_window().await, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);

        waiting.await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(limiter.in_window().await, 1);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        assert_eq!(limiter(0, 1).max_calls(), 1);
    }
}
