//! Outbound request limiter.
//!
//! Three rules are enforced together: at most `max_requests` request starts in
//! any rolling `window_secs` window, a single request running at a time, and
//! at least `min_spacing_ms` between consecutive starts. Callers over the
//! budget wait; nothing is rejected.
//!
//! The single-request ceiling is fixed. Only the quota and spacing are tunable.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Configuration for the outbound request budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum request starts per window.
    pub max_requests: u32,
    /// Rolling window length.
    pub window_secs: u64,
    /// Minimum gap between two request starts.
    pub min_spacing_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
            min_spacing_ms: 333,
        }
    }
}

impl RateLimitConfig {
    /// No quota, no spacing. Still one request at a time.
    pub fn unlimited() -> Self {
        Self {
            max_requests: u32::MAX,
            window_secs: 0,
            min_spacing_ms: 0,
        }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    fn min_spacing(&self) -> Duration {
        Duration::from_millis(self.min_spacing_ms)
    }
}

const MAX_IN_FLIGHT: usize = 1;

pub struct RateLimiter {
    config: RateLimitConfig,
    in_flight: Semaphore,
    window: Mutex<WindowState>,
}

#[derive(Default)]
struct WindowState {
    starts: VecDeque<Instant>,
    last_start: Option<Instant>,
}

impl WindowState {
    /// Record a start at `now` if allowed, otherwise return how long to wait.
    fn try_start(&mut self, now: Instant, config: &RateLimitConfig) -> Option<Duration> {
        let window = config.window();
        while let Some(front) = self.starts.front() {
            if now.saturating_duration_since(*front) >= window {
                self.starts.pop_front();
            } else {
                break;
            }
        }

        let mut wait = Duration::ZERO;
        if let Some(last) = self.last_start {
            let since = now.saturating_duration_since(last);
            if since < config.min_spacing() {
                wait = config.min_spacing() - since;
            }
        }
        if self.starts.len() >= config.max_requests as usize {
            if let Some(oldest) = self.starts.front() {
                wait = wait.max((*oldest + window).saturating_duration_since(now));
            }
        }

        if wait.is_zero() {
            self.starts.push_back(now);
            self.last_start = Some(now);
            None
        } else {
            Some(wait)
        }
    }
}

/// Held for the duration of one request; frees the in-flight slot on drop.
pub struct RequestPermit<'a> {
    _slot: Option<SemaphorePermit<'a>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            in_flight: Semaphore::new(MAX_IN_FLIGHT),
            window: Mutex::new(WindowState::default()),
        }
    }

    /// Wait until a request may start. Waiters are served in arrival order.
    pub async fn acquire(&self) -> RequestPermit<'_> {
        // The semaphore is never closed, so this only fails in theory.
        let slot = self.in_flight.acquire().await.ok();

        loop {
            let wait = self.window.lock().try_start(Instant::now(), &self.config);
            match wait {
                None => break,
                Some(wait) => {
                    debug!(wait_ms = wait.as_millis() as u64, "Rate limiting: waiting");
                    sleep(wait).await;
                }
            }
        }

        RequestPermit { _slot: slot }
    }
}
