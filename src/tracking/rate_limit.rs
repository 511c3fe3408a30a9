use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};

/// Fixed-window per-IP rate limiter.
///
/// Tracks request instants per client and rejects once the window holds
/// `max_requests`. Old instants are pruned lazily on each check, so the
/// map stays proportional to the set of recently-active clients.
pub struct RateLimiter {
    requests: DashMap<String, Vec<Instant>>,
    max_requests: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self::with_clock(max_requests, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_requests: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            requests: DashMap::new(),
            max_requests,
            window,
            clock,
        }
    }

    /// Record a request from `ip`; returns false when the client has
    /// exhausted its window.
    pub fn check(&self, ip: &str) -> bool {
        let now = self.clock.now();
        let mut entry = self.requests.entry(ip.to_string()).or_default();

        entry.retain(|at| now.duration_since(*at) < self.window);
        if entry.len() >= self.max_requests {
            return false;
        }

        entry.push(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test::ManualClock;

    #[test]
    fn test_allows_up_to_max_requests() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check("203.0.113.1"));
        assert!(limiter.check("203.0.113.1"));
        assert!(limiter.check("203.0.113.1"));
        assert!(!limiter.check("203.0.113.1"));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("203.0.113.1"));
        assert!(limiter.check("203.0.113.2"));
        assert!(!limiter.check("203.0.113.1"));
    }

    #[test]
    fn test_window_expiry_resets_budget() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(2, Duration::from_secs(60), clock.clone());

        assert!(limiter.check("203.0.113.1"));
        assert!(limiter.check("203.0.113.1"));
        assert!(!limiter.check("203.0.113.1"));

        clock.advance(Duration::from_secs(61));
        assert!(limiter.check("203.0.113.1"));
    }
}
