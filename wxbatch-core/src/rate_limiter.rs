use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

pub const DEFAULT_MAX_REQUESTS: usize = 10;
pub const DEFAULT_TIME_WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window limiter keyed by an arbitrary string.
///
/// Each key keeps the instants of its admitted calls, oldest first. A check
/// drops every instant older than the window and admits the call only if
/// fewer than `max_requests` remain. Prune, decide and record happen under
/// one lock, so concurrent callers can never be admitted past the limit.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    time_window: Duration,
    requests: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_TIME_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_requests: usize, time_window: Duration) -> Self {
        Self {
            max_requests,
            time_window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn time_window(&self) -> Duration {
        self.time_window
    }

    pub fn is_allowed(&self, key: &str) -> bool {
        self.is_allowed_at(key, Instant::now())
    }

    /// Same as [`RateLimiter::is_allowed`], with the clock supplied by the caller.
    pub fn is_allowed_at(&self, key: &str, now: Instant) -> bool {
        // The critical section cannot panic halfway through, so a poisoned map is still consistent.
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        let history = requests.entry(key.to_owned()).or_default();

        while let Some(&oldest) = history.front() {
            if now.saturating_duration_since(oldest) < self.time_window {
                break;
            }
            history.pop_front();
        }

        if history.len() < self.max_requests {
            history.push_back(now);
            true
        } else {
            false
        }
    }

    /// Number of admitted calls currently counted against `key`, as of the last check.
    pub fn in_window(&self, key: &str) -> usize {
        let requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        requests.get(key).map_or(0, VecDeque::len)
    }
}
