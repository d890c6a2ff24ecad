//! Sliding 60-second request window per provider
//!
//! Timestamps are appended once per attempt and pruned lazily on every
//! check. State is process-local and starts empty.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Length of the rate window
pub const WINDOW: Duration = Duration::from_secs(60);

/// Attempt timestamps keyed by provider name
///
/// Each deque is ordered oldest-first because timestamps come from a
/// monotonic clock and are appended under the router's lock.
#[derive(Debug, Default)]
pub struct RateWindow {
    attempts: HashMap<String, VecDeque<Instant>>,
}

impl RateWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attempt at `now`
    pub fn record(&mut self, provider: &str, now: Instant) {
        self.attempts
            .entry(provider.to_string())
            .or_default()
            .push_back(now);
    }

    /// Prune entries older than the window, then compare against the budget
    ///
    /// Limited iff the remaining count is `>= budget`, so a budget of 0 is
    /// always limited.
    pub fn is_limited(&mut self, provider: &str, budget: u32, now: Instant) -> bool {
        let count = match self.attempts.get_mut(provider) {
            Some(timestamps) => {
                while let Some(oldest) = timestamps.front() {
                    if is_expired(*oldest, now) {
                        timestamps.pop_front();
                    } else {
                        break;
                    }
                }
                timestamps.len()
            }
            None => 0,
        };
        count >= budget as usize
    }

    /// Attempts inside the window, without pruning
    pub fn recent_count(&self, provider: &str, now: Instant) -> usize {
        self.attempts
            .get(provider)
            .map(|timestamps| timestamps.iter().filter(|t| !is_expired(**t, now)).count())
            .unwrap_or(0)
    }
}

// Entries exactly WINDOW old are still inside [now - 60s, now].
fn is_expired(timestamp: Instant, now: Instant) -> bool {
    now.saturating_duration_since(timestamp) > WINDOW
}
