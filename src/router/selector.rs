//! Round-robin provider selection with rate-window skipping
//!
//! One cursor is shared by every request and category. Each probe takes
//! `enabled[cursor % len]` and advances the cursor; rate-limited or
//! already-attempted providers are skipped. When every remaining candidate is
//! over budget, the most preferred one (lowest `priority`) is returned anyway.

use crate::clock::Clock;
use crate::registry::ProviderConfig;
use crate::router::provider_name::{ExclusionSet, ProviderName};
use crate::router::rate_window::RateWindow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mutable selection state; guarded by a single mutex
#[derive(Debug, Default)]
struct SelectionState {
    cursor: u64,
    window: RateWindow,
}

/// Outcome of one selection
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub provider: &'a ProviderConfig,
    /// True when every candidate was rate-limited and this is the priority fallback
    pub fallback: bool,
}

/// Selects providers for the router
///
/// The enabled list is fixed at construction. Only the cursor and rate
/// window change, always under `state`'s lock, which is never held across
/// an `.await`.
#[derive(Debug)]
pub struct ProviderSelector {
    enabled: Vec<ProviderConfig>,
    clock: Arc<dyn Clock>,
    state: Mutex<SelectionState>,
}

impl ProviderSelector {
    pub fn new(enabled: Vec<ProviderConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            enabled,
            clock,
            state: Mutex::new(SelectionState::default()),
        }
    }

    pub fn enabled(&self) -> &[ProviderConfig] {
        &self.enabled
    }

    fn lock(&self) -> MutexGuard<'_, SelectionState> {
        // State stays consistent even if a holder panicked: every mutation is a
        // single push/pop/increment.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pick the next candidate without recording an attempt
    pub fn select(&self, exclude: &ExclusionSet) -> Option<Selection<'_>> {
        let mut state = self.lock();
        self.pick(&mut state, exclude)
    }

    /// Pick the next candidate and record an attempt for it, atomically
    ///
    /// Recording under the same lock means concurrent callers see each
    /// other's in-flight attempts immediately.
    pub fn select_and_record(&self, exclude: &ExclusionSet) -> Option<Selection<'_>> {
        let mut state = self.lock();
        let selection = self.pick(&mut state, exclude)?;
        let now = self.clock.now();
        state.window.record(selection.provider.name(), now);
        Some(selection)
    }

    /// Whether the named provider is currently over its budget
    ///
    /// Prunes the provider's window. Unknown names are reported as limited.
    pub fn is_rate_limited(&self, name: &str) -> bool {
        let Some(provider) = self.enabled.iter().find(|p| p.name() == name) else {
            tracing::debug!(provider = %name, "Rate check for unknown or disabled provider");
            return true;
        };
        let now = self.clock.now();
        self.lock()
            .window
            .is_limited(name, provider.requests_per_minute(), now)
    }

    /// Current cursor value
    pub fn cursor(&self) -> u64 {
        self.lock().cursor
    }

    /// Cursor plus recent attempt counts per enabled provider, without pruning
    pub fn observe(&self) -> (u64, Vec<usize>) {
        let now = self.clock.now();
        let state = self.lock();
        let counts = self
            .enabled
            .iter()
            .map(|p| state.window.recent_count(p.name(), now))
            .collect();
        (state.cursor, counts)
    }

    fn pick(&self, state: &mut SelectionState, exclude: &ExclusionSet) -> Option<Selection<'_>> {
        let len = self.enabled.len();
        if len == 0 {
            return None;
        }

        let now = self.clock.now();
        for _ in 0..len {
            let index = (state.cursor % len as u64) as usize;
            state.cursor = state.cursor.wrapping_add(1);

            let candidate = &self.enabled[index];
            if exclude.contains(&ProviderName::from(candidate)) {
                continue;
            }

            if state
                .window
                .is_limited(candidate.name(), candidate.requests_per_minute(), now)
            {
                tracing::debug!(
                    provider = %candidate.name(),
                    requests_per_minute = candidate.requests_per_minute(),
                    "Skipping rate-limited provider"
                );
                continue;
            }

            return Some(Selection {
                provider: candidate,
                fallback: false,
            });
        }

        // Every remaining candidate is over budget: attempt the most preferred one
        // anyway rather than refusing. min_by_key keeps declaration order on ties.
        let fallback = self
            .enabled
            .iter()
            .filter(|p| !exclude.contains(&ProviderName::from(*p)))
            .min_by_key(|p| p.priority())?;

        tracing::warn!(
            provider = %fallback.name(),
            priority = fallback.priority(),
            excluded = exclude.len(),
            "All candidate providers are rate-limited; falling back to highest priority"
        );

        Some(Selection {
            provider: fallback,
            fallback: true,
        })
    }
}
