//! Exponential backoff with jitter.
//!
//! Used by the dispatcher while it waits for the registry to hold at least
//! one backend, so an empty or fully unhealthy pool never spins a core.

use std::time::Duration;
use rand::Rng;

/// Calculate exponential backoff delay with jitter.
///
/// The result never exceeds `max_ms` plus 10% jitter; attempt 0 yields zero.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Backoff schedule for idle waits (empty registry, all backends unhealthy).
#[derive(Debug, Clone, Copy)]
pub struct IdleBackoff {
    base_ms: u64,
    max_ms: u64,
    attempt: u32,
}

impl IdleBackoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms: base_ms.max(1),
            max_ms: max_ms.max(1),
            attempt: 0,
        }
    }

    /// Delay for the next idle wait; grows until the cap.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1).min(32);
        calculate_backoff(self.attempt, self.base_ms, self.max_ms)
    }

    /// Start over after progress was made.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
