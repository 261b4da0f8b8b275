//! Bounded polling for content that renders asynchronously.
//!
//! Page elements appear some time after navigation. Instead of relying on
//! ambient timers, callers describe the wait as a [`PollPolicy`] and a probe
//! closure; [`poll_until`] returns a [`Polled`] result and never fails.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Interval and attempt budget for one polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Delay between attempts, in milliseconds.
    pub interval_ms: u64,
    /// Maximum number of probes (including the first).
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_attempts: 30,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            max_attempts,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Outcome of a polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled<T> {
    /// Probe succeeded on the given 1-based attempt.
    Found { value: T, attempt: u32 },
    /// Budget exhausted.
    NotFound { attempts: u32 },
    /// Abort token was set before the probe succeeded.
    Cancelled { attempts: u32 },
}

impl<T> Polled<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Polled::Found { value, .. } => Some(value),
            Polled::NotFound { .. } | Polled::Cancelled { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Polled::Found { .. })
    }
}

/// Probes until `probe` returns `Some`, the budget runs out, or `abort` is set.
///
/// Sleeps `policy.interval()` between attempts (not after the last one). Every
/// miss is logged at debug; exhaustion is logged at warn with `label`.
pub async fn poll_until<T, F>(
    policy: &PollPolicy,
    label: &str,
    abort: Option<&AtomicBool>,
    mut probe: F,
) -> Polled<T>
where
    F: FnMut() -> Option<T>,
{
    let max = policy.max_attempts.max(1);
    for attempt in 1..=max {
        if abort.is_some_and(|a| a.load(Ordering::Relaxed)) {
            tracing::debug!(label, attempt, "polling cancelled");
            return Polled::Cancelled {
                attempts: attempt - 1,
            };
        }
        if let Some(value) = probe() {
            tracing::debug!(label, attempt, "found");
            return Polled::Found { value, attempt };
        }
        tracing::debug!(label, "waiting... (attempt {}/{})", attempt, max);
        if attempt < max {
            tokio::time::sleep(policy.interval()).await;
        }
    }
    tracing::warn!(label, attempts = max, "timeout: not found");
    Polled::NotFound { attempts: max }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test(start_paused = true)]
    async fn finds_on_later_attempt() {
        let calls = Cell::new(0u32);
        let policy = PollPolicy::new(Duration::from_millis(100), 5);
        let out = poll_until(&policy, "x", None, || {
            calls.set(calls.get() + 1);
            (calls.get() == 3).then_some("hit")
        })
        .await;
        assert_eq!(out, Polled::Found { value: "hit", attempt: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_budget() {
        let calls = Cell::new(0u32);
        let policy = PollPolicy::new(Duration::from_millis(100), 4);
        let start = tokio::time::Instant::now();
        let out: Polled<()> = poll_until(&policy, "x", None, || {
            calls.set(calls.get() + 1);
            None
        })
        .await;
        assert_eq!(out, Polled::NotFound { attempts: 4 });
        assert_eq!(calls.get(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn abort_token_stops_polling() {
        let abort = AtomicBool::new(false);
        let calls = Cell::new(0u32);
        let policy = PollPolicy::new(Duration::from_millis(10), 10);
        let out: Polled<()> = poll_until(&policy, "x", Some(&abort), || {
            calls.set(calls.get() + 1);
            if calls.get() == 2 {
                abort.store(true, Ordering::Relaxed);
            }
            None
        })
        .await;
        assert_eq!(out, Polled::Cancelled { attempts: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_probes_once() {
        let policy = PollPolicy::new(Duration::from_millis(10), 0);
        let out = poll_until(&policy, "x", None, || Some(1)).await;
        assert!(out.is_found());
    }
}
