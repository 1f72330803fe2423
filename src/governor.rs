//! Process-wide rate limit and timeout policy.
//!
//! Every dispatch passes through [`Governor::acquire_slot`], a token bucket
//! of size one: a slot is granted only once `min_interval` has elapsed since
//! the previous grant. The configuration is an [`ArcSwap`] snapshot so the
//! dispatch path reads it without locking.

use arc_swap::ArcSwap;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::trace;

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorConfig {
    /// Minimum spacing between two dispatches.
    pub min_interval: Duration,
    /// Budget for one request, from dispatch to response headers.
    pub timeout: Duration,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug)]
pub struct Governor {
    config: ArcSwap<GovernorConfig>,
    last_grant: Mutex<Option<Instant>>,
    changed: Condvar,
}

impl Default for Governor {
    fn default() -> Self {
        Self::new(GovernorConfig::default())
    }
}

impl Governor {
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            last_grant: Mutex::new(None),
            changed: Condvar::new(),
        }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<GovernorConfig> {
        self.config.load_full()
    }

    pub fn timeout(&self) -> Duration {
        self.config.load().timeout
    }

    /// Replaces the minimum spacing. Callers already waiting in
    /// [`acquire_slot`](Self::acquire_slot) re-check against the new value.
    pub fn set_rate_limit(&self, interval: Duration) {
        self.config.rcu(|current| GovernorConfig {
            min_interval: interval,
            ..**current
        });
        // Taking the lock orders the store before any waiter's re-check.
        drop(self.last_grant.lock().unwrap_or_else(PoisonError::into_inner));
        self.changed.notify_all();
    }

    /// Replaces the timeout used by subsequent dispatches.
    pub fn set_timeout(&self, timeout: Duration) {
        self.config.rcu(|current| GovernorConfig {
            timeout,
            ..**current
        });
    }

    /// Blocks until a dispatch slot is available and returns the grant time.
    pub fn acquire_slot(&self) -> Instant {
        let mut last = self
            .last_grant
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            let interval = self.config.load().min_interval;
            let now = Instant::now();
            let ready_at = last.map(|prev| prev + interval);
            match ready_at {
                Some(ready_at) if now < ready_at => {
                    let wait = ready_at - now;
                    trace!(wait_ms = wait.as_millis() as u64, "waiting for dispatch slot");
                    last = self
                        .changed
                        .wait_timeout(last, wait)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
                _ => {
                    *last = Some(now);
                    return now;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_defaults() {
        let governor = Governor::default();
        let config = governor.config();
        assert_eq!(config.min_interval, Duration::from_millis(1));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_setters_are_independent() {
        let governor = Governor::default();
        governor.set_rate_limit(Duration::from_millis(250));
        governor.set_timeout(Duration::from_secs(1));
        assert_eq!(
            *governor.config(),
            GovernorConfig {
                min_interval: Duration::from_millis(250),
                timeout: Duration::from_secs(1),
            }
        );
    }

    #[test]
    fn test_first_slot_is_immediate() {
        let governor = Governor::new(GovernorConfig {
            min_interval: Duration::from_secs(60),
            timeout: DEFAULT_TIMEOUT,
        });
        let start = Instant::now();
        governor.acquire_slot();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_slots_are_spaced() {
        let governor = Governor::default();
        governor.set_rate_limit(Duration::from_millis(100));
        let a = governor.acquire_slot();
        let b = governor.acquire_slot();
        let c = governor.acquire_slot();
        assert!(b - a >= Duration::from_millis(100));
        assert!(c - b >= Duration::from_millis(100));
    }

    #[test]
    fn test_concurrent_slots_are_spaced() {
        let governor = Arc::new(Governor::default());
        governor.set_rate_limit(Duration::from_millis(50));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let governor = governor.clone();
                thread::spawn(move || governor.acquire_slot())
            })
            .collect();
        let mut grants: Vec<Instant> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        grants.sort();

        for pair in grants.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(50));
        }
    }

    #[test]
    fn test_lowering_interval_wakes_waiters() {
        let governor = Arc::new(Governor::default());
        governor.set_rate_limit(Duration::from_secs(30));
        governor.acquire_slot();

        let waiter = {
            let governor = governor.clone();
            thread::spawn(move || {
                let start = Instant::now();
                governor.acquire_slot();
                start.elapsed()
            })
        };
        thread::sleep(Duration::from_millis(50));
        governor.set_rate_limit(Duration::from_millis(1));

        let waited = waiter.join().unwrap();
        assert!(waited < Duration::from_secs(10));
    }
}
