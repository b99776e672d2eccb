//! Suppression of duplicate triggers for the same word.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default suppression window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(250);

/// Time-windowed guard keyed by normalized word.
///
/// [`allow`](Self::allow) succeeds at most once per key within the window,
/// measured from the last allowed call. Records are never evicted.
#[derive(Debug)]
pub struct DedupeGuard {
    window: Duration,
    last: Mutex<HashMap<String, Instant>>,
}

impl DedupeGuard {
    /// Create a guard with the given window
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a request for `key` should proceed now
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Same as [`allow`](Self::allow) with an explicit clock.
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut last = self.last.lock();
        if let Some(seen) = last.get(key)
            && now.saturating_duration_since(*seen) < self.window
        {
            return false;
        }
        last.insert(key.to_string(), now);
        true
    }

    /// Number of distinct keys seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.last.lock().len()
    }

    /// Whether no key has been seen yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last.lock().is_empty()
    }
}

impl Default for DedupeGuard {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_second_call_inside_window_is_suppressed() {
        let guard = DedupeGuard::default();
        let t0 = Instant::now();

        assert!(guard.allow_at("x", t0));
        assert!(!guard.allow_at("x", t0 + Duration::from_millis(100)));
    }

    #[test]
    fn test_allowed_again_after_window() {
        let guard = DedupeGuard::default();
        let t0 = Instant::now();

        assert!(guard.allow_at("x", t0));
        assert!(guard.allow_at("x", t0 + Duration::from_millis(260)));
    }

    #[test]
    fn test_window_measured_from_last_allowed_call() {
        let guard = DedupeGuard::default();
        let t0 = Instant::now();

        assert!(guard.allow_at("x", t0));
        // Suppressed calls do not extend the window
        assert!(!guard.allow_at("x", t0 + Duration::from_millis(200)));
        assert!(guard.allow_at("x", t0 + Duration::from_millis(250)));
    }

    #[test]
    fn test_keys_are_independent() {
        let guard = DedupeGuard::default();
        let t0 = Instant::now();

        assert!(guard.allow_at("x", t0));
        assert!(guard.allow_at("y", t0));
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn test_real_clock_window() {
        let guard = DedupeGuard::new(Duration::from_millis(30));

        assert!(guard.allow("x"));
        assert!(!guard.allow("x"));
        thread::sleep(Duration::from_millis(40));
        assert!(guard.allow("x"));
    }

    #[test]
    fn test_racing_callers_get_exactly_one_pass() {
        let guard = Arc::new(DedupeGuard::new(Duration::from_secs(60)));
        let passed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let passed = Arc::clone(&passed);
                thread::spawn(move || {
                    if guard.allow("legend") {
                        passed.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(passed.load(Ordering::SeqCst), 1);
    }
}
