//! Last-activity tracking and the expiry threshold.
//!
//! Expiry is polled, never pushed: nothing here owns a timer. A session
//! stamps its last activity on every inbound chunk and a reaper compares
//! the stamp against [`ExpiryThreshold`] whenever it sweeps.
//!
//! Times are whole seconds since the Unix epoch, so the comparison has
//! second granularity.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default inactivity allowance: five minutes.
const DEFAULT_EXPIRY_SECS: u64 = 300;

/// Current time in whole seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Shared last-activity timestamp of one session.
///
/// Cloning shares the same stamp, so a reaper holding a clone sees every
/// touch made by the reader task.
#[derive(Debug, Clone)]
pub struct ActivityStamp {
    last_active: Arc<AtomicU64>,
}

impl ActivityStamp {
    /// Creates a stamp set to now.
    pub fn new() -> Self {
        Self {
            last_active: Arc::new(AtomicU64::new(unix_now())),
        }
    }

    /// Records activity at the current time.
    pub fn touch(&self) {
        self.touch_at(unix_now());
    }

    /// Records activity at `secs` (Unix seconds).
    pub fn touch_at(&self, secs: u64) {
        self.last_active.store(secs, Ordering::Relaxed);
    }

    /// Last recorded activity, in Unix seconds.
    pub fn last_active_secs(&self) -> u64 {
        self.last_active.load(Ordering::Relaxed)
    }

    /// `true` when `last_active + expiry_secs < now`.
    ///
    /// Exactly `expiry_secs` of silence is still alive; one more second is
    /// not.
    pub fn has_expired_at(&self, now: u64, expiry_secs: u64) -> bool {
        self.last_active_secs().saturating_add(expiry_secs) < now
    }

    /// Checks expiry against the wall clock and the threshold's current
    /// value.
    pub fn has_expired(&self, threshold: &ExpiryThreshold) -> bool {
        self.has_expired_at(unix_now(), threshold.get())
    }
}

impl Default for ActivityStamp {
    fn default() -> Self {
        Self::new()
    }
}

/// Inactivity allowance in seconds, adjustable while the server runs.
///
/// Sessions never cache the value; every expiry check reads it afresh.
#[derive(Debug, Clone)]
pub struct ExpiryThreshold {
    secs: Arc<AtomicU64>,
}

impl ExpiryThreshold {
    /// Creates a threshold of `secs` seconds.
    pub fn new(secs: u64) -> Self {
        Self {
            secs: Arc::new(AtomicU64::new(secs)),
        }
    }

    /// Current allowance in seconds.
    pub fn get(&self) -> u64 {
        self.secs.load(Ordering::Relaxed)
    }

    /// Changes the allowance for every holder of this threshold.
    pub fn set(&self, secs: u64) {
        self.secs.store(secs, Ordering::Relaxed);
    }
}

impl Default for ExpiryThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRY_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn test_has_expired_at_exact_threshold_is_alive() {
        let stamp = ActivityStamp::new();
        stamp.touch_at(NOW - 60);

        assert!(!stamp.has_expired_at(NOW, 60));
    }

    #[test]
    fn test_has_expired_at_one_second_past_threshold_is_expired() {
        let stamp = ActivityStamp::new();
        stamp.touch_at(NOW - 61);

        assert!(stamp.has_expired_at(NOW, 60));
    }

    #[test]
    fn test_has_expired_at_huge_threshold_does_not_overflow() {
        let stamp = ActivityStamp::new();
        stamp.touch_at(NOW);

        assert!(!stamp.has_expired_at(NOW + 1, u64::MAX));
    }

    #[test]
    fn test_touch_is_visible_through_clones() {
        let stamp = ActivityStamp::new();
        let reaper_view = stamp.clone();

        stamp.touch_at(42);

        assert_eq!(reaper_view.last_active_secs(), 42);
    }

    #[test]
    fn test_new_stamp_is_fresh() {
        let stamp = ActivityStamp::new();

        assert!(!stamp.has_expired(&ExpiryThreshold::new(5)));
    }

    #[test]
    fn test_threshold_set_is_seen_by_clones() {
        let threshold = ExpiryThreshold::new(300);
        let shared = threshold.clone();

        threshold.set(10);

        assert_eq!(shared.get(), 10);
    }

    #[test]
    fn test_has_expired_reads_threshold_at_check_time() {
        let stamp = ActivityStamp::new();
        stamp.touch_at(unix_now().saturating_sub(100));
        let threshold = ExpiryThreshold::new(3600);

        assert!(!stamp.has_expired(&threshold));

        threshold.set(10);
        assert!(stamp.has_expired(&threshold));
    }
}
