//! Admission history for a single key.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Default look-back window for admissions.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Ordered admission timestamps for one key.
///
/// Timestamps are appended in real time, so the front of the queue is always
/// the oldest admission still tracked. The history is not synchronized on its
/// own; the limiter wraps each one in a per-key mutex.
#[derive(Debug, Default)]
pub struct AdmissionHistory {
    timestamps: VecDeque<Instant>,
}

impl AdmissionHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self {
            timestamps: VecDeque::new(),
        }
    }

    /// Drop every admission whose age at `now` is at least `window`.
    ///
    /// Age is measured with a saturating subtraction, so a timestamp that lies
    /// after `now` (the clock stepped backwards) counts as age zero and is kept.
    pub fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) < window {
                break;
            }
            self.timestamps.pop_front();
        }
    }

    /// Record an admission at `now`.
    ///
    /// The stored timestamp never precedes the newest one already recorded.
    pub fn record(&mut self, now: Instant) {
        let at = match self.timestamps.back() {
            Some(&newest) if newest > now => newest,
            _ => now,
        };
        self.timestamps.push_back(at);
    }

    /// How long until the oldest admission leaves the window.
    ///
    /// An empty history yields a full window: with a limit of zero nothing is
    /// ever recorded, and callers still have to suspend between retries.
    pub fn wait_time(&self, now: Instant, window: Duration) -> Duration {
        match self.timestamps.front() {
            Some(&oldest) => window.saturating_sub(now.saturating_duration_since(oldest)),
            None => window,
        }
    }

    /// Number of admissions currently tracked.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether no admissions are tracked.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The earliest tracked admission.
    pub fn oldest(&self) -> Option<Instant> {
        self.timestamps.front().copied()
    }

    /// The most recent admission.
    pub fn newest(&self) -> Option<Instant> {
        self.timestamps.back().copied()
    }

    /// Iterate the tracked admissions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Instant> {
        self.timestamps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_keeps_entries_inside_window() {
        let start = Instant::now();
        let mut history = AdmissionHistory::new();
        history.record(start);
        history.record(start + Duration::from_secs(30));

        history.prune(start + Duration::from_secs(59), DEFAULT_WINDOW);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_prune_evicts_at_exact_boundary() {
        let start = Instant::now();
        let mut history = AdmissionHistory::new();
        history.record(start);
        history.record(start + Duration::from_secs(1));

        // Age of exactly one window is stale
        history.prune(start + DEFAULT_WINDOW, DEFAULT_WINDOW);
        assert_eq!(history.len(), 1);
        assert_eq!(history.oldest(), Some(start + Duration::from_secs(1)));
    }

    #[test]
    fn test_prune_ignores_backward_clock() {
        let start = Instant::now() + Duration::from_secs(10);
        let mut history = AdmissionHistory::new();
        history.record(start);

        history.prune(start - Duration::from_secs(5), DEFAULT_WINDOW);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_record_stays_non_decreasing() {
        let start = Instant::now() + Duration::from_secs(10);
        let mut history = AdmissionHistory::new();
        history.record(start);
        history.record(start - Duration::from_secs(3));

        let stamps: Vec<_> = history.iter().copied().collect();
        assert_eq!(stamps, vec![start, start]);
    }

    #[test]
    fn test_wait_time_counts_down_from_oldest() {
        let start = Instant::now();
        let mut history = AdmissionHistory::new();
        history.record(start);
        history.record(start + Duration::from_secs(20));

        let wait = history.wait_time(start + Duration::from_secs(15), DEFAULT_WINDOW);
        assert_eq!(wait, Duration::from_secs(45));
    }

    #[test]
    fn test_wait_time_clamps_to_zero() {
        let start = Instant::now();
        let mut history = AdmissionHistory::new();
        history.record(start);

        let wait = history.wait_time(start + Duration::from_secs(90), DEFAULT_WINDOW);
        assert_eq!(wait, Duration::ZERO);
    }

    #[test]
    fn test_wait_time_with_backward_clock_is_full_window() {
        let start = Instant::now() + Duration::from_secs(10);
        let mut history = AdmissionHistory::new();
        history.record(start);

        let wait = history.wait_time(start - Duration::from_secs(5), DEFAULT_WINDOW);
        assert_eq!(wait, DEFAULT_WINDOW);
    }

    #[test]
    fn test_wait_time_empty_history() {
        let history = AdmissionHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.wait_time(Instant::now(), DEFAULT_WINDOW), DEFAULT_WINDOW);
    }
}
