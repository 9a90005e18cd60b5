//! Core admission controller.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, trace};

use super::clock::{Clock, TokioClock};
use super::rules::LimitTable;
use super::window::AdmissionHistory;

/// Per-key sliding-window admission controller.
///
/// Each raw key gets its own admission history guarded by its own async
/// mutex, so callers on different keys never contend. Callers over the limit
/// are suspended until the oldest admission leaves the window; the per-key
/// lock is released for the duration of that suspension.
///
/// The limiter is meant to be built once and shared as `Arc<RateLimiter>`.
pub struct RateLimiter {
    /// Limits by canonical key, fixed for the lifetime of the limiter
    table: LimitTable,
    /// Admission histories indexed by raw key, created on first use
    histories: DashMap<String, Arc<Mutex<AdmissionHistory>>>,
    /// Time source and suspension primitive
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter over `table` using the tokio clock.
    pub fn new(table: LimitTable) -> Self {
        Self::with_clock(table, TokioClock::new())
    }

    /// Create a limiter over `table` with a custom clock.
    pub fn with_clock<C: Clock + 'static>(table: LimitTable, clock: C) -> Self {
        Self {
            table,
            histories: DashMap::new(),
            clock: Arc::new(clock),
        }
    }

    /// Resolve the limit for a raw key.
    pub fn resolve_limit(&self, key: &str) -> u64 {
        self.table.resolve_limit(key)
    }

    /// Wait until `key` may issue another request, then record the admission.
    ///
    /// Completes only once the caller is admitted. Exactly one timestamp is
    /// recorded per completed call, and only on the returning path: dropping
    /// the future while it is suspended leaves no trace and holds no lock.
    ///
    /// A limit of zero never admits; the caller keeps sleeping one full window
    /// at a time.
    pub async fn acquire(&self, key: &str) {
        let limit = self.resolve_limit(key);
        let window = self.table.window();
        let history = self.history(key);

        loop {
            let wait = {
                let mut entries = history.lock().await;
                let now = self.clock.now();
                entries.prune(now, window);

                if (entries.len() as u64) < limit {
                    entries.record(now);
                    debug!(
                        key = %key,
                        current_count = entries.len(),
                        "Acquired rate limit slot"
                    );
                    return;
                }

                entries.wait_time(now, window)
            };

            // The oldest entry already aged out; the next prune frees its slot.
            if wait.is_zero() {
                continue;
            }

            info!(
                key = %key,
                limit = limit,
                wait_seconds = wait.as_secs_f64(),
                "Rate limit reached, waiting"
            );
            self.clock.sleep(wait).await;
        }
    }

    /// Get or create the history for a raw key.
    fn history(&self, key: &str) -> Arc<Mutex<AdmissionHistory>> {
        if let Some(existing) = self.histories.get(key) {
            return existing.value().clone();
        }

        self.histories
            .entry(key.to_string())
            .or_insert_with(|| {
                trace!(key = %key, "Creating admission history");
                Arc::new(Mutex::new(AdmissionHistory::new()))
            })
            .value()
            .clone()
    }

    /// Number of admissions for `key` still inside the window.
    ///
    /// Returns `None` if the key has never been acquired. Does not modify
    /// the history.
    pub async fn current_count(&self, key: &str) -> Option<usize> {
        let history = self.histories.get(key)?.value().clone();
        let entries = history.lock().await;
        let now = self.clock.now();
        let window = self.table.window();

        Some(
            entries
                .iter()
                .filter(|&&ts| now.saturating_duration_since(ts) < window)
                .count(),
        )
    }

    /// Get the number of keys with an admission history.
    pub fn key_count(&self) -> usize {
        self.histories.len()
    }

    /// The limit table this limiter enforces.
    pub fn table(&self) -> &LimitTable {
        &self.table
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(LimitTable::builtin())
    }
}
