//! Clock abstraction for reading time and suspending callers.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Source of time for the limiter.
///
/// `now` must be consistent across calls. `sleep` suspends only the calling
/// task; other tasks on the runtime keep running.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by the tokio timer.
///
/// Honours a paused runtime clock, so tests can fast-forward through waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl TokioClock {
    /// Create a new tokio clock.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
