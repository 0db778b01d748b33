//! In-flight dispatch tracking.
//!
//! # Responsibilities
//! - Generate unique dispatch IDs for tracing
//! - Count running dispatch tasks
//! - Let the driver wait for stragglers once the feed ends

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;

static NEXT_DISPATCH: AtomicU64 = AtomicU64::new(1);

/// Identifies one dispatch task in logs. Only handed out by `InFlightTracker::track`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchId(u64);

impl DispatchId {
    fn next() -> Self {
        Self(NEXT_DISPATCH.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DispatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dispatch-{}", self.0)
    }
}

/// Counts running dispatch tasks.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active_count: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new dispatch. The count drops when the guard does.
    pub fn track(&self) -> DispatchGuard {
        let count = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_in_flight(count);
        DispatchGuard {
            active_count: Arc::clone(&self.active_count),
            id: DispatchId::next(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until no dispatch is running or `timeout` elapses.
    ///
    /// Returns the number still running when it gave up (0 when drained).
    pub async fn wait_idle(&self, timeout: Duration) -> u64 {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let active = self.active_count();
            if active == 0 || tokio::time::Instant::now() >= deadline {
                return active;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// Held by a dispatch task for its whole lifetime.
#[derive(Debug)]
pub struct DispatchGuard {
    active_count: Arc<AtomicU64>,
    id: DispatchId,
}

impl DispatchGuard {
    pub fn id(&self) -> DispatchId {
        self.id
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        let remaining = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_in_flight(remaining);
        tracing::trace!(dispatch_id = %self.id, "Dispatch finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_dispatch_gets_a_fresh_id() {
        let tracker = InFlightTracker::new();
        let first = tracker.track();
        let second = tracker.track();
        assert!(second.id().as_u64() > first.id().as_u64());
        assert_eq!(second.id().to_string(), format!("dispatch-{}", second.id().as_u64()));
    }

    #[tokio::test]
    async fn guard_released_when_task_ends() {
        let tracker = InFlightTracker::new();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let guard = tracker.track();
                tokio::spawn(async move {
                    let _guard = guard;
                    tokio::time::sleep(Duration::from_millis(10)).await;
                })
            })
            .collect();
        assert_eq!(tracker.active_count(), 3);

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn panicking_dispatch_still_releases() {
        let tracker = InFlightTracker::new();
        let guard = tracker.track();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("dispatch blew up");
        });

        assert!(handle.await.unwrap_err().is_panic());
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn aborted_dispatch_releases() {
        let tracker = InFlightTracker::new();
        let guard = tracker.track();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            std::future::pending::<()>().await;
        });
        assert_eq!(tracker.active_count(), 1);

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn drain_waits_for_running_dispatches() {
        let tracker = InFlightTracker::new();
        let guard = tracker.track();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(guard);
        });
        assert_eq!(tracker.wait_idle(Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn drain_gives_up_at_deadline() {
        let tracker = InFlightTracker::new();
        let _stuck = tracker.track();
        assert_eq!(tracker.wait_idle(Duration::from_millis(60)).await, 1);
    }
}
