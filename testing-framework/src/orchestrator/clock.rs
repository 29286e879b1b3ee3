// File: testing-framework/src/orchestrator/clock.rs
//
// Clock Abstraction
//
// Every wait in the harness goes through this trait so retry loops can be
// driven by tokio's paused time, or observed through `CountingClock`.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{self, Duration, Instant};

/// Time source and sleeper injected into the waiter and the simulated node
///
/// `sleep` must suspend only the calling task, so concurrent scenarios keep
/// making progress while one of them waits.
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use tokio::time::Duration;
/// use ledger_testing_framework::orchestrator::clock::{Clock, PausedClock};
///
/// #[tokio::test(start_paused = true)]
/// async fn test_with_paused_time() {
///     let clock = Arc::new(PausedClock::new());
///     let start = clock.now();
///     clock.sleep(Duration::from_secs(5)).await;
///     assert_eq!(clock.now() - start, Duration::from_secs(5));
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Current instant (simulated under paused time)
    fn now(&self) -> Instant;

    /// Suspend the calling task for `d`
    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Wall-clock time, for runs against real nodes
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        time::Instant::now()
    }

    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(time::sleep(d))
    }
}

/// Tokio paused time
///
/// Once paused, the runtime auto-advances to the next pending timer whenever
/// every task is idle, so retry sleeps cost no real time. `advance()` moves
/// time forward explicitly.
pub struct PausedClock;

impl PausedClock {
    /// Create the clock
    ///
    /// The runtime must already be paused, e.g. with
    /// `#[tokio::test(start_paused = true)]`. Starting paused keeps every
    /// auto-advance on whole milliseconds, which `time::pause()` mid-test
    /// does not.
    pub fn new() -> Self {
        Self
    }

    /// Move simulated time forward, waking any sleeps that expire
    pub async fn advance(&self, d: Duration) {
        time::advance(d).await
    }
}

impl Clock for PausedClock {
    fn now(&self) -> Instant {
        time::Instant::now()
    }

    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(time::sleep(d))
    }
}

impl Default for PausedClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps another clock and records every sleep request
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use tokio::time::Duration;
/// use ledger_testing_framework::orchestrator::clock::{Clock, CountingClock, PausedClock};
///
/// #[tokio::test(start_paused = true)]
/// async fn test_counts_sleeps() {
///     let clock = CountingClock::new(Arc::new(PausedClock::new()));
///     clock.sleep(Duration::from_millis(20)).await;
///     clock.sleep(Duration::from_millis(30)).await;
///     assert_eq!(clock.sleep_count(), 2);
///     assert_eq!(clock.total_slept(), Duration::from_millis(50));
/// }
/// ```
pub struct CountingClock {
    inner: Arc<dyn Clock>,
    sleeps: AtomicU64,
    slept_nanos: AtomicU64,
}

impl CountingClock {
    /// Wrap `inner`
    pub fn new(inner: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            sleeps: AtomicU64::new(0),
            slept_nanos: AtomicU64::new(0),
        }
    }

    /// Number of `sleep` calls so far
    pub fn sleep_count(&self) -> u64 {
        self.sleeps.load(Ordering::SeqCst)
    }

    /// Sum of all requested sleep durations
    pub fn total_slept(&self) -> Duration {
        Duration::from_nanos(self.slept_nanos.load(Ordering::SeqCst))
    }
}

impl Clock for CountingClock {
    fn now(&self) -> Instant {
        self.inner.now()
    }

    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        let nanos = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        // Saturate instead of wrapping on overflow
        let _ = self
            .slept_nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |total| {
                Some(total.saturating_add(nanos))
            });
        self.inner.sleep(d)
    }
}
