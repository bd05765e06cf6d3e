use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use mast_models::record::Cycle;

use crate::runtime::CycleRuntime;

/// Interval floor; anything lower hammers the exchange port for no benefit.
pub const MIN_INTERVAL_SECONDS: u64 = 5;

struct LoopHandle {
    cancel: CancellationToken,
}

/// Fires cycles on a fixed interval with single-flight protection.
///
/// `start` runs one cycle immediately, then arms a repeating timer; a tick
/// that lands while a cycle is still in flight is a no-op. `stop` cancels the
/// timer; the current cycle, if any, runs to completion (no mid-cycle
/// cancellation). Restarting while running stops the old loop first.
pub struct CycleScheduler {
    runtime: Arc<CycleRuntime>,
    executing: Arc<AtomicBool>,
    handle: tokio::sync::Mutex<Option<LoopHandle>>,
}

impl CycleScheduler {
    pub fn new(runtime: Arc<CycleRuntime>) -> Self {
        Self {
            runtime,
            executing: Arc::new(AtomicBool::new(false)),
            handle: tokio::sync::Mutex::new(None),
        }
    }

    pub async fn start(&self, interval_seconds: u64) {
        self.stop().await;

        let interval_seconds = interval_seconds.max(MIN_INTERVAL_SECONDS);
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let runtime = Arc::clone(&self.runtime);
        let executing = Arc::clone(&self.executing);

        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_secs(interval_seconds));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately, so one cycle runs at start.
            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => {
                        info!("cycle scheduler loop stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        run_guarded(&runtime, &executing).await;
                    }
                }
            }
        });

        *self.handle.lock().await = Some(LoopHandle { cancel });
        info!(interval_seconds, "cycle scheduler started");
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.cancel.cancel();
            info!("cycle scheduler stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    /// Manually trigger a cycle under the same single-flight guard the timer
    /// uses. Returns `None` when a cycle is already in flight.
    pub async fn trigger(&self) -> Option<Cycle> {
        run_guarded(&self.runtime, &self.executing).await
    }
}

async fn run_guarded(runtime: &CycleRuntime, executing: &AtomicBool) -> Option<Cycle> {
    if executing
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        debug!("previous cycle still in flight, skipping tick");
        return None;
    }
    let cycle = runtime.run_cycle().await;
    executing.store(false, Ordering::SeqCst);
    Some(cycle)
}
