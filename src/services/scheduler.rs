//! Recurring sync scheduler.
//!
//! A background tokio task ticks every `interval_ms` and runs a sync pass
//! with the engine's current policy. Restarting cancels the prior task first,
//! so two timers never coexist. Cancelling only prevents future firings; a
//! pass that is already running finishes normally.

use super::sync::SyncEngine;
use crate::models::{SyncEvent, SyncOutcome};
use crate::{Error, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Shortest accepted interval between scheduled syncs.
pub const MIN_INTERVAL_MS: u64 = 1000;

/// Whether the recurring timer is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No timer.
    Stopped,
    /// A timer fires every `interval_ms`.
    Running {
        /// Firing interval in milliseconds.
        interval_ms: u64,
    },
}

impl SchedulerState {
    /// Returns true if a timer is armed.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

struct ActiveTimer {
    interval_ms: u64,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Starts, stops and restarts the periodic sync timer.
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    active: Mutex<Option<ActiveTimer>>,
    fired: Arc<AtomicU64>,
}

impl SyncScheduler {
    /// Creates a stopped scheduler driving `engine`.
    #[must_use]
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self {
            engine,
            active: Mutex::new(None),
            fired: Arc::new(AtomicU64::new(0)),
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveTimer>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.active()
            .as_ref()
            .map_or(SchedulerState::Stopped, |timer| SchedulerState::Running {
                interval_ms: timer.interval_ms,
            })
    }

    /// Returns how many times the timer has fired since creation.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::SeqCst)
    }

    /// Arms the timer to sync every `interval_ms`, replacing any prior timer.
    ///
    /// The first firing happens one full interval after the call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `interval_ms` is below [`MIN_INTERVAL_MS`],
    /// leaving any existing timer untouched, and [`Error::OperationFailed`]
    /// if called outside a tokio runtime.
    pub fn start(&self, interval_ms: u64) -> Result<()> {
        if interval_ms < MIN_INTERVAL_MS {
            return Err(Error::Config(format!(
                "sync interval must be at least {MIN_INTERVAL_MS}ms, got {interval_ms}ms"
            )));
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| Error::OperationFailed {
                operation: "start_scheduler".to_string(),
                cause: e.to_string(),
            })?;

        let mut active = self.active();
        if let Some(prior) = active.take() {
            debug!(interval_ms = prior.interval_ms, "Cancelling prior sync timer");
            cancel(prior);
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = runtime.spawn(run_timer(
            Arc::clone(&self.engine),
            Arc::clone(&self.fired),
            Duration::from_millis(interval_ms),
            cancel_rx,
        ));
        *active = Some(ActiveTimer {
            interval_ms,
            cancel: cancel_tx,
            handle,
        });
        drop(active);

        info!(interval_ms, "Sync scheduler started");
        self.engine.publish(SyncEvent::SchedulerStarted { interval_ms });
        Ok(())
    }

    /// Disarms the timer. Does nothing when already stopped.
    pub fn stop(&self) {
        let Some(timer) = self.active().take() else {
            return;
        };
        cancel(timer);
        info!("Sync scheduler stopped");
        self.engine.publish(SyncEvent::SchedulerStopped);
    }

    /// Runs one sync pass now with the current policy.
    ///
    /// Independent of the scheduler state; the timer's phase is not reset.
    ///
    /// # Errors
    ///
    /// Returns the sync pass error.
    pub async fn trigger_once(&self) -> Result<SyncOutcome> {
        self.engine.sync(self.engine.policy()).await
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.active().take() {
            cancel(timer);
        }
    }
}

/// Signals the timer task to exit. The task is never aborted, so an
/// in-flight pass runs to completion.
fn cancel(timer: ActiveTimer) {
    let _ = timer.cancel.send(true);
    drop(timer.handle);
}

async fn run_timer(
    engine: Arc<SyncEngine>,
    fired: Arc<AtomicU64>,
    period: Duration,
    mut cancelled: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = cancelled.changed() => {
                if changed.is_err() || *cancelled.borrow() {
                    break;
                }
            },
            _ = ticker.tick() => {
                fired.fetch_add(1, Ordering::SeqCst);
                metrics::counter!("quote_scheduler_fired_total").increment(1);
                run_scheduled_sync(&engine).await;
            },
        }
    }
    debug!("Sync timer exited");
}

async fn run_scheduled_sync(engine: &SyncEngine) {
    match engine.sync_current().await {
        Ok(SyncOutcome::Applied(report)) => {
            debug!(
                new_count = report.result.new_count,
                conflict_count = report.result.conflict_count,
                "Scheduled sync completed"
            );
        },
        Ok(SyncOutcome::Coalesced) => debug!("Scheduled sync coalesced"),
        Err(e) => {
            // The next tick is the retry.
            warn!(error = %e, at = %Utc::now(), "Scheduled sync failed");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryGateway, MemoryRemote, RecordStore};

    fn scheduler() -> (SyncScheduler, Arc<MemoryRemote>) {
        let remote = Arc::new(MemoryRemote::new());
        let engine = SyncEngine::new(
            RecordStore::new().into_shared(),
            Arc::new(MemoryGateway::new()),
            Arc::clone(&remote) as Arc<dyn crate::storage::RemoteProvider>,
        );
        (SyncScheduler::new(Arc::new(engine)), remote)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop() {
        let (scheduler, _remote) = scheduler();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);

        scheduler.start(1000).unwrap();
        assert_eq!(
            scheduler.state(),
            SchedulerState::Running { interval_ms: 1000 }
        );

        scheduler.stop();
        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test]
    async fn test_rejects_sub_second_interval() {
        let (scheduler, _remote) = scheduler();
        scheduler.start(5000).unwrap();

        let err = scheduler.start(999).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(
            scheduler.state(),
            SchedulerState::Running { interval_ms: 5000 }
        );
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let (scheduler, _remote) = scheduler();
        let err = scheduler.start(1000).unwrap_err();
        assert!(matches!(err, Error::OperationFailed { .. }));
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_once_does_not_need_timer() {
        let (scheduler, remote) = scheduler();
        let outcome = scheduler.trigger_once().await.unwrap();
        assert!(!outcome.is_coalesced());
        assert_eq!(remote.fetch_count(), 1);
        assert_eq!(scheduler.fired(), 0);
    }
}
