//! Quote synchronization engine.
//!
//! One sync pass is fetch → diff → merge → persist → notify → push:
//!
//! 1. Fetch the full remote collection (the only suspending step).
//! 2. Take the store's write lock and snapshot the local collection. The
//!    snapshot is taken after the fetch, so quotes added while the fetch was
//!    in flight are part of the diff.
//! 3. Reconcile under the requested [`ConflictPolicy`].
//! 4. Persist the result, then swap it into the store. A failed save leaves
//!    the store untouched.
//! 5. Report a [`SyncResult`] and notify if anything diverged.
//! 6. Optionally push local records back, stopping at the first failure.
//!
//! At most one pass runs at a time. A `sync` call made while another pass is
//! in flight waits for it to finish and returns [`SyncOutcome::Coalesced`]
//! without touching the store.

use super::notifier::{ConflictNotifier, ConflictSummary, PendingConflict};
use super::reconcile::{Reconciliation, reconcile};
use crate::Result;
use crate::models::{
    ConflictPolicy, PushMode, PushReport, Quote, SyncEvent, SyncOutcome, SyncReport, SyncResult,
};
use crate::observability::EventBus;
use crate::storage::codec::save_quotes;
use crate::storage::{PersistenceGateway, RemoteProvider, SharedStore, read_store, write_store};
use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Reconciles a shared record store with a remote provider.
pub struct SyncEngine {
    store: SharedStore,
    gateway: Arc<dyn PersistenceGateway>,
    remote: Arc<dyn RemoteProvider>,
    notifiers: Vec<Arc<dyn ConflictNotifier>>,
    pending: Arc<PendingConflict>,
    events: Option<EventBus>,
    push_mode: PushMode,
    policy: RwLock<ConflictPolicy>,
    last_result: Mutex<Option<SyncResult>>,
    /// Held for the whole duration of a pass.
    pass_guard: tokio::sync::Mutex<()>,
}

impl SyncEngine {
    /// Creates an engine over `store`, persisting through `gateway`.
    ///
    /// Pushing defaults to [`PushMode::OnlyLocal`] and the current policy to
    /// [`ConflictPolicy::Merge`].
    #[must_use]
    pub fn new(
        store: SharedStore,
        gateway: Arc<dyn PersistenceGateway>,
        remote: Arc<dyn RemoteProvider>,
    ) -> Self {
        Self {
            store,
            gateway,
            remote,
            notifiers: Vec::new(),
            pending: Arc::new(PendingConflict::new()),
            events: None,
            push_mode: PushMode::default(),
            policy: RwLock::new(ConflictPolicy::default()),
            last_result: Mutex::new(None),
            pass_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Sets which records are pushed back after a pass.
    #[must_use]
    pub const fn with_push_mode(mut self, mode: PushMode) -> Self {
        self.push_mode = mode;
        self
    }

    /// Sets the initial current policy.
    #[must_use]
    pub fn with_policy(self, policy: ConflictPolicy) -> Self {
        self.set_policy(policy);
        self
    }

    /// Registers an additional conflict notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ConflictNotifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Publishes lifecycle events to `bus`.
    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Returns the shared store.
    #[must_use]
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Returns the push mode.
    #[must_use]
    pub const fn push_mode(&self) -> PushMode {
        self.push_mode
    }

    /// Returns the current policy used by [`Self::sync_current`].
    #[must_use]
    pub fn policy(&self) -> ConflictPolicy {
        *self.policy.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Changes the current policy.
    pub fn set_policy(&self, policy: ConflictPolicy) {
        *self.policy.write().unwrap_or_else(PoisonError::into_inner) = policy;
    }

    /// Returns the result of the last applied pass.
    #[must_use]
    pub fn last_result(&self) -> Option<SyncResult> {
        *self.last_result.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the slot holding the latest unresolved divergence.
    #[must_use]
    pub fn pending(&self) -> &PendingConflict {
        &self.pending
    }

    /// Returns true if a pass is running right now.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.pass_guard.try_lock().is_err()
    }

    /// Runs a sync pass with the current policy.
    ///
    /// # Errors
    ///
    /// See [`Self::sync`].
    pub async fn sync_current(&self) -> Result<SyncOutcome> {
        self.sync(self.policy()).await
    }

    /// Runs a sync pass under `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RemoteUnavailable`] if the fetch fails and a
    /// persistence error if the merged collection cannot be saved. The store is unchanged
    /// in both cases. Push failures are reported in the [`SyncReport`], not
    /// returned.
    #[instrument(skip(self), fields(operation = "sync", policy = %policy))]
    pub async fn sync(&self, policy: ConflictPolicy) -> Result<SyncOutcome> {
        let Ok(_pass) = self.pass_guard.try_lock() else {
            debug!("Sync already in flight, waiting for it");
            metrics::counter!("quote_sync_coalesced_total").increment(1);
            let _done = self.pass_guard.lock().await;
            self.publish(SyncEvent::Coalesced);
            return Ok(SyncOutcome::Coalesced);
        };

        let start = Instant::now();
        let result = self.run_pass(policy).await;

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!(
            "quote_sync_total",
            "policy" => policy.as_str(),
            "status" => status
        )
        .increment(1);
        metrics::histogram!("quote_sync_duration_ms", "policy" => policy.as_str())
            .record(start.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(report) => Ok(SyncOutcome::Applied(report)),
            Err(e) => {
                warn!(error = %e, "Sync pass aborted, local quotes unchanged");
                self.publish(SyncEvent::Failed {
                    cause: e.to_string(),
                    at: Utc::now(),
                });
                Err(e)
            },
        }
    }

    async fn run_pass(&self, policy: ConflictPolicy) -> Result<SyncReport> {
        let remote = self.remote.fetch_all().await?;
        let plan = self.commit(&remote, policy)?;

        let result = SyncResult {
            new_count: plan.new_count,
            conflict_count: plan.conflict_count(),
            merged_at: Utc::now(),
        };
        *self.last_result.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        info!(
            new_count = result.new_count,
            conflict_count = result.conflict_count,
            total = plan.records.len(),
            "Sync pass committed"
        );
        self.publish(SyncEvent::Completed {
            policy,
            new_count: result.new_count,
            conflict_count: result.conflict_count,
            merged_at: result.merged_at,
        });

        if result.has_divergence() {
            self.notify(&ConflictSummary::from_pass(&result, &plan));
        }

        let push = match self.push_mode {
            PushMode::None => None,
            mode => Some(self.push_back(plan.push_candidates(mode)).await),
        };

        Ok(SyncReport {
            policy,
            result,
            push,
        })
    }

    /// Diffs against the freshest local snapshot, persists and swaps in the result.
    fn commit(&self, remote: &[Quote], policy: ConflictPolicy) -> Result<Reconciliation> {
        let mut store = write_store(&self.store)?;
        let plan = reconcile(store.all(), remote, policy);
        save_quotes(self.gateway.as_ref(), &plan.records)?;
        store.replace_all(plan.records.clone());
        Ok(plan)
    }

    fn notify(&self, summary: &ConflictSummary) {
        self.publish(SyncEvent::ConflictDetected {
            new_count: summary.new_count,
            conflict_count: summary.conflict_count,
        });
        self.pending.on_conflict(summary);
        for notifier in &self.notifiers {
            notifier.on_conflict(summary);
        }
    }

    /// Pushes `candidates` one at a time, stopping at the first failure.
    async fn push_back(&self, candidates: Vec<Quote>) -> PushReport {
        let mut report = PushReport {
            attempted: candidates.len(),
            ..PushReport::default()
        };

        for quote in &candidates {
            match self.remote.push(quote).await {
                Ok(()) => report.pushed += 1,
                Err(e) => {
                    warn!(error = %e, pushed = report.pushed, "Push stopped at first failure");
                    metrics::counter!("quote_push_total", "status" => "error").increment(1);
                    self.publish(SyncEvent::PushFailed {
                        pushed: report.pushed,
                        cause: e.to_string(),
                    });
                    report.error = Some(e.to_string());
                    return report;
                },
            }
        }

        metrics::counter!("quote_push_total", "status" => "success")
            .increment(report.pushed as u64);
        report
    }

    /// Persists the store as it is. Waits for any in-flight pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway fails.
    pub async fn persist_local(&self) -> Result<()> {
        let _pass = self.pass_guard.lock().await;
        let store = read_store(&self.store)?;
        save_quotes(self.gateway.as_ref(), store.all())
    }

    /// Fetches the remote and replaces the store with it, without notifying
    /// or pushing. Waits for any in-flight pass.
    ///
    /// Returns the number of records now in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch or the save fails; the store is
    /// unchanged in that case.
    pub async fn replace_with_remote(&self) -> Result<usize> {
        let _pass = self.pass_guard.lock().await;
        let remote = self.remote.fetch_all().await?;
        let plan = self.commit(&remote, ConflictPolicy::ServerWins)?;
        Ok(plan.records.len())
    }

    pub(crate) fn publish(&self, event: SyncEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}
