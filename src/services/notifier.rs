//! Conflict notification and manual resolution.
//!
//! The sync engine never blocks on a decision: when a pass finds divergence it
//! hands a [`ConflictSummary`] to every registered [`ConflictNotifier`] and
//! moves on. A caller that wants to settle the divergence explicitly uses a
//! [`ConflictResolver`].

use super::reconcile::Reconciliation;
use super::sync::SyncEngine;
use crate::Result;
use crate::models::{ConflictPolicy, ResolveAction, SyncEvent, SyncResult};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// What a divergent sync pass found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictSummary {
    /// Records admitted from the remote.
    pub new_count: usize,
    /// Keys present on both sides with different categories.
    pub conflict_count: usize,
    /// Texts of the conflicting keys.
    pub conflicting_keys: Vec<String>,
    /// Human-readable summary.
    pub message: String,
}

impl ConflictSummary {
    pub(crate) fn from_pass(result: &SyncResult, plan: &Reconciliation) -> Self {
        Self {
            new_count: result.new_count,
            conflict_count: result.conflict_count,
            conflicting_keys: plan.conflicting_keys(),
            message: result.summary(),
        }
    }
}

/// Receives divergence summaries. Called at most once per sync pass.
pub trait ConflictNotifier: Send + Sync {
    /// Called after a pass that admitted new records or found conflicts.
    fn on_conflict(&self, summary: &ConflictSummary);
}

/// Adapts a closure into a [`ConflictNotifier`].
pub struct FnNotifier<F>(F);

impl<F> FnNotifier<F>
where
    F: Fn(&ConflictSummary) + Send + Sync,
{
    /// Wraps `f`.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ConflictNotifier for FnNotifier<F>
where
    F: Fn(&ConflictSummary) + Send + Sync,
{
    fn on_conflict(&self, summary: &ConflictSummary) {
        (self.0)(summary);
    }
}

/// Notifier that logs every summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ConflictNotifier for LogNotifier {
    fn on_conflict(&self, summary: &ConflictSummary) {
        info!(
            new_count = summary.new_count,
            conflict_count = summary.conflict_count,
            "{}",
            summary.message
        );
    }
}

/// Keeps the latest unresolved summary until a resolution discards it.
#[derive(Debug, Default)]
pub struct PendingConflict {
    slot: Mutex<Option<ConflictSummary>>,
}

impl PendingConflict {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<ConflictSummary>> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Returns the pending summary, if any.
    #[must_use]
    pub fn peek(&self) -> Option<ConflictSummary> {
        self.slot().clone()
    }

    /// Returns true if a summary is waiting for resolution.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot().is_some()
    }

    /// Discards and returns the pending summary.
    pub fn take(&self) -> Option<ConflictSummary> {
        self.slot().take()
    }
}

impl ConflictNotifier for PendingConflict {
    fn on_conflict(&self, summary: &ConflictSummary) {
        *self.slot() = Some(summary.clone());
    }
}

/// Applies manual resolution decisions through a sync engine.
///
/// Resolving is idempotent: repeating an action with no remote change in
/// between leaves the store in the same state.
#[derive(Clone)]
pub struct ConflictResolver {
    engine: Arc<SyncEngine>,
}

impl ConflictResolver {
    /// Creates a resolver for `engine`.
    #[must_use]
    pub const fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }

    /// Returns the summary waiting for a decision, if any.
    #[must_use]
    pub fn pending(&self) -> Option<ConflictSummary> {
        self.engine.pending().peek()
    }

    /// Applies `action`.
    ///
    /// - `Local`: persist the store as it is, admit nothing from the remote
    /// - `Server`: fetch the remote and replace the store with it
    /// - `Merge`: run a `merge` sync
    ///
    /// # Errors
    ///
    /// Returns an error if persisting or fetching fails. A failed resolution
    /// leaves the store and the pending summary unchanged.
    #[instrument(skip(self), fields(operation = "resolve", action = %action))]
    pub async fn resolve(&self, action: ResolveAction) -> Result<()> {
        match action {
            ResolveAction::Local => {
                self.engine.persist_local().await?;
                self.engine.pending().take();
            },
            ResolveAction::Server => {
                let count = self.engine.replace_with_remote().await?;
                self.engine.pending().take();
                info!(count, "Replaced local quotes with server copy");
            },
            ResolveAction::Merge => {
                // A coalesced call only waited on someone else's pass, which may
                // have run under another policy.
                while self.engine.sync(ConflictPolicy::Merge).await?.is_coalesced() {
                    debug!("Merge resolution coalesced; running its own pass");
                }
                self.engine.pending().take();
            },
        }
        self.engine.publish(SyncEvent::Resolved { action });
        metrics::counter!("quote_resolve_total", "action" => action.as_str()).increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn summary(new_count: usize) -> ConflictSummary {
        ConflictSummary {
            new_count,
            conflict_count: 0,
            conflicting_keys: Vec::new(),
            message: format!("Fetched {new_count} new quotes from server."),
        }
    }

    #[test]
    fn test_pending_conflict_keeps_latest() {
        let pending = PendingConflict::new();
        assert!(!pending.is_pending());

        pending.on_conflict(&summary(1));
        pending.on_conflict(&summary(2));
        assert_eq!(pending.peek().map(|s| s.new_count), Some(2));

        assert!(pending.take().is_some());
        assert!(!pending.is_pending());
        assert!(pending.take().is_none());
    }

    #[test]
    fn test_fn_notifier_invokes_closure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let notifier = FnNotifier::new(move |s: &ConflictSummary| {
            counter.fetch_add(s.new_count, Ordering::SeqCst);
        });

        notifier.on_conflict(&summary(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
