//! Sync lifecycle events for observability.

use super::{ConflictPolicy, ResolveAction};
use chrono::{DateTime, Utc};

/// Events emitted by the sync engine, the scheduler and the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A sync pass committed a merged collection.
    Completed {
        /// Policy the pass ran under.
        policy: ConflictPolicy,
        /// Records admitted from the remote.
        new_count: usize,
        /// Divergent keys.
        conflict_count: usize,
        /// Commit time.
        merged_at: DateTime<Utc>,
    },
    /// A sync pass aborted; the store is unchanged.
    Failed {
        /// Failure description.
        cause: String,
        /// When the failure was observed.
        at: DateTime<Utc>,
    },
    /// A sync call was folded into one already in flight.
    Coalesced,
    /// Divergence was found and handed to the notifiers.
    ConflictDetected {
        /// Records admitted from the remote.
        new_count: usize,
        /// Divergent keys.
        conflict_count: usize,
    },
    /// Pushing local records stopped early.
    PushFailed {
        /// Records pushed before the failure.
        pushed: usize,
        /// Failure description.
        cause: String,
    },
    /// A manual resolution was applied.
    Resolved {
        /// The action taken.
        action: ResolveAction,
    },
    /// The scheduler started (or restarted) its timer.
    SchedulerStarted {
        /// Firing interval in milliseconds.
        interval_ms: u64,
    },
    /// The scheduler timer was cancelled.
    SchedulerStopped,
}

impl SyncEvent {
    /// Returns the event type as a string slice.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Coalesced => "coalesced",
            Self::ConflictDetected { .. } => "conflict_detected",
            Self::PushFailed { .. } => "push_failed",
            Self::Resolved { .. } => "resolved",
            Self::SchedulerStarted { .. } => "scheduler_started",
            Self::SchedulerStopped => "scheduler_stopped",
        }
    }
}
