//! Business logic services.
//!
//! Services orchestrate the record store, the persistence gateway and the
//! remote provider:
//! - [`QuoteService`]: local add/import/browse/export
//! - [`SyncEngine`]: one fetch → diff → merge → persist → notify → push pass
//! - [`SyncScheduler`]: the recurring, cancellable sync timer
//! - [`ConflictResolver`]: explicit resolution of a pending divergence

mod backend_factory;
mod notifier;
mod quotes;
pub mod reconcile;
mod scheduler;
mod sync;

pub use backend_factory::{BackendFactory, SQLITE_FILE_NAME};
pub use notifier::{
    ConflictNotifier, ConflictResolver, ConflictSummary, FnNotifier, LogNotifier,
    PendingConflict,
};
pub use quotes::QuoteService;
pub use reconcile::{Conflict, Reconciliation, dedup_by_text, reconcile};
pub use scheduler::{MIN_INTERVAL_MS, SchedulerState, SyncScheduler};
pub use sync::SyncEngine;
