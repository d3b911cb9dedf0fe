//! Data models for quote-sync.
//!
//! This module contains the value types shared by the store, the engine and
//! the scheduler.

mod events;
mod policy;
mod quote;
mod sync;

pub use events::SyncEvent;
pub use policy::{ConflictPolicy, PushMode, ResolveAction};
pub use quote::{ALL_CATEGORIES, Quote};
pub use sync::{PushReport, SyncOutcome, SyncReport, SyncResult};
