//! # quote-sync
//!
//! Keeps a locally persisted collection of quotes reconciled with a remote
//! collection.
//!
//! The crate is built around a small core:
//!
//! - [`RecordStore`]: the in-memory, insertion-ordered collection of quotes
//! - [`PersistenceGateway`]: pluggable key/value persistence (memory, filesystem, `SQLite`)
//! - [`RemoteProvider`]: the remote collection endpoint (HTTP or in-process)
//! - [`SyncEngine`]: fetch, diff, merge, persist and notify under a [`ConflictPolicy`]
//! - [`SyncScheduler`]: recurring or one-shot sync passes
//! - [`ConflictResolver`]: manual resolution after a divergent sync
//!
//! ## Example
//!
//! ```rust,ignore
//! use quote_sync::{ConflictPolicy, MemoryGateway, MemoryRemote, QuoteService, SyncEngine};
//! use std::sync::Arc;
//!
//! let service = QuoteService::open(Arc::new(MemoryGateway::new()))?;
//! let engine = SyncEngine::new(service.store(), service.gateway(), Arc::new(MemoryRemote::new()));
//! service.add("Stay hungry", "inspiration")?;
//! let outcome = engine.sync(ConflictPolicy::Merge).await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::{
    BackendKind, LogFormat, LoggingSettings, QuoteSyncConfig, RemoteSettings, SyncSettings,
};
pub use models::{
    ALL_CATEGORIES, ConflictPolicy, PushMode, PushReport, Quote, ResolveAction, SyncEvent,
    SyncOutcome, SyncReport, SyncResult,
};
pub use observability::EventBus;
pub use services::{
    BackendFactory, ConflictNotifier, ConflictResolver, ConflictSummary, FnNotifier,
    LogNotifier, PendingConflict, QuoteService, SchedulerState, SyncEngine, SyncScheduler,
};
pub use storage::{
    FilesystemGateway, HttpRemote, MemoryGateway, MemoryRemote, PersistenceGateway, RecordStore,
    RemoteFormat, RemoteProvider, SharedStore, SqliteGateway,
};

/// Error type for quote-sync operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Validation` | A quote has empty text or category after trimming |
/// | `RemoteUnavailable` | Fetching from or pushing to the remote fails |
/// | `Config` | The scheduler interval is below one second, config values are invalid |
/// | `Persistence` | The key/value gateway cannot load or save |
/// | `InvalidInput` | A policy, action or mode string cannot be parsed |
/// | `OperationFailed` | Poisoned locks, missing async runtime, logging init |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A record failed validation and was rejected before any mutation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The remote collection could not be reached.
    ///
    /// The local store is never touched when this is raised during a fetch.
    #[error("remote unavailable during '{operation}': {cause}")]
    RemoteUnavailable {
        /// The remote operation (`fetch_all`, `push`).
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The persistence gateway failed.
    #[error("persistence '{operation}' failed: {cause}")]
    Persistence {
        /// The persistence operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds a [`Error::Persistence`] from any displayable cause.
    pub fn persistence(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::Persistence {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }

    /// Builds a [`Error::RemoteUnavailable`] from any displayable cause.
    pub fn remote(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::RemoteUnavailable {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }

    /// Returns true if this error came from the remote side.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUnavailable { .. })
    }
}

/// Result type alias for quote-sync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Validation("quote text is empty".to_string());
        assert_eq!(err.to_string(), "validation failed: quote text is empty");

        let err = Error::remote("fetch_all", "connection refused");
        assert_eq!(
            err.to_string(),
            "remote unavailable during 'fetch_all': connection refused"
        );
        assert!(err.is_remote());

        let err = Error::persistence("save", "disk full");
        assert_eq!(err.to_string(), "persistence 'save' failed: disk full");
        assert!(!err.is_remote());
    }
}
