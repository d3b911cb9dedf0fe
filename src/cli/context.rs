//! Service wiring for CLI commands.

use crate::config::QuoteSyncConfig;
use crate::observability::EventBus;
use crate::services::{BackendFactory, LogNotifier, QuoteService, SyncEngine};
use crate::storage::RemoteProvider;
use crate::{Error, Result};
use std::sync::Arc;

/// Services built from one configuration, shared by every command.
pub struct AppContext {
    config: QuoteSyncConfig,
    quotes: QuoteService,
    remote: Option<Arc<dyn RemoteProvider>>,
    events: EventBus,
}

impl AppContext {
    /// Opens the configured gateway, hydrates the store and builds the remote.
    ///
    /// A missing remote URL is not an error here; commands that need the
    /// remote fail with [`Error::Config`] instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the gateway cannot be opened.
    pub fn from_config(config: QuoteSyncConfig) -> Result<Self> {
        config.validate()?;
        let gateway = BackendFactory::gateway_for(&config)?;
        let remote = match config.remote.url {
            Some(_) => Some(BackendFactory::create_remote(&config.remote)?),
            None => None,
        };
        Ok(Self::with_remote(config, QuoteService::open(gateway)?, remote))
    }

    /// Builds a context around existing services.
    #[must_use]
    pub fn with_remote(
        config: QuoteSyncConfig,
        quotes: QuoteService,
        remote: Option<Arc<dyn RemoteProvider>>,
    ) -> Self {
        let quotes = match &remote {
            Some(remote) => quotes.with_remote(Arc::clone(remote)),
            None => quotes,
        };
        Self {
            config,
            quotes,
            remote,
            events: EventBus::default(),
        }
    }

    /// Returns the loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &QuoteSyncConfig {
        &self.config
    }

    /// Returns the quote service.
    #[must_use]
    pub const fn quotes(&self) -> &QuoteService {
        &self.quotes
    }

    /// Returns the event bus the engine publishes to.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Builds a sync engine over the shared store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no remote is configured.
    pub fn engine(&self) -> Result<Arc<SyncEngine>> {
        let remote = self.remote.as_ref().ok_or_else(|| {
            Error::Config("no remote configured; set remote.url or QUOTE_SYNC_REMOTE_URL".to_string())
        })?;
        let engine = SyncEngine::new(self.quotes.store(), self.quotes.gateway(), Arc::clone(remote))
            .with_policy(self.config.sync.policy)
            .with_push_mode(self.config.sync.push)
            .with_notifier(Arc::new(LogNotifier))
            .with_event_bus(self.events.clone());
        Ok(Arc::new(engine))
    }
}
