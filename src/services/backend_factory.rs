//! Backend factory for storage layer initialization.
//!
//! Centralizes the construction of the persistence gateway and the remote
//! provider from configuration, so the CLI and tests wire services the same
//! way.
//!
//! ```text
//! BackendFactory
//!   ├── create_gateway() → Arc<dyn PersistenceGateway>
//!   └── create_remote()  → Arc<dyn RemoteProvider>
//! ```

use crate::config::{BackendKind, QuoteSyncConfig, RemoteSettings};
use crate::storage::{
    FilesystemGateway, HttpRemote, MemoryGateway, PersistenceGateway, RemoteProvider,
    SqliteGateway,
};
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;

/// File name of the `SQLite` database under the data dir.
pub const SQLITE_FILE_NAME: &str = "quotes.db";

/// Factory for creating storage backends.
pub struct BackendFactory;

impl BackendFactory {
    /// Creates the persistence gateway selected by `kind`.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the data dir or database cannot be created.
    pub fn create_gateway(
        kind: BackendKind,
        data_dir: &Path,
    ) -> Result<Arc<dyn PersistenceGateway>> {
        let gateway: Arc<dyn PersistenceGateway> = match kind {
            BackendKind::Filesystem => Arc::new(FilesystemGateway::with_create(data_dir)?),
            BackendKind::Sqlite => Arc::new(SqliteGateway::new(data_dir.join(SQLITE_FILE_NAME))?),
            BackendKind::Memory => Arc::new(MemoryGateway::new()),
        };
        tracing::debug!(
            backend = kind.as_str(),
            data_dir = %data_dir.display(),
            "Created persistence gateway"
        );
        Ok(gateway)
    }

    /// Creates the HTTP remote described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no URL is configured.
    pub fn create_remote(settings: &RemoteSettings) -> Result<Arc<dyn RemoteProvider>> {
        let url = settings
            .url
            .as_deref()
            .ok_or_else(|| Error::Config("no remote url configured".to_string()))?;
        let remote = HttpRemote::new(
            url,
            settings.format,
            settings.default_category.as_str(),
            settings.timeout(),
        )?;
        tracing::debug!(url, format = settings.format.as_str(), "Created HTTP remote");
        Ok(Arc::new(remote))
    }

    /// Creates the gateway for `config`.
    ///
    /// # Errors
    ///
    /// See [`Self::create_gateway`].
    pub fn gateway_for(config: &QuoteSyncConfig) -> Result<Arc<dyn PersistenceGateway>> {
        Self::create_gateway(config.backend, &config.data_dir)
    }
}
