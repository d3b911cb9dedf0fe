//! Configuration management.
//!
//! Settings come from a TOML file, then `QUOTE_SYNC_*` environment
//! variables override individual fields. Example:
//!
//! ```toml
//! data_dir = "/var/lib/quote-sync"
//! backend = "sqlite"
//!
//! [remote]
//! url = "https://jsonplaceholder.typicode.com/posts"
//! format = "posts"
//! default_category = "Server"
//! timeout_ms = 10000
//!
//! [sync]
//! policy = "merge"
//! interval_ms = 30000
//! auto_start = true
//! push = "only-local"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! file = "/var/log/quote-sync.log"
//! ```

use crate::models::{ConflictPolicy, PushMode};
use crate::services::MIN_INTERVAL_MS;
use crate::storage::RemoteFormat;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "QUOTE_SYNC_CONFIG_PATH";

/// Persistence backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// One JSON file per key under the data dir.
    #[default]
    Filesystem,
    /// `SQLite` key/value table in `quotes.db` under the data dir.
    Sqlite,
    /// Process memory; nothing survives a restart.
    Memory,
}

impl BackendKind {
    /// Parses a backend name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "filesystem" | "fs" | "file" => Some(Self::Filesystem),
            "sqlite" => Some(Self::Sqlite),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }

    /// Returns the backend name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything but `json` is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Remote endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    /// Collection endpoint. `None` disables every remote operation.
    pub url: Option<String>,
    /// Payload shape returned by `GET url`.
    pub format: RemoteFormat,
    /// Category given to records from a `posts` remote.
    pub default_category: String,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            url: None,
            format: RemoteFormat::default(),
            default_category: "Server".to_string(),
            timeout_ms: None,
        }
    }
}

impl RemoteSettings {
    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Sync and scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Policy for scheduled and default syncs.
    pub policy: ConflictPolicy,
    /// Scheduler interval.
    pub interval_ms: u64,
    /// Whether `watch` arms the timer immediately.
    pub auto_start: bool,
    /// Which local records are pushed back after a pass.
    pub push: PushMode,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            policy: ConflictPolicy::default(),
            interval_ms: 30_000,
            auto_start: true,
            push: PushMode::default(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default filter directive, e.g. `info` or `quote_sync=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Append to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Main configuration for quote-sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSyncConfig {
    /// Directory holding persisted state.
    pub data_dir: PathBuf,
    /// Persistence backend.
    pub backend: BackendKind,
    /// Remote endpoint.
    pub remote: RemoteSettings,
    /// Sync behavior.
    pub sync: SyncSettings,
    /// Logging.
    pub logging: LoggingSettings,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Backend name.
    pub backend: Option<String>,
    /// Remote section.
    pub remote: Option<ConfigFileRemote>,
    /// Sync section.
    pub sync: Option<ConfigFileSync>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// `[remote]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileRemote {
    /// Endpoint URL.
    pub url: Option<String>,
    /// `quotes` or `posts`.
    pub format: Option<String>,
    /// Category for `posts` records.
    pub default_category: Option<String>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
}

/// `[sync]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileSync {
    /// `server-wins`, `local-wins` or `merge`.
    pub policy: Option<String>,
    /// Scheduler interval.
    pub interval_ms: Option<u64>,
    /// Arm the timer on `watch`.
    pub auto_start: Option<bool>,
    /// `none`, `only-local` or `all`.
    pub push: Option<String>,
}

/// `[logging]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// Filter directive.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl Default for QuoteSyncConfig {
    fn default() -> Self {
        let data_dir = directories::BaseDirs::new().map_or_else(
            || PathBuf::from(".quote-sync"),
            |dirs| dirs.data_local_dir().join("quote-sync"),
        );
        Self {
            data_dir,
            backend: BackendKind::default(),
            remote: RemoteSettings::default(),
            sync: SyncSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl QuoteSyncConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves and loads the configuration, then applies env overrides.
    ///
    /// Lookup order: `explicit`, then `QUOTE_SYNC_CONFIG_PATH`, then
    /// `<config dir>/quote-sync/config.toml`, then defaults. An explicitly
    /// named file must exist; the platform file is skipped if unreadable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an explicit file cannot be read or parsed,
    /// or if an override holds an unparseable value.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::parse_toml(&contents)
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed TOML, unknown keys or invalid values.
    pub fn parse_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::Config(format!("invalid config: {e}")))?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the platform config dir, or defaults.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let path = base_dirs.config_dir().join("quote-sync").join("config.toml");
        if path.exists() {
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring config file");
                },
            }
        }
        Self::default()
    }

    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(backend) = file.backend {
            config.backend = parse_backend(&backend)?;
        }
        if let Some(remote) = file.remote {
            if let Some(url) = remote.url {
                config.remote.url = Some(url);
            }
            if let Some(format) = remote.format {
                config.remote.format = parse_format(&format)?;
            }
            if let Some(category) = remote.default_category {
                config.remote.default_category = category;
            }
            config.remote.timeout_ms = remote.timeout_ms.or(config.remote.timeout_ms);
        }
        if let Some(sync) = file.sync {
            if let Some(policy) = sync.policy {
                config.sync.policy = policy.parse()?;
            }
            if let Some(interval_ms) = sync.interval_ms {
                config.sync.interval_ms = interval_ms;
            }
            if let Some(auto_start) = sync.auto_start {
                config.sync.auto_start = auto_start;
            }
            if let Some(push) = sync.push {
                config.sync.push = PushMode::parse(&push)
                    .ok_or_else(|| Error::Config(format!("unknown push mode: {push}")))?;
            }
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }

        Ok(config)
    }

    /// Applies `QUOTE_SYNC_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an override value cannot be parsed.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("QUOTE_SYNC_REMOTE_URL") {
            self.remote.url = Some(url);
        }
        if let Some(interval) = get("QUOTE_SYNC_INTERVAL_MS") {
            self.sync.interval_ms = interval.trim().parse().map_err(|_| {
                Error::Config(format!("QUOTE_SYNC_INTERVAL_MS is not a number: {interval}"))
            })?;
        }
        if let Some(policy) = get("QUOTE_SYNC_POLICY") {
            self.sync.policy = policy.parse()?;
        }
        if let Some(data_dir) = get("QUOTE_SYNC_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Some(backend) = get("QUOTE_SYNC_BACKEND") {
            self.backend = parse_backend(&backend)?;
        }
        Ok(self)
    }

    /// Checks settings that can only be wrong, not merely absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the sync interval is below one second or
    /// the remote URL is blank.
    pub fn validate(&self) -> Result<()> {
        if self.sync.interval_ms < MIN_INTERVAL_MS {
            return Err(Error::Config(format!(
                "sync.interval_ms must be at least {MIN_INTERVAL_MS}, got {}",
                self.sync.interval_ms
            )));
        }
        if self.remote.url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(Error::Config("remote.url must not be empty".to_string()));
        }
        Ok(())
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the persistence backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }
}

fn parse_backend(s: &str) -> Result<BackendKind> {
    BackendKind::parse(s).ok_or_else(|| Error::Config(format!("unknown backend: {s}")))
}

fn parse_format(s: &str) -> Result<RemoteFormat> {
    RemoteFormat::parse(s).ok_or_else(|| Error::Config(format!("unknown remote format: {s}")))
}
