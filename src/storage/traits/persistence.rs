//! Persistence gateway trait.

use crate::Result;

/// Key holding the serialized quote collection.
pub const QUOTES_KEY: &str = "quotes";

/// Key holding the last selected category preference.
pub const LAST_CATEGORY_KEY: &str = "lastSelectedCategory";

/// Durable key/value store behind the record store.
///
/// Gateways are treated as synchronous and fast. A `save` either fully
/// replaces the value under `key` or fails without touching it.
pub trait PersistenceGateway: Send + Sync {
    /// Loads the value stored under `key`, or `None` if nothing was saved yet.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Returns a short backend name for logs and metrics.
    fn backend_name(&self) -> &'static str;

    /// Checks if a value exists under `key`.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.load(key)?.is_some())
    }
}
