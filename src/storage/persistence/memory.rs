//! In-memory persistence gateway.

use crate::storage::traits::PersistenceGateway;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Gateway that keeps values in a process-local map.
///
/// Used for tests and for the `memory` backend. `fail_saves` lets tests
/// exercise the persistence failure path.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    values: Mutex<HashMap<String, Vec<u8>>>,
    fail_saves: AtomicBool,
}

impl MemoryGateway {
    /// Creates an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `save` fail (or succeed again).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let values = self
            .values
            .lock()
            .map_err(|e| Error::persistence("memory_load", e))?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::persistence("memory_save", "saves disabled"));
        }
        let mut values = self
            .values
            .lock()
            .map_err(|e| Error::persistence("memory_save", e))?;
        values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let gateway = MemoryGateway::new();
        assert!(gateway.load("k").unwrap().is_none());
        assert!(!gateway.contains("k").unwrap());

        gateway.save("k", b"v1").unwrap();
        gateway.save("k", b"v2").unwrap();
        assert_eq!(gateway.load("k").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_failing_saves_leave_value() {
        let gateway = MemoryGateway::new();
        gateway.save("k", b"v1").unwrap();
        gateway.fail_saves(true);

        assert!(gateway.save("k", b"v2").is_err());
        assert_eq!(gateway.load("k").unwrap(), Some(b"v1".to_vec()));
    }
}
