//! Filesystem persistence gateway.
//!
//! Stores each key as `<key>.json` under a base directory.
//!
//! # Security
//!
//! - **Path traversal**: keys are validated before being turned into file names
//! - **File size limits**: oversized files are refused on load
//!
//! Writes go to a sibling temp file that is renamed over the target, so a
//! crash mid-write leaves the previous value intact.

use crate::storage::traits::PersistenceGateway;
use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Maximum file size for stored values (8MB).
const MAX_FILE_SIZE: u64 = 8 * 1024 * 1024;

/// Gateway writing one JSON file per key.
#[derive(Debug, Clone)]
pub struct FilesystemGateway {
    base_path: PathBuf,
}

impl FilesystemGateway {
    /// Creates a gateway rooted at `base_path`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_create(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| Error::persistence("create_data_dir", e))?;
        Ok(Self { base_path })
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the file path for a key.
    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if !Self::is_safe_key(key) {
            return Err(Error::InvalidInput(format!(
                "storage key contains invalid characters: {key}"
            )));
        }
        Ok(self.base_path.join(format!("{key}.json")))
    }

    /// Checks if a key is safe to use as a file stem.
    fn is_safe_key(key: &str) -> bool {
        !key.is_empty()
            && key.len() <= 128
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl PersistenceGateway for FilesystemGateway {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let metadata = fs::metadata(&path).map_err(|e| Error::persistence("read_metadata", e))?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(Error::persistence(
                "load",
                format!(
                    "{} exceeds maximum size of {MAX_FILE_SIZE} bytes",
                    path.display()
                ),
            ));
        }

        fs::read(&path)
            .map(Some)
            .map_err(|e| Error::persistence("read_file", e))
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.key_path(key)?;
        let tmp_path = self.base_path.join(format!(".{key}.json.tmp"));

        let mut file =
            fs::File::create(&tmp_path).map_err(|e| Error::persistence("create_temp_file", e))?;
        file.write_all(value)
            .and_then(|()| file.sync_all())
            .map_err(|e| Error::persistence("write_temp_file", e))?;
        drop(file);

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            Error::persistence("rename_temp_file", e)
        })
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let gateway = FilesystemGateway::with_create(dir.path()).unwrap();

        assert!(gateway.load("quotes").unwrap().is_none());
        gateway.save("quotes", b"[]").unwrap();
        assert_eq!(gateway.load("quotes").unwrap(), Some(b"[]".to_vec()));
        assert!(dir.path().join("quotes.json").exists());
        assert!(!dir.path().join(".quotes.json.tmp").exists());
    }

    #[test]
    fn test_with_create_makes_nested_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let gateway = FilesystemGateway::with_create(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(gateway.base_path(), nested);
    }

    #[test]
    fn test_path_traversal_protection() {
        let dir = TempDir::new().unwrap();
        let gateway = FilesystemGateway::with_create(dir.path()).unwrap();

        assert!(gateway.key_path("../../etc/passwd").is_err());
        assert!(gateway.key_path("dir/file").is_err());
        assert!(gateway.key_path("dir\\file").is_err());
        assert!(gateway.save("../escape", b"x").is_err());
    }

    #[test]
    fn test_safe_key_validation() {
        assert!(FilesystemGateway::is_safe_key("quotes"));
        assert!(FilesystemGateway::is_safe_key("lastSelectedCategory"));
        assert!(FilesystemGateway::is_safe_key("key_with-dash"));

        assert!(!FilesystemGateway::is_safe_key(""));
        assert!(!FilesystemGateway::is_safe_key("file.json"));
        assert!(!FilesystemGateway::is_safe_key("with space"));
    }
}
