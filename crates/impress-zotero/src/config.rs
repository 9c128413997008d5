//! Configuration for impress-zotero
//!
//! Connection details for the Zotero local API plus the knobs that shape
//! loading, indexing and update batching. Loaded from
//! `<config dir>/impress/zotero.toml`; a missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::LibraryId;
use crate::error::{MirrorError, Result};

/// Mirror configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Host the local API listens on
    pub host: String,
    /// Port the local API listens on
    pub port: u16,
    /// User segment of the API path; 0 is the local user
    pub user_id: u64,
    /// Optional `Zotero-API-Key` header value
    pub api_key: Option<String>,
    /// Library mirrored and indexed at startup
    pub library_id: LibraryId,
    /// Records per page request
    pub page_size: usize,
    /// Maximum page requests in flight at once
    pub max_concurrent_pages: usize,
    /// Quiet window before queued item updates are flushed
    pub debounce_ms: u64,
    /// Per-request deadline; none by default
    pub request_timeout_secs: Option<u64>,
    /// Memory budget for the search index writer
    pub index_heap_bytes: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 23119,
            user_id: 0,
            api_key: None,
            library_id: 1,
            page_size: 100,
            max_concurrent_pages: 5,
            debounce_ms: 500,
            request_timeout_secs: None,
            index_heap_bytes: 50_000_000,
        }
    }
}

impl MirrorConfig {
    /// Root of the user's API, e.g. `http://127.0.0.1:23119/api/users/0`
    pub fn base_url(&self) -> String {
        format!(
            "http://{}:{}/api/users/{}",
            self.host, self.port, self.user_id
        )
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(MirrorError::Config("page_size must be at least 1".into()));
        }
        if self.max_concurrent_pages == 0 {
            return Err(MirrorError::Config(
                "max_concurrent_pages must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// `<config dir>/impress/zotero.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("impress").join("zotero.toml"))
    }

    /// Read and validate a TOML config file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MirrorConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or the default location when `None`.
    ///
    /// A file that does not exist yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_toml_file(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = MirrorConfig::default();
        assert_eq!(config.base_url(), "http://127.0.0.1:23119/api/users/0");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_concurrent_pages, 5);
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert!(config.request_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let file = write_temp_toml(
            r#"
port = 24000
api_key = "secret"
request_timeout_secs = 30
"#,
        );
        let config = MirrorConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.port, 24000);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.library_id, 1);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let file = write_temp_toml("page_size = 0\n");
        let err = MirrorConfig::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, MirrorError::Config(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_temp_toml("port = \"not a number\"\n");
        assert!(matches!(
            MirrorConfig::from_toml_file(file.path()),
            Err(MirrorError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MirrorConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, MirrorConfig::default());
    }
}
