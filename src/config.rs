//! Gateway configuration
//!
//! Loaded once at start from an optional JSON file; every field has a default, so an
//! empty object is a valid configuration.

use crate::cache::{DummyStore, GraphStore, OxigraphStore};
use crate::error::{GatewayError, Result};
use crate::rdf::RdfSerialization;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for configured lifetimes and delays, so that instants derived from them
/// stay representable.
pub const MAX_DURATION_SECS: u64 = 100 * 365 * 24 * 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Serialization used when content negotiation finds no supported type
    pub default_serialization: RdfSerialization,
    /// Delay between a graph's expiry and its eviction
    pub grace_period_secs: u64,
    pub management_threads: usize,
    pub io_threads: usize,
    pub max_body_bytes: usize,
    pub cache: CacheBackend,
    pub files: Option<FileBackendConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            default_serialization: RdfSerialization::Turtle,
            grace_period_secs: 10,
            management_threads: 2,
            io_threads: 4,
            max_body_bytes: 4 * 1024 * 1024,
            cache: CacheBackend::Memory,
            files: None,
        }
    }
}

impl GatewayConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: GatewayConfig = serde_json::from_str(&content).map_err(|e| {
            GatewayError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.management_threads == 0 || self.io_threads == 0 {
            return Err(GatewayError::Config("thread counts must be at least 1".to_string()));
        }
        if self.grace_period_secs > MAX_DURATION_SECS {
            return Err(GatewayError::Config(format!(
                "grace_period_secs must not exceed {}",
                MAX_DURATION_SECS
            )));
        }
        if let Some(files) = &self.files {
            files.validate()?;
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

/// Storage behind the semantic cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CacheBackend {
    /// Keeps nothing; every read reaches the data origin
    Dummy,
    Memory,
    Persistent { path: PathBuf },
}

impl CacheBackend {
    pub fn open_store(&self) -> Result<Box<dyn GraphStore>> {
        Ok(match self {
            CacheBackend::Dummy => Box::new(DummyStore),
            CacheBackend::Memory => Box::new(OxigraphStore::in_memory()?),
            CacheBackend::Persistent { path } => Box::new(OxigraphStore::open(path)?),
        })
    }
}

/// Reference backend serving the RDF files of a directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    pub directory: PathBuf,
    /// Graph names are `<base_uri>/<path relative to directory>`
    pub base_uri: String,
    /// Poll files for changes and push them into the cache
    pub observe: bool,
    pub poll_interval_ms: u64,
    /// Lifetime of a file's cached graph; `None` caches until the file changes
    pub ttl_secs: Option<u64>,
    /// Scan the directory again for new files
    pub rescan_interval_secs: Option<u64>,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
            base_uri: "http://localhost:8080/files".to_string(),
            observe: true,
            poll_interval_ms: 1000,
            ttl_secs: None,
            rescan_interval_secs: None,
        }
    }
}

impl FileBackendConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(GatewayError::Config("poll_interval_ms must be positive".to_string()));
        }
        oxigraph::model::NamedNode::new(format!("{}/x", self.base_uri.trim_end_matches('/')))
            .map_err(|e| GatewayError::Config(format!("invalid base_uri {}: {}", self.base_uri, e)))?;
        if let Some(ttl) = self.ttl_secs {
            if ttl == 0 || ttl > MAX_DURATION_SECS {
                return Err(GatewayError::Config(format!(
                    "ttl_secs must be between 1 and {}",
                    MAX_DURATION_SECS
                )));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ttl(&self) -> Option<chrono::Duration> {
        self.ttl_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
    }

    pub fn rescan_interval(&self) -> Option<Duration> {
        self.rescan_interval_secs.filter(|secs| *secs > 0).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_is_default() {
        let config: GatewayConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.grace_period(), Duration::from_secs(10));
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "port": 9090,
                "default_serialization": "n3",
                "cache": {{ "type": "persistent", "path": "/var/lib/ssp" }},
                "files": {{ "directory": "/srv/rdf", "base_uri": "http://ex/files", "ttl_secs": 60 }}
            }}"#
        )
        .unwrap();

        let config = GatewayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.default_serialization, RdfSerialization::N3);
        assert_eq!(config.cache, CacheBackend::Persistent { path: PathBuf::from("/var/lib/ssp") });
        let files = config.files.unwrap();
        assert_eq!(files.ttl(), Some(chrono::Duration::seconds(60)));
        assert!(files.observe);
        assert_eq!(files.rescan_interval(), None);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "io_threads": 0 }}"#).unwrap();
        assert!(matches!(GatewayConfig::from_file(file.path()), Err(GatewayError::Config(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(GatewayConfig::from_file(file.path()), Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_out_of_range_durations_are_rejected() {
        let files = |ttl_secs| FileBackendConfig { ttl_secs, ..FileBackendConfig::default() };
        for ttl in [0, MAX_DURATION_SECS + 1, 10_000_000_000_000_000, u64::MAX] {
            assert!(matches!(files(Some(ttl)).validate(), Err(GatewayError::Config(_))));
        }
        assert!(files(Some(MAX_DURATION_SECS)).validate().is_ok());
        assert_eq!(files(Some(u64::MAX)).ttl(), None);

        let config = GatewayConfig { grace_period_secs: u64::MAX, ..GatewayConfig::default() };
        assert!(matches!(config.validate(), Err(GatewayError::Config(_))));
        let config = GatewayConfig {
            files: Some(files(Some(u64::MAX))),
            ..GatewayConfig::default()
        };
        assert!(matches!(config.validate(), Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_dummy_store_opens() {
        let store = CacheBackend::Dummy.open_store().unwrap();
        assert!(store.query("ASK {}").is_err());
    }
}
