//! Backend serving the RDF files of a local directory.
//!
//! Each file is one data origin identified by its path. The graph name is
//! `<base_uri>/<relative path>`, and the serialization follows the file extension.

use crate::backend::{Accessor, CacheUpdater, DataOriginObserver, Registry};
use crate::config::FileBackendConfig;
use crate::context::GatewayContext;
use crate::core::{DataOrigin, ExpiringNamedGraph, ModificationResult};
use crate::error::{GatewayError, Result};
use crate::rdf::{parse_graph, serialize_graph, RdfSerialization};
use async_trait::async_trait;
use axum::http::StatusCode;
use oxigraph::model::Graph;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

fn serialization_of(path: &Path) -> Result<RdfSerialization> {
    RdfSerialization::from_extension(path).ok_or_else(|| {
        GatewayError::OperationNotSupported(format!("no RDF serialization for {}", path.display()))
    })
}

fn io_error(path: &Path, err: std::io::Error) -> GatewayError {
    let message = format!("{}: {}", path.display(), err);
    match err.kind() {
        std::io::ErrorKind::NotFound => GatewayError::backend_with_status(message, StatusCode::NOT_FOUND),
        _ => GatewayError::backend(message),
    }
}

/// Reads, writes and deletes RDF files.
#[derive(Debug, Clone, Default)]
pub struct FileAccessor {
    ttl: Option<chrono::Duration>,
}

impl FileAccessor {
    /// Graphs read from files expire `ttl` after the read, or never.
    pub fn new(ttl: Option<chrono::Duration>) -> Self {
        Self { ttl }
    }
}

#[async_trait]
impl Accessor<PathBuf> for FileAccessor {
    async fn get_status(&self, origin: &DataOrigin<PathBuf>) -> Result<ExpiringNamedGraph> {
        let path = origin.identifier();
        let serialization = serialization_of(path)?;
        let data = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
        let graph = parse_graph(&data, serialization, Some(origin.graph_name().as_str()))
            .map_err(|e| GatewayError::backend(format!("{}: {}", path.display(), e)))?;

        let graph_name = origin.graph_name().clone();
        Ok(match self.ttl {
            Some(ttl) => ExpiringNamedGraph::expiring_in(graph_name, graph, ttl),
            None => ExpiringNamedGraph::indefinite(graph_name, graph),
        })
    }

    async fn set_status(
        &self,
        origin: &DataOrigin<PathBuf>,
        graph: Graph,
    ) -> Result<ModificationResult> {
        let path = origin.identifier();
        let serialization = serialization_of(path)?;
        let existed = tokio::fs::try_exists(path).await.map_err(|e| io_error(path, e))?;
        let data = serialize_graph(&graph, serialization)?;
        tokio::fs::write(path, data).await.map_err(|e| io_error(path, e))?;

        debug!(path = %path.display(), "file written");
        Ok(if existed { ModificationResult::Updated } else { ModificationResult::Created })
    }

    async fn delete_resource(&self, origin: &DataOrigin<PathBuf>) -> Result<ModificationResult> {
        let path = origin.identifier();
        tokio::fs::remove_file(path).await.map_err(|e| io_error(path, e))?;
        debug!(path = %path.display(), "file deleted");
        Ok(ModificationResult::Deleted)
    }
}

/// Polls the modification time of a file and pushes its new content on change.
pub struct FileObserver {
    accessor: Arc<FileAccessor>,
    poll_interval: Duration,
}

impl FileObserver {
    pub fn new(accessor: Arc<FileAccessor>, poll_interval: Duration) -> Self {
        Self { accessor, poll_interval }
    }
}

async fn modified(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.and_then(|metadata| metadata.modified()).ok()
}

#[async_trait]
impl DataOriginObserver<PathBuf> for FileObserver {
    async fn observe(&self, origin: DataOrigin<PathBuf>, updater: CacheUpdater) -> Result<()> {
        let path = origin.identifier().clone();
        let mut last_modified = modified(&path).await;
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;

        loop {
            interval.tick().await;
            match modified(&path).await {
                None => {
                    info!(path = %path.display(), "file removed");
                    return updater.invalidate(origin.graph_name()).await;
                }
                Some(current) if Some(current) != last_modified => {
                    last_modified = Some(current);
                    match self.accessor.get_status(&origin).await {
                        Ok(graph) => updater.update_cache(graph).await?,
                        Err(e) => warn!(path = %path.display(), error = %e, "unreadable file"),
                    }
                }
                Some(_) => {}
            }
        }
    }
}

/// Registers the RDF files of a directory with a [`Registry`].
pub struct FileBackend {
    config: FileBackendConfig,
    registry: Registry<PathBuf>,
}

impl FileBackend {
    pub fn new(config: FileBackendConfig, context: &GatewayContext) -> Self {
        let accessor = Arc::new(FileAccessor::new(config.ttl()));
        let mut registry = Registry::new("files", accessor.clone(), context);
        if config.observe {
            let observer = FileObserver::new(accessor, config.poll_interval());
            registry = registry.with_observer(Arc::new(observer));
        }
        Self { config, registry }
    }

    pub fn registry(&self) -> &Registry<PathBuf> {
        &self.registry
    }

    /// Data origin of a file below the configured directory.
    pub fn data_origin(&self, path: &Path) -> Result<DataOrigin<PathBuf>> {
        let relative = path.strip_prefix(&self.config.directory).map_err(|_| {
            GatewayError::Config(format!(
                "{} is not below {}",
                path.display(),
                self.config.directory.display()
            ))
        })?;
        let segments: Vec<String> = relative
            .components()
            .map(|component| urlencoding::encode(&component.as_os_str().to_string_lossy()).into_owned())
            .collect();
        let graph_name =
            format!("{}/{}", self.config.base_uri.trim_end_matches('/'), segments.join("/"));

        Ok(DataOrigin::with_graph_iri(path.to_path_buf(), &graph_name)?.observable(self.config.observe))
    }

    /// Register every RDF file of the directory that is not registered yet. Returns the
    /// number of new registrations; files that fail are logged and skipped.
    pub async fn register_directory(&self) -> Result<usize> {
        let mut registered = 0;
        for path in self.rdf_files().await? {
            if self.registry.data_origin(&path).is_some() {
                continue;
            }
            let origin = self.data_origin(&path)?;
            match self.registry.register_data_origin(origin).await {
                Ok(()) => registered += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "file not registered"),
            }
        }
        if registered > 0 {
            info!(directory = %self.config.directory.display(), registered, "registered files");
        }
        Ok(registered)
    }

    /// Rescan the directory periodically, if configured.
    pub fn spawn_rescan(self: &Arc<Self>, handle: &Handle) -> Option<JoinHandle<()>> {
        let period = self.config.rescan_interval()?;
        let backend = Arc::clone(self);
        Some(handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = backend.register_directory().await {
                    warn!(error = %e, "directory rescan failed");
                }
            }
        }))
    }

    async fn rdf_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![self.config.directory.clone()];
        while let Some(directory) = pending.pop() {
            let mut entries =
                tokio::fs::read_dir(&directory).await.map_err(|e| io_error(&directory, e))?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && RdfSerialization::from_extension(&path).is_some() {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::NamedNode;

    const TURTLE: &str = "<http://ex/s> <http://ex/p> \"21\" .\n";

    fn origin(path: PathBuf) -> DataOrigin<PathBuf> {
        DataOrigin::new(path, NamedNode::new("http://ex/files/a.ttl").unwrap())
    }

    #[tokio::test]
    async fn test_accessor_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ttl");
        let accessor = FileAccessor::new(Some(chrono::Duration::seconds(30)));
        let origin = origin(path.clone());

        let missing = accessor.get_status(&origin).await.unwrap_err();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let graph = parse_graph(TURTLE.as_bytes(), RdfSerialization::Turtle, None).unwrap();
        assert_eq!(
            accessor.set_status(&origin, graph.clone()).await.unwrap(),
            ModificationResult::Created
        );
        assert_eq!(
            accessor.set_status(&origin, graph.clone()).await.unwrap(),
            ModificationResult::Updated
        );

        let status = accessor.get_status(&origin).await.unwrap();
        assert_eq!(status.graph, graph);
        assert!(status.expiry.is_some());

        assert_eq!(accessor.delete_resource(&origin).await.unwrap(), ModificationResult::Deleted);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_malformed_file_is_a_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ttl");
        std::fs::write(&path, "this is not turtle").unwrap();

        let err = FileAccessor::default().get_status(&origin(path)).await.unwrap_err();
        assert!(matches!(err, GatewayError::Backend { .. }));
    }

    #[tokio::test]
    async fn test_unknown_extension_is_unsupported() {
        let err = FileAccessor::default()
            .get_status(&origin(PathBuf::from("/tmp/readme.md")))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::OperationNotSupported(_)));
    }
}
