//! Per-backend HTTP endpoint.
//!
//! The mapper owns the proxy URI and identifier tables of one backend and turns HTTP verbs
//! into [`Accessor`] calls. Its tables are changed only by the bus worker through
//! [`RouteUpdate`]s, which keeps them in step with the dispatcher's table.

use crate::backend::accessor::Accessor;
use crate::bus::{InternalBus, RouteUpdate};
use crate::cache::SemanticCache;
use crate::core::{DataOrigin, ExpiringNamedGraph, Identifier, ModificationResult, ProxyUri};
use crate::error::{GatewayError, Result};
use crate::http::{ProxyRequest, SemanticResponse, SemanticWebservice};
use crate::rdf::{parse_graph, request_serialization, RdfSerialization};
use async_trait::async_trait;
use axum::http::{header, Method};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

/// A routed origin and the observation task started for it, if any.
pub(crate) struct MappedOrigin<I> {
    origin: DataOrigin<I>,
    observation: Option<AbortHandle>,
}

impl<I> Drop for MappedOrigin<I> {
    fn drop(&mut self) {
        if let Some(observation) = self.observation.take() {
            observation.abort();
        }
    }
}

struct RouteTable<I> {
    by_proxy: HashMap<ProxyUri, DataOrigin<I>>,
    by_identifier: HashMap<I, MappedOrigin<I>>,
}

pub struct DataOriginMapper<I: Identifier> {
    backend: String,
    accessor: Arc<dyn Accessor<I>>,
    cache: Arc<SemanticCache>,
    bus: InternalBus,
    routes: RwLock<RouteTable<I>>,
}

impl<I: Identifier> DataOriginMapper<I> {
    pub(crate) fn new(
        backend: String,
        accessor: Arc<dyn Accessor<I>>,
        cache: Arc<SemanticCache>,
        bus: InternalBus,
    ) -> Self {
        Self {
            backend,
            accessor,
            cache,
            bus,
            routes: RwLock::new(RouteTable {
                by_proxy: HashMap::new(),
                by_identifier: HashMap::new(),
            }),
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Origin routed under `proxy_uri`.
    pub fn lookup(&self, proxy_uri: &ProxyUri) -> Option<DataOrigin<I>> {
        self.routes.read().by_proxy.get(proxy_uri).cloned()
    }

    pub fn data_origin(&self, identifier: &I) -> Option<DataOrigin<I>> {
        self.routes.read().by_identifier.get(identifier).map(|mapped| mapped.origin.clone())
    }

    pub fn contains(&self, identifier: &I) -> bool {
        self.routes.read().by_identifier.contains_key(identifier)
    }

    pub fn data_origins(&self) -> Vec<DataOrigin<I>> {
        self.routes.read().by_identifier.values().map(|mapped| mapped.origin.clone()).collect()
    }

    pub fn proxy_uris(&self) -> Vec<ProxyUri> {
        let mut uris: Vec<ProxyUri> = self.routes.read().by_proxy.keys().cloned().collect();
        uris.sort();
        uris
    }

    pub fn len(&self) -> usize {
        self.routes.read().by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an observation task is attached to the origin.
    pub fn is_observed(&self, identifier: &I) -> bool {
        self.routes
            .read()
            .by_identifier
            .get(identifier)
            .is_some_and(|mapped| mapped.observation.is_some())
    }

    fn insert(&self, origin: DataOrigin<I>) -> Result<()> {
        let mut routes = self.routes.write();
        let proxy_uri = origin.proxy_uri();
        if routes.by_identifier.contains_key(origin.identifier()) {
            return Err(GatewayError::AlreadyRegistered(format!("{:?}", origin.identifier())));
        }
        if routes.by_proxy.contains_key(&proxy_uri) {
            return Err(GatewayError::AlreadyRegistered(proxy_uri.to_string()));
        }
        routes.by_proxy.insert(proxy_uri, origin.clone());
        routes
            .by_identifier
            .insert(origin.identifier().clone(), MappedOrigin { origin, observation: None });
        Ok(())
    }

    fn remove(&self, identifier: &I) -> Option<MappedOrigin<I>> {
        let mut routes = self.routes.write();
        let mapped = routes.by_identifier.remove(identifier)?;
        let proxy_uri = mapped.origin.proxy_uri();
        if routes.by_proxy.get(&proxy_uri).is_some_and(|origin| origin.identifier() == identifier) {
            routes.by_proxy.remove(&proxy_uri);
        }
        Some(mapped)
    }

    /// Replace the origin `old` by `new`, returning the displaced entry with its
    /// observation still running. The old proxy URI keeps resolving to the old origin
    /// until [`commit_swap`](Self::commit_swap), so requests the dispatcher still routes
    /// there are served.
    fn swap(&self, old: &I, new: DataOrigin<I>) -> Result<MappedOrigin<I>> {
        let mut routes = self.routes.write();
        let old_proxy = routes
            .by_identifier
            .get(old)
            .map(|mapped| mapped.origin.proxy_uri())
            .ok_or_else(|| GatewayError::NotFound(format!("{:?}", old)))?;
        let new_proxy = new.proxy_uri();

        if new.identifier() != old && routes.by_identifier.contains_key(new.identifier()) {
            return Err(GatewayError::AlreadyRegistered(format!("{:?}", new.identifier())));
        }
        if new_proxy != old_proxy && routes.by_proxy.contains_key(&new_proxy) {
            return Err(GatewayError::AlreadyRegistered(new_proxy.to_string()));
        }

        let displaced = routes
            .by_identifier
            .remove(old)
            .ok_or_else(|| GatewayError::NotFound(format!("{:?}", old)))?;
        routes.by_proxy.insert(new_proxy, new.clone());
        routes
            .by_identifier
            .insert(new.identifier().clone(), MappedOrigin { origin: new, observation: None });
        Ok(displaced)
    }

    /// Stop resolving the proxy URI of a swapped-out origin.
    fn commit_swap(&self, displaced: &MappedOrigin<I>, new: &DataOrigin<I>) {
        let old_proxy = displaced.origin.proxy_uri();
        if old_proxy != new.proxy_uri() {
            self.routes.write().by_proxy.remove(&old_proxy);
        }
    }

    /// Undo a [`swap`](Self::swap): drop `new` and put `displaced` back.
    fn restore(&self, new: &DataOrigin<I>, displaced: MappedOrigin<I>) {
        let mut routes = self.routes.write();
        routes.by_identifier.remove(new.identifier());
        routes.by_proxy.remove(&new.proxy_uri());
        routes.by_proxy.insert(displaced.origin.proxy_uri(), displaced.origin.clone());
        routes.by_identifier.insert(displaced.origin.identifier().clone(), displaced);
    }

    /// Attach a running observation to the origin. If the origin is already gone the task
    /// is aborted and `false` returned.
    pub(crate) fn attach_observation(&self, identifier: &I, observation: AbortHandle) -> bool {
        let mut routes = self.routes.write();
        match routes.by_identifier.get_mut(identifier) {
            Some(mapped) => {
                if let Some(previous) = mapped.observation.replace(observation) {
                    previous.abort();
                }
                true
            }
            None => {
                observation.abort();
                false
            }
        }
    }

    async fn get(&self, origin: &DataOrigin<I>) -> Result<ExpiringNamedGraph> {
        if let Some(cached) = self.cache.get_named_graph(origin.graph_name().as_ref())? {
            return Ok(cached);
        }
        debug!(backend = %self.backend, graph = %origin.graph_name(), "cache miss");
        self.accessor.get_status(origin).await
    }

    async fn put(&self, origin: &DataOrigin<I>, request: &ProxyRequest) -> Result<ModificationResult> {
        let serialization = request_serialization(
            request.header(header::CONTENT_TYPE.as_str()),
            RdfSerialization::Turtle,
        );
        let graph = parse_graph(&request.body, serialization, Some(origin.graph_name().as_str()))?;
        let result = self.accessor.set_status(origin, graph).await?;

        // Observed origins report the change themselves.
        if !origin.is_observable() {
            self.refresh(origin).await;
        }
        Ok(result)
    }

    async fn refresh(&self, origin: &DataOrigin<I>) {
        let refreshed = match self.accessor.get_status(origin).await {
            Ok(graph) => self.bus.update_cache(graph).await,
            Err(e) => Err(e),
        };
        if let Err(e) = refreshed {
            warn!(backend = %self.backend, graph = %origin.graph_name(), error = %e, "cache refresh failed");
        }
    }

    async fn delete(&self, origin: &DataOrigin<I>) -> Result<ModificationResult> {
        let result = self.accessor.delete_resource(origin).await?;
        if result == ModificationResult::Deleted {
            match self.bus.unregister_data_origin(origin.graph_name().clone()).await {
                Ok(()) | Err(GatewayError::NotFound(_)) => {}
                Err(e) => {
                    warn!(backend = %self.backend, graph = %origin.graph_name(), error = %e, "deleted origin still registered");
                }
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl<I: Identifier> SemanticWebservice for DataOriginMapper<I> {
    async fn process(&self, request: ProxyRequest) -> Result<SemanticResponse> {
        // A miss means the origin was removed after the dispatcher routed the request.
        let origin = self
            .lookup(&request.proxy_uri)
            .ok_or_else(|| GatewayError::NotFound(request.proxy_uri.to_string()))?;

        match request.method {
            Method::GET => self.get(&origin).await.map(SemanticResponse::Graph),
            Method::PUT => self.put(&origin, &request).await.map(SemanticResponse::Modified),
            Method::DELETE => self.delete(&origin).await.map(SemanticResponse::Modified),
            other => Err(GatewayError::MethodNotAllowed(other.to_string())),
        }
    }

    fn release_route(&self, proxy_uri: &ProxyUri) -> bool {
        let identifier =
            self.routes.read().by_proxy.get(proxy_uri).map(|origin| origin.identifier().clone());
        // Dropping the entry aborts its observation.
        identifier.and_then(|identifier| self.remove(&identifier)).is_some()
    }
}

/// Adds one origin to a mapper.
pub(crate) struct InsertRoute<I: Identifier> {
    mapper: Arc<DataOriginMapper<I>>,
    origin: DataOrigin<I>,
}

impl<I: Identifier> InsertRoute<I> {
    pub fn new(mapper: Arc<DataOriginMapper<I>>, origin: DataOrigin<I>) -> Self {
        Self { mapper, origin }
    }
}

impl<I: Identifier> RouteUpdate for InsertRoute<I> {
    fn apply(&mut self) -> Result<()> {
        self.mapper.insert(self.origin.clone())
    }

    fn revert(&mut self) {
        self.mapper.remove(self.origin.identifier());
    }
}

/// Replaces one origin of a mapper by another. The displaced entry is held until the
/// update is dropped, so a reverted swap keeps the old observation alive and a committed
/// one stops it.
pub(crate) struct SwapRoute<I: Identifier> {
    mapper: Arc<DataOriginMapper<I>>,
    old: I,
    new: DataOrigin<I>,
    displaced: Option<MappedOrigin<I>>,
}

impl<I: Identifier> SwapRoute<I> {
    pub fn new(mapper: Arc<DataOriginMapper<I>>, old: I, new: DataOrigin<I>) -> Self {
        Self { mapper, old, new, displaced: None }
    }
}

impl<I: Identifier> RouteUpdate for SwapRoute<I> {
    fn apply(&mut self) -> Result<()> {
        self.displaced = Some(self.mapper.swap(&self.old, self.new.clone())?);
        Ok(())
    }

    fn commit(&mut self) {
        if let Some(displaced) = &self.displaced {
            self.mapper.commit_swap(displaced, &self.new);
        }
    }

    fn revert(&mut self) {
        if let Some(displaced) = self.displaced.take() {
            self.mapper.restore(&self.new, displaced);
        }
    }
}
