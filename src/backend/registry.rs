//! Registration of data origins.
//!
//! A [`Registry`] drives the lifecycle of the origins of one backend:
//!
//! ```text
//! UNREGISTERED -> REGISTERING -> REGISTERED -> (REPLACING | UNREGISTERING) -> UNREGISTERED
//! ```
//!
//! Registration fetches the initial status through the [`Accessor`], sends one bus message
//! that installs the mapper route, the dispatcher route and the cached graph together, and
//! finally starts observation for observable origins.

use crate::backend::accessor::Accessor;
use crate::backend::mapper::{DataOriginMapper, InsertRoute, SwapRoute};
use crate::backend::observer::{CacheUpdater, DataOriginObserver};
use crate::bus::InternalBus;
use crate::context::GatewayContext;
use crate::core::{DataOrigin, ExpiringNamedGraph, Identifier};
use crate::error::{GatewayError, Result};
use crate::http::SemanticWebservice;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Registration state of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginState {
    Unregistered,
    Registering,
    Registered,
    Replacing,
    Unregistering,
}

pub struct Registry<I: Identifier> {
    backend: String,
    accessor: Arc<dyn Accessor<I>>,
    mapper: Arc<DataOriginMapper<I>>,
    observer: Option<Arc<dyn DataOriginObserver<I>>>,
    bus: InternalBus,
    management: Handle,
    transitions: Mutex<HashMap<I, OriginState>>,
}

/// Marks identifiers as in transition until dropped.
struct Transition<'a, I: Identifier> {
    transitions: &'a Mutex<HashMap<I, OriginState>>,
    identifier: I,
}

impl<I: Identifier> Drop for Transition<'_, I> {
    fn drop(&mut self) {
        self.transitions.lock().remove(&self.identifier);
    }
}

impl<I: Identifier> Registry<I> {
    pub fn new(
        backend: impl Into<String>,
        accessor: Arc<dyn Accessor<I>>,
        context: &GatewayContext,
    ) -> Self {
        let backend = backend.into();
        let mapper = Arc::new(DataOriginMapper::new(
            backend.clone(),
            accessor.clone(),
            context.cache().clone(),
            context.bus().clone(),
        ));
        Self {
            backend,
            accessor,
            mapper,
            observer: None,
            bus: context.bus().clone(),
            management: context.management().clone(),
            transitions: Mutex::new(HashMap::new()),
        }
    }

    /// Observer started for every observable origin registered from now on.
    pub fn with_observer(mut self, observer: Arc<dyn DataOriginObserver<I>>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn mapper(&self) -> &Arc<DataOriginMapper<I>> {
        &self.mapper
    }

    /// Updater writing through this gateway's bus, for observers running outside the
    /// registry.
    pub fn cache_updater(&self) -> CacheUpdater {
        CacheUpdater::new(self.bus.clone())
    }

    pub fn data_origin(&self, identifier: &I) -> Option<DataOrigin<I>> {
        self.mapper.data_origin(identifier)
    }

    pub fn state(&self, identifier: &I) -> OriginState {
        if let Some(state) = self.transitions.lock().get(identifier) {
            return *state;
        }
        if self.mapper.contains(identifier) {
            OriginState::Registered
        } else {
            OriginState::Unregistered
        }
    }

    /// Register `origin`, fetching its initial status from the accessor.
    pub async fn register_data_origin(&self, origin: DataOrigin<I>) -> Result<()> {
        let _transition = self.begin(origin.identifier(), OriginState::Registering)?;
        self.ensure_unregistered(&origin)?;

        let graph = self.accessor.get_status(&origin).await?;
        self.complete_registration(origin, graph).await
    }

    /// Register `origin` with a status the caller already holds.
    pub async fn register_data_origin_with_status(
        &self,
        origin: DataOrigin<I>,
        graph: ExpiringNamedGraph,
    ) -> Result<()> {
        let _transition = self.begin(origin.identifier(), OriginState::Registering)?;
        self.ensure_unregistered(&origin)?;
        self.complete_registration(origin, graph).await
    }

    pub async fn unregister_data_origin(&self, identifier: &I) -> Result<()> {
        let _transition = self.begin(identifier, OriginState::Unregistering)?;
        let origin = self
            .mapper
            .data_origin(identifier)
            .ok_or_else(|| GatewayError::NotFound(format!("{:?}", identifier)))?;

        self.bus.unregister_data_origin(origin.graph_name().clone()).await?;
        info!(backend = %self.backend, identifier = ?identifier, "data origin unregistered");
        Ok(())
    }

    /// Swap the origin registered as `old` for `new` in one step. The new status is
    /// fetched first; until the swap, requests keep reaching the old origin.
    pub async fn replace_data_origin(&self, old: &I, new: DataOrigin<I>) -> Result<()> {
        let _old = self.begin(old, OriginState::Replacing)?;
        let _new = if new.identifier() != old {
            Some(self.begin(new.identifier(), OriginState::Registering)?)
        } else {
            None
        };
        let current = self
            .mapper
            .data_origin(old)
            .ok_or_else(|| GatewayError::NotFound(format!("{:?}", old)))?;

        let graph = self.accessor.get_status(&new).await?;
        check_graph_name(&new, &graph)?;

        let route = SwapRoute::new(self.mapper.clone(), old.clone(), new.clone());
        self.bus
            .replace_data_origin(
                current.graph_name().clone(),
                graph,
                Box::new(route),
                self.webservice(),
            )
            .await?;

        info!(backend = %self.backend, old = ?old, new = ?new.identifier(), "data origin replaced");
        self.start_observation(new);
        Ok(())
    }

    fn begin(&self, identifier: &I, state: OriginState) -> Result<Transition<'_, I>> {
        let mut transitions = self.transitions.lock();
        if let Some(current) = transitions.get(identifier) {
            return Err(match state {
                OriginState::Registering => {
                    GatewayError::AlreadyRegistered(format!("{:?}", identifier))
                }
                _ => GatewayError::InvalidState(format!("{:?} is {:?}", identifier, current)),
            });
        }
        transitions.insert(identifier.clone(), state);
        Ok(Transition { transitions: &self.transitions, identifier: identifier.clone() })
    }

    fn ensure_unregistered(&self, origin: &DataOrigin<I>) -> Result<()> {
        if self.mapper.contains(origin.identifier()) {
            return Err(GatewayError::AlreadyRegistered(format!("{:?}", origin.identifier())));
        }
        Ok(())
    }

    async fn complete_registration(
        &self,
        origin: DataOrigin<I>,
        graph: ExpiringNamedGraph,
    ) -> Result<()> {
        check_graph_name(&origin, &graph)?;

        let route = InsertRoute::new(self.mapper.clone(), origin.clone());
        self.bus.register_data_origin(graph, Box::new(route), self.webservice()).await?;

        info!(backend = %self.backend, identifier = ?origin.identifier(), graph = %origin.graph_name(), "data origin registered");
        self.start_observation(origin);
        Ok(())
    }

    fn start_observation(&self, origin: DataOrigin<I>) {
        if !origin.is_observable() {
            return;
        }
        let Some(observer) = self.observer.clone() else {
            warn!(backend = %self.backend, graph = %origin.graph_name(), "observable origin but no observer configured");
            return;
        };

        let identifier = origin.identifier().clone();
        let updater = self.cache_updater();
        let backend = self.backend.clone();
        let task = self.management.spawn(async move {
            let graph_name = origin.graph_name().clone();
            if let Err(e) = observer.observe(origin, updater).await {
                warn!(backend = %backend, graph = %graph_name, error = %e, "observation ended with error");
            }
        });

        if !self.mapper.attach_observation(&identifier, task.abort_handle()) {
            debug!(backend = %self.backend, identifier = ?identifier, "origin gone before observation started");
        }
    }

    fn webservice(&self) -> Arc<dyn SemanticWebservice> {
        self.mapper.clone()
    }
}

fn check_graph_name<I: Identifier>(origin: &DataOrigin<I>, graph: &ExpiringNamedGraph) -> Result<()> {
    if &graph.graph_name != origin.graph_name() {
        return Err(GatewayError::Inconsistent(format!(
            "status of {} is named {}",
            origin.graph_name(),
            graph.graph_name
        )));
    }
    Ok(())
}
