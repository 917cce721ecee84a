use crate::bus::InternalBus;
use crate::core::{DataOrigin, ExpiringNamedGraph, Identifier};
use crate::error::Result;
use async_trait::async_trait;
use oxigraph::model::NamedNode;

/// Handle through which observers push out-of-band changes into the gateway.
///
/// Updates travel the same bus path as registrations, so expiry handling is identical
/// whichever way a graph arrives.
#[derive(Clone)]
pub struct CacheUpdater {
    bus: InternalBus,
}

impl CacheUpdater {
    pub(crate) fn new(bus: InternalBus) -> Self {
        Self { bus }
    }

    /// Replace the cached graph of a registered origin and reschedule its expiry. Fails
    /// with `NotFound` when the graph has no live route.
    pub async fn update_cache(&self, graph: ExpiringNamedGraph) -> Result<()> {
        self.bus.update_cache(graph).await
    }

    /// Deregister the origin publishing `graph_name`, e.g. after it vanished.
    pub async fn invalidate(&self, graph_name: &NamedNode) -> Result<()> {
        self.bus.unregister_data_origin(graph_name.clone()).await
    }
}

/// Watches data origins of one backend for changes made outside the gateway.
///
/// [`observe`](DataOriginObserver::observe) is spawned on the management runtime once per
/// successful registration of an observable origin. It may run until the origin vanishes;
/// the task is aborted when the origin is unregistered, replaced or expires.
#[async_trait]
pub trait DataOriginObserver<I: Identifier>: Send + Sync {
    async fn observe(&self, origin: DataOrigin<I>, updater: CacheUpdater) -> Result<()>;
}
