//! Gateway context, constructed once at start and handed to every registry.

use crate::bus::InternalBus;
use crate::cache::{QueryResult, SemanticCache};
use crate::config::GatewayConfig;
use crate::core::ProxyUri;
use crate::error::Result;
use crate::http::{create_server, HttpRequestDispatcher, ResourceListing, Webservice};
use axum::Router;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

pub struct GatewayContext {
    config: GatewayConfig,
    cache: Arc<SemanticCache>,
    dispatcher: Arc<HttpRequestDispatcher>,
    bus: InternalBus,
    management: Handle,
}

impl GatewayContext {
    /// Open the cache store, start the bus worker on `management` and register the
    /// resource listing at `/`.
    pub async fn start(config: GatewayConfig, management: Handle) -> Result<Self> {
        config.validate()?;
        let store = config.cache.open_store()?;
        // Graphs of a previous run have neither a route nor an expiry task.
        store.clear()?;
        let (cache, expirations) =
            SemanticCache::new(store, config.grace_period(), management.clone());
        let dispatcher = Arc::new(HttpRequestDispatcher::new(config.default_serialization));
        let bus = InternalBus::start(&management, dispatcher.clone(), cache.clone(), expirations);

        let context = Self { config, cache, dispatcher, bus, management };
        let listing = ResourceListing::new(Arc::downgrade(&context.dispatcher));
        context.register_webservice(ProxyUri::plain("/"), Webservice::Plain(Arc::new(listing))).await?;

        info!(
            cache = ?context.config.cache,
            grace_period_secs = context.config.grace_period_secs,
            "gateway context started"
        );
        Ok(context)
    }

    /// HTTP router serving every registered webservice.
    pub fn router(&self) -> Router {
        create_server(self.dispatcher.clone(), self.config.max_body_bytes)
    }

    /// Expose a webservice. Fails with `AlreadyRegistered` if the proxy URI is taken.
    pub async fn register_webservice(
        &self,
        proxy_uri: ProxyUri,
        webservice: Webservice,
    ) -> Result<()> {
        self.bus.register_webservice(proxy_uri, webservice).await
    }

    pub async fn unregister_webservice(&self, proxy_uri: &ProxyUri) -> Result<()> {
        self.bus.unregister_webservice(proxy_uri.clone()).await
    }

    /// Evaluate SPARQL against the cache. The query sees every cache write completed
    /// before the call, and runs off the bus worker.
    pub async fn process_sparql_query(&self, query: &str) -> Result<QueryResult> {
        self.bus.sparql_query(query.to_string()).await
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<SemanticCache> {
        &self.cache
    }

    pub fn dispatcher(&self) -> &Arc<HttpRequestDispatcher> {
        &self.dispatcher
    }

    pub fn management(&self) -> &Handle {
        &self.management
    }

    pub(crate) fn bus(&self) -> &InternalBus {
        &self.bus
    }
}
