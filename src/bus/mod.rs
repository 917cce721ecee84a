//! Internal asynchronous bus
//!
//! Registration, replacement, cache updates and webservice (un)registration are sent as
//! typed messages to a single worker task on the management runtime. The worker applies
//! them one at a time to the dispatcher, the mappers and the cache, so every write to a
//! route or a cached graph is serialized. SPARQL queries are handed to the blocking pool
//! so they never hold back writes. Each request carries a oneshot reply that is completed
//! exactly once.

mod worker;

use crate::cache::{QueryResult, SemanticCache};
use crate::core::{ExpiringNamedGraph, ProxyUri};
use crate::error::{GatewayError, Result};
use crate::http::{HttpRequestDispatcher, SemanticWebservice, Webservice};
use oxigraph::model::NamedNode;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

pub(crate) type Reply<T> = oneshot::Sender<Result<T>>;

/// Change to a mapper's route table that the bus applies, and reverts if a later step of
/// the same message fails. `commit` runs once the dispatcher and the cache agree.
pub(crate) trait RouteUpdate: Send {
    fn apply(&mut self) -> Result<()>;

    fn commit(&mut self) {}

    fn revert(&mut self);
}

pub(crate) enum BusMessage {
    RegisterDataOrigin {
        graph: ExpiringNamedGraph,
        route: Box<dyn RouteUpdate>,
        webservice: Arc<dyn SemanticWebservice>,
        reply: Reply<()>,
    },
    ReplaceDataOrigin {
        old_graph_name: NamedNode,
        graph: ExpiringNamedGraph,
        route: Box<dyn RouteUpdate>,
        webservice: Arc<dyn SemanticWebservice>,
        reply: Reply<()>,
    },
    UnregisterDataOrigin {
        graph_name: NamedNode,
        reply: Reply<()>,
    },
    UpdateCache {
        graph: ExpiringNamedGraph,
        reply: Reply<()>,
    },
    RegisterWebservice {
        proxy_uri: ProxyUri,
        webservice: Webservice,
        reply: Reply<()>,
    },
    UnregisterWebservice {
        proxy_uri: ProxyUri,
        reply: Reply<()>,
    },
    SparqlQuery {
        query: String,
        reply: Reply<QueryResult>,
    },
}

/// Sending side of the bus. Cheap to clone.
#[derive(Clone)]
pub(crate) struct InternalBus {
    sender: mpsc::UnboundedSender<BusMessage>,
}

impl InternalBus {
    /// Start the bus worker on `management`, owning the write side of `dispatcher` and
    /// `cache`.
    pub fn start(
        management: &Handle,
        dispatcher: Arc<HttpRequestDispatcher>,
        cache: Arc<SemanticCache>,
        expirations: mpsc::UnboundedReceiver<crate::cache::semantic_cache::ExpiredGraph>,
    ) -> Self {
        let (sender, messages) = mpsc::unbounded_channel();
        let worker = worker::BusWorker::new(dispatcher, cache);
        management.spawn(worker.run(messages, expirations));
        Self { sender }
    }

    async fn request<T>(&self, message: impl FnOnce(Reply<T>) -> BusMessage) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.sender.send(message(reply)).map_err(|_| GatewayError::BusClosed)?;
        response.await.map_err(|_| GatewayError::BusClosed)?
    }

    pub async fn register_data_origin(
        &self,
        graph: ExpiringNamedGraph,
        route: Box<dyn RouteUpdate>,
        webservice: Arc<dyn SemanticWebservice>,
    ) -> Result<()> {
        self.request(|reply| BusMessage::RegisterDataOrigin { graph, route, webservice, reply })
            .await
    }

    pub async fn replace_data_origin(
        &self,
        old_graph_name: NamedNode,
        graph: ExpiringNamedGraph,
        route: Box<dyn RouteUpdate>,
        webservice: Arc<dyn SemanticWebservice>,
    ) -> Result<()> {
        self.request(|reply| BusMessage::ReplaceDataOrigin {
            old_graph_name,
            graph,
            route,
            webservice,
            reply,
        })
        .await
    }

    pub async fn unregister_data_origin(&self, graph_name: NamedNode) -> Result<()> {
        self.request(|reply| BusMessage::UnregisterDataOrigin { graph_name, reply }).await
    }

    pub async fn update_cache(&self, graph: ExpiringNamedGraph) -> Result<()> {
        self.request(|reply| BusMessage::UpdateCache { graph, reply }).await
    }

    pub async fn register_webservice(
        &self,
        proxy_uri: ProxyUri,
        webservice: Webservice,
    ) -> Result<()> {
        self.request(|reply| BusMessage::RegisterWebservice { proxy_uri, webservice, reply })
            .await
    }

    pub async fn unregister_webservice(&self, proxy_uri: ProxyUri) -> Result<()> {
        self.request(|reply| BusMessage::UnregisterWebservice { proxy_uri, reply }).await
    }

    pub async fn sparql_query(&self, query: String) -> Result<QueryResult> {
        self.request(|reply| BusMessage::SparqlQuery { query, reply }).await
    }
}
