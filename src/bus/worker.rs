use crate::bus::{BusMessage, RouteUpdate};
use crate::cache::semantic_cache::ExpiredGraph;
use crate::cache::SemanticCache;
use crate::core::{ExpiringNamedGraph, ProxyUri};
use crate::error::{GatewayError, Result};
use crate::http::{HttpRequestDispatcher, SemanticWebservice, Webservice};
use oxigraph::model::NamedNode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub(super) struct BusWorker {
    dispatcher: Arc<HttpRequestDispatcher>,
    cache: Arc<SemanticCache>,
}

impl BusWorker {
    pub fn new(dispatcher: Arc<HttpRequestDispatcher>, cache: Arc<SemanticCache>) -> Self {
        Self { dispatcher, cache }
    }

    pub async fn run(
        self,
        mut messages: mpsc::UnboundedReceiver<BusMessage>,
        mut expirations: mpsc::UnboundedReceiver<ExpiredGraph>,
    ) {
        debug!("internal bus started");
        loop {
            tokio::select! {
                message = messages.recv() => match message {
                    Some(message) => self.handle(message),
                    None => break,
                },
                Some(expired) = expirations.recv() => self.expire(expired),
            }
        }
        debug!("internal bus stopped");
    }

    fn handle(&self, message: BusMessage) {
        match message {
            BusMessage::RegisterDataOrigin { graph, route, webservice, reply } => {
                let _ = reply.send(self.register(graph, route, webservice));
            }
            BusMessage::ReplaceDataOrigin { old_graph_name, graph, route, webservice, reply } => {
                let _ = reply.send(self.replace(&old_graph_name, graph, route, webservice));
            }
            BusMessage::UnregisterDataOrigin { graph_name, reply } => {
                let result = match self.deregister(&graph_name) {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(GatewayError::NotFound(graph_name.to_string())),
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            BusMessage::UpdateCache { graph, reply } => {
                let _ = reply.send(self.update_cache(graph));
            }
            BusMessage::RegisterWebservice { proxy_uri, webservice, reply } => {
                let _ = reply.send(self.dispatcher.insert(proxy_uri, webservice));
            }
            BusMessage::UnregisterWebservice { proxy_uri, reply } => {
                let result = match self.dispatcher.remove(&proxy_uri) {
                    Some(_) => Ok(()),
                    None => Err(GatewayError::NotFound(proxy_uri.to_string())),
                };
                let _ = reply.send(result);
            }
            BusMessage::SparqlQuery { query, reply } => {
                // Evaluation may take long; writes queued behind it must not wait.
                let cache = self.cache.clone();
                tokio::task::spawn_blocking(move || {
                    let _ = reply.send(cache.process_sparql_query(&query));
                });
            }
        }
    }

    /// Route first, then cache: a request never finds cached content without a route.
    fn register(
        &self,
        graph: ExpiringNamedGraph,
        mut route: Box<dyn RouteUpdate>,
        webservice: Arc<dyn SemanticWebservice>,
    ) -> Result<()> {
        let proxy_uri = ProxyUri::for_graph(&graph.graph_name);
        if self.dispatcher.contains(&proxy_uri) {
            return Err(GatewayError::AlreadyRegistered(proxy_uri.to_string()));
        }

        route.apply()?;
        if let Err(e) = self.dispatcher.insert(proxy_uri.clone(), Webservice::Semantic(webservice))
        {
            route.revert();
            return Err(e);
        }
        if let Err(e) = self.cache.put_named_graph_to_cache(graph) {
            warn!(%proxy_uri, error = %e, "rolling back registration");
            self.dispatcher.remove(&proxy_uri);
            route.revert();
            return Err(e);
        }
        route.commit();

        info!(%proxy_uri, "registered data origin");
        Ok(())
    }

    fn replace(
        &self,
        old_graph_name: &NamedNode,
        graph: ExpiringNamedGraph,
        mut route: Box<dyn RouteUpdate>,
        webservice: Arc<dyn SemanticWebservice>,
    ) -> Result<()> {
        let old_uri = ProxyUri::for_graph(old_graph_name);
        let new_uri = ProxyUri::for_graph(&graph.graph_name);
        let new_graph_name = graph.graph_name.clone();

        route.apply()?;
        let previous = match self.dispatcher.swap(
            &old_uri,
            new_uri.clone(),
            Webservice::Semantic(webservice),
        ) {
            Ok(previous) => previous,
            Err(e) => {
                route.revert();
                return Err(e);
            }
        };

        if let Err(e) = self.cache.put_named_graph_to_cache(graph) {
            warn!(old = %old_uri, new = %new_uri, error = %e, "rolling back replacement");
            if let Err(e) = self.dispatcher.swap(&new_uri, old_uri.clone(), previous) {
                error!(old = %old_uri, error = %e, "could not restore replaced route");
            }
            route.revert();
            return Err(e);
        }
        route.commit();
        if old_graph_name != &new_graph_name {
            if let Err(e) = self.cache.delete_named_graph(old_graph_name.as_ref()) {
                warn!(graph = %old_graph_name, error = %e, "replaced graph left in cache");
            }
        }

        info!(old = %old_uri, new = %new_uri, "replaced data origin");
        Ok(())
    }

    /// Remove the route, the mapper entry (stopping its observer) and the cached graph.
    /// Returns whether a route existed.
    fn deregister(&self, graph_name: &NamedNode) -> Result<bool> {
        let proxy_uri = ProxyUri::for_graph(graph_name);
        let removed = self.dispatcher.remove(&proxy_uri);
        if let Some(Webservice::Semantic(webservice)) = &removed {
            if !webservice.release_route(&proxy_uri) {
                warn!(%proxy_uri, "route had no mapper entry");
            }
        }
        self.cache.delete_named_graph(graph_name.as_ref())?;

        if removed.is_some() {
            info!(%proxy_uri, "unregistered data origin");
        }
        Ok(removed.is_some())
    }

    fn update_cache(&self, graph: ExpiringNamedGraph) -> Result<()> {
        let proxy_uri = ProxyUri::for_graph(&graph.graph_name);
        if !self.dispatcher.contains(&proxy_uri) {
            return Err(GatewayError::NotFound(proxy_uri.to_string()));
        }
        debug!(%proxy_uri, "cache update");
        self.cache.put_named_graph_to_cache(graph)
    }

    fn expire(&self, expired: ExpiredGraph) {
        if !self.cache.take_expired(&expired) {
            debug!(graph = %expired.graph_name, "ignoring superseded expiry");
            return;
        }
        info!(graph = %expired.graph_name, "graph expired");
        if let Err(e) = self.deregister(&expired.graph_name) {
            error!(graph = %expired.graph_name, error = %e, "failed to evict expired graph");
        }
    }
}
