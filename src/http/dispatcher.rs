//! Top-level request routing.
//!
//! The dispatcher owns the only table of reachable proxy URIs. Requests are matched by
//! exact decoded proxy URI; semantic webservices get content negotiation and the cache
//! headers, plain ones write their own response.

use crate::core::{ModificationResult, ProxyUri};
use crate::error::{GatewayError, Result};
use crate::http::webservice::{ProxyRequest, SemanticResponse, Webservice};
use crate::rdf::{negotiate, serialize_graph, RdfSerialization};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

const CACHE_CONTROL_VALUE: &str = "no-cache, no-store, must-revalidate";

/// Lifetime advertised for graphs cached without expiry.
const FAR_FUTURE_DAYS: i64 = 365;

pub struct HttpRequestDispatcher {
    webservices: RwLock<HashMap<ProxyUri, Webservice>>,
    default_serialization: RdfSerialization,
}

impl HttpRequestDispatcher {
    pub fn new(default_serialization: RdfSerialization) -> Self {
        Self { webservices: RwLock::new(HashMap::new()), default_serialization }
    }

    pub fn default_serialization(&self) -> RdfSerialization {
        self.default_serialization
    }

    /// Add a route. An existing route is never overwritten.
    pub(crate) fn insert(&self, proxy_uri: ProxyUri, webservice: Webservice) -> Result<()> {
        let mut webservices = self.webservices.write();
        if webservices.contains_key(&proxy_uri) {
            return Err(GatewayError::AlreadyRegistered(proxy_uri.to_string()));
        }
        debug!(%proxy_uri, semantic = webservice.is_semantic(), "route added");
        webservices.insert(proxy_uri, webservice);
        Ok(())
    }

    /// Replace the route `old` by `new` in one step. Fails without changes if `old` is
    /// unknown or `new` is taken by another route.
    pub(crate) fn swap(
        &self,
        old: &ProxyUri,
        new: ProxyUri,
        webservice: Webservice,
    ) -> Result<Webservice> {
        let mut webservices = self.webservices.write();
        if !webservices.contains_key(old) {
            return Err(GatewayError::NotFound(old.to_string()));
        }
        if &new != old && webservices.contains_key(&new) {
            return Err(GatewayError::AlreadyRegistered(new.to_string()));
        }
        let previous = webservices.remove(old).ok_or_else(|| GatewayError::NotFound(old.to_string()))?;
        debug!(old = %old, new = %new, "route swapped");
        webservices.insert(new, webservice);
        Ok(previous)
    }

    pub(crate) fn remove(&self, proxy_uri: &ProxyUri) -> Option<Webservice> {
        let removed = self.webservices.write().remove(proxy_uri);
        if removed.is_some() {
            debug!(%proxy_uri, "route removed");
        }
        removed
    }

    pub fn lookup(&self, proxy_uri: &ProxyUri) -> Option<Webservice> {
        self.webservices.read().get(proxy_uri).cloned()
    }

    pub fn contains(&self, proxy_uri: &ProxyUri) -> bool {
        self.webservices.read().contains_key(proxy_uri)
    }

    /// Proxy URIs of all semantic routes, sorted.
    pub fn semantic_proxy_uris(&self) -> Vec<ProxyUri> {
        let mut uris: Vec<ProxyUri> = self
            .webservices
            .read()
            .iter()
            .filter(|(_, webservice)| webservice.is_semantic())
            .map(|(uri, _)| uri.clone())
            .collect();
        uris.sort();
        uris
    }

    pub fn len(&self) -> usize {
        self.webservices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Answer a request. Every outcome, failures included, becomes a response.
    pub async fn dispatch(&self, request: ProxyRequest) -> Response {
        let Some(webservice) = self.lookup(&request.proxy_uri) else {
            debug!(proxy_uri = %request.proxy_uri, "no route");
            return (
                StatusCode::NOT_FOUND,
                format!("Resource not found: {}", request.proxy_uri),
            )
                .into_response();
        };

        match webservice {
            Webservice::Semantic(webservice) => {
                let serialization =
                    negotiate(request.header(header::ACCEPT.as_str()), self.default_serialization);
                match webservice.process(request).await {
                    Ok(SemanticResponse::Graph(graph)) => {
                        graph_response(&graph.graph, graph.expiry, serialization)
                            .unwrap_or_else(IntoResponse::into_response)
                    }
                    Ok(SemanticResponse::Modified(result)) => modification_response(result),
                    Err(e) => e.into_response(),
                }
            }
            Webservice::Plain(webservice) => {
                webservice.process(request).await.unwrap_or_else(IntoResponse::into_response)
            }
        }
    }
}

fn graph_response(
    graph: &oxigraph::model::Graph,
    expiry: Option<DateTime<Utc>>,
    serialization: RdfSerialization,
) -> Result<Response> {
    let body = serialize_graph(graph, serialization)?;
    let expires = expiry.unwrap_or_else(|| Utc::now() + chrono::Duration::days(FAR_FUTURE_DAYS));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, serialization.media_type().to_string()),
            (header::CONTENT_LENGTH, body.len().to_string()),
            (header::EXPIRES, http_date(expires)),
            (header::CACHE_CONTROL, CACHE_CONTROL_VALUE.to_string()),
        ],
        body,
    )
        .into_response())
}

fn modification_response(result: ModificationResult) -> Response {
    match result {
        ModificationResult::Created => (StatusCode::CREATED, result.to_string()).into_response(),
        ModificationResult::Updated => (StatusCode::OK, result.to_string()).into_response(),
        ModificationResult::Deleted => StatusCode::NO_CONTENT.into_response(),
    }
}

/// RFC 1123 date as used by the `Expires` header.
pub fn http_date(instant: DateTime<Utc>) -> String {
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
