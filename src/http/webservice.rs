//! Webservices the dispatcher routes proxy requests to.

use crate::core::{ExpiringNamedGraph, ModificationResult, ProxyUri};
use crate::error::Result;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use std::sync::Arc;

/// An inbound request, resolved to the proxy URI it targets.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub proxy_uri: ProxyUri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyRequest {
    pub fn new(method: Method, proxy_uri: ProxyUri) -> Self {
        Self { method, proxy_uri, headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// What a semantic webservice produced for a request.
#[derive(Debug, Clone)]
pub enum SemanticResponse {
    /// A graph to serialize with the negotiated serialization.
    Graph(ExpiringNamedGraph),
    /// Outcome of a PUT or DELETE.
    Modified(ModificationResult),
}

/// Graph-backed webservice. The dispatcher negotiates the response serialization and
/// writes the response; implementations only produce the graph or modification result.
#[async_trait]
pub trait SemanticWebservice: Send + Sync {
    async fn process(&self, request: ProxyRequest) -> Result<SemanticResponse>;

    /// Forget whatever backs `proxy_uri` after its route was removed from the dispatcher.
    /// Returns whether anything was released.
    fn release_route(&self, proxy_uri: &ProxyUri) -> bool {
        let _ = proxy_uri;
        false
    }
}

/// Webservice that writes its own response, e.g. a resource listing.
#[async_trait]
pub trait PlainWebservice: Send + Sync {
    async fn process(&self, request: ProxyRequest) -> Result<Response>;
}

/// Entry of the dispatcher's route table.
#[derive(Clone)]
pub enum Webservice {
    Semantic(Arc<dyn SemanticWebservice>),
    Plain(Arc<dyn PlainWebservice>),
}

impl Webservice {
    pub fn is_semantic(&self) -> bool {
        matches!(self, Webservice::Semantic(_))
    }
}

impl std::fmt::Debug for Webservice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Webservice::Semantic(_) => f.write_str("Webservice::Semantic"),
            Webservice::Plain(_) => f.write_str("Webservice::Plain"),
        }
    }
}
