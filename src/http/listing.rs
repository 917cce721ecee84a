//! JSON listing of the semantic resources reachable through the gateway.

use crate::error::{GatewayError, Result};
use crate::http::dispatcher::HttpRequestDispatcher;
use crate::http::webservice::{PlainWebservice, ProxyRequest};
use async_trait::async_trait;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Weak;

#[derive(Debug, Serialize)]
pub struct ResourceEntry {
    pub graph_name: String,
    pub proxy_uri: String,
}

#[derive(Debug, Serialize)]
pub struct ResourceListingResponse {
    pub resources: Vec<ResourceEntry>,
    pub total: usize,
}

/// Lists every semantic proxy URI of a dispatcher.
pub struct ResourceListing {
    // The dispatcher owns this webservice through its route table.
    dispatcher: Weak<HttpRequestDispatcher>,
}

impl ResourceListing {
    pub fn new(dispatcher: Weak<HttpRequestDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl PlainWebservice for ResourceListing {
    async fn process(&self, request: ProxyRequest) -> Result<Response> {
        if request.method != Method::GET {
            return Err(GatewayError::MethodNotAllowed(request.method.to_string()));
        }
        let dispatcher = self
            .dispatcher
            .upgrade()
            .ok_or_else(|| GatewayError::Inconsistent("dispatcher dropped".to_string()))?;

        let resources: Vec<ResourceEntry> = dispatcher
            .semantic_proxy_uris()
            .into_iter()
            .filter_map(|uri| {
                let graph_name = uri.graph_name()?.to_string();
                Some(ResourceEntry { graph_name, proxy_uri: uri.encoded() })
            })
            .collect();
        let total = resources.len();

        Ok(Json(ResourceListingResponse { resources, total }).into_response())
    }
}
