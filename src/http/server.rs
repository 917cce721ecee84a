//! HTTP server for the gateway
//!
//! Every request target is handed to the [`HttpRequestDispatcher`]; there are no fixed
//! routes besides what the dispatcher's table holds.

use crate::core::ProxyUri;
use crate::http::dispatcher::HttpRequestDispatcher;
use crate::http::webservice::ProxyRequest;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
pub struct AppState {
    pub dispatcher: Arc<HttpRequestDispatcher>,
    pub max_body_bytes: usize,
}

/// Create the HTTP router
pub fn create_server(dispatcher: Arc<HttpRequestDispatcher>, max_body_bytes: usize) -> Router {
    let state = Arc::new(AppState { dispatcher, max_body_bytes });

    // Configure CORS
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .fallback(dispatch)
        // A panicking webservice still gets its client a 500 response.
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn dispatch(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let target = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());

    let proxy_uri = match ProxyUri::from_request_target(target) {
        Ok(proxy_uri) => proxy_uri,
        Err(e) => return e.into_response(),
    };
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, format!("Request body rejected: {}", e))
                .into_response()
        }
    };

    let request =
        ProxyRequest { method: parts.method, proxy_uri, headers: parts.headers, body };
    state.dispatcher.dispatch(request).await
}

/// Serve `router` on `addr` until `shutdown` resolves.
pub async fn start_server(
    addr: &str,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Semantic service proxy listening on http://{}", addr);
    info!("  GET    /                      - List semantic resources");
    info!("  GET    /?graph=<graph name>   - Read a cached graph");
    info!("  PUT    /?graph=<graph name>   - Update a data origin");
    info!("  DELETE /?graph=<graph name>   - Delete a data origin");

    axum::serve(listener, router).with_graceful_shutdown(shutdown).await?;

    Ok(())
}
