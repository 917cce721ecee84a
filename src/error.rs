//! Error types and result definitions

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway.
///
/// Every asynchronous operation of the core resolves to either a typed value or one of these
/// variants; the HTTP layer turns them into responses through [`GatewayError::status_code`].
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The accessor of a backend does not implement the requested operation
    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),

    /// The HTTP method cannot be applied to a semantic resource
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// A proxy URI, graph name or identifier already has a live mapping
    #[error("Resource already registered: {0}")]
    AlreadyRegistered(String),

    /// Unknown proxy URI, graph name or identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Another registration transition is in flight for the same identifier
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The data origin failed or could not be reached
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        status: Option<StatusCode>,
    },

    /// Malformed RDF input
    #[error("Parse error: {0}")]
    Parse(String),

    /// RDF output could not be written
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The active cache store cannot evaluate SPARQL
    #[error("SPARQL not supported by the active cache store")]
    SparqlNotSupported,

    /// SPARQL parsing or evaluation failed
    #[error("Query error: {0}")]
    Query(String),

    /// Cache store failure
    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    /// Route tables of the dispatcher and a mapper disagree
    #[error("Registration inconsistency: {0}")]
    Inconsistent(String),

    /// The internal bus worker is gone
    #[error("Internal bus closed")]
    BusClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Backend failure without a more specific HTTP status.
    pub fn backend(message: impl Into<String>) -> Self {
        GatewayError::Backend { message: message.into(), status: None }
    }

    /// Backend failure carrying the HTTP status the backend wants to surface.
    pub fn backend_with_status(message: impl Into<String>, status: StatusCode) -> Self {
        GatewayError::Backend { message: message.into(), status: Some(status) }
    }

    /// HTTP status code a client sees for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::OperationNotSupported(_) | GatewayError::SparqlNotSupported => {
                StatusCode::NOT_IMPLEMENTED
            }
            GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::AlreadyRegistered(_) | GatewayError::InvalidState(_) => {
                StatusCode::CONFLICT
            }
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Parse(_) | GatewayError::InvalidIri(_) => StatusCode::BAD_REQUEST,
            GatewayError::Backend { status, .. } => {
                status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            GatewayError::Serialization(_)
            | GatewayError::Query(_)
            | GatewayError::Store(_)
            | GatewayError::Inconsistent(_)
            | GatewayError::BusClosed
            | GatewayError::Config(_)
            | GatewayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<oxigraph::store::StorageError> for GatewayError {
    fn from(err: oxigraph::store::StorageError) -> Self {
        GatewayError::Store(err.to_string())
    }
}

impl From<oxigraph::sparql::QueryEvaluationError> for GatewayError {
    fn from(err: oxigraph::sparql::QueryEvaluationError) -> Self {
        GatewayError::Query(err.to_string())
    }
}

impl From<oxigraph::io::RdfParseError> for GatewayError {
    fn from(err: oxigraph::io::RdfParseError) -> Self {
        GatewayError::Parse(err.to_string())
    }
}

impl From<oxigraph::model::IriParseError> for GatewayError {
    fn from(err: oxigraph::model::IriParseError) -> Self {
        GatewayError::InvalidIri(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}
