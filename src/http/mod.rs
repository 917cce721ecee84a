//! HTTP surface of the gateway
//!
//! Provides:
//! - The webservice contracts (semantic and plain)
//! - The request dispatcher with content negotiation
//! - The resource listing webservice
//! - The axum server wiring

pub mod dispatcher;
pub mod listing;
pub mod server;
pub mod webservice;

pub use dispatcher::{http_date, HttpRequestDispatcher};
pub use listing::{ResourceEntry, ResourceListing, ResourceListingResponse};
pub use server::{create_server, start_server, AppState};
pub use webservice::{
    PlainWebservice, ProxyRequest, SemanticResponse, SemanticWebservice, Webservice,
};
