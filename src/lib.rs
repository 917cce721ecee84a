//! # SSP
//!
//! SSP is a semantic service proxy: it exposes heterogeneous, intermittently available
//! data origins (sensors, files, computed values) through one HTTP interface, backed by a
//! queryable cache of their latest known state as RDF named graphs.
//!
//! ## Features
//!
//! - Generic backend contracts: `Accessor`, `DataOriginObserver` and `Registry`
//! - Atomic registration, replacement and unregistration through an internal bus
//! - A semantic cache with per-graph expiry, backed by Oxigraph or by nothing at all
//! - Content negotiation among Turtle, N3, RDF/XML and N-Triples
//! - SPARQL over the cached graphs
//!
//! ## Example
//!
//! ```rust,no_run
//! use ssp::backends::FileBackend;
//! use ssp::config::{FileBackendConfig, GatewayConfig};
//! use ssp::context::GatewayContext;
//!
//! async fn example() -> ssp::Result<()> {
//!     let context =
//!         GatewayContext::start(GatewayConfig::default(), tokio::runtime::Handle::current())
//!             .await?;
//!     let files = FileBackend::new(FileBackendConfig::default(), &context);
//!     files.register_directory().await?;
//!     let _router = context.router();
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::new_without_default)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Core data structures and types
pub mod core;

/// RDF serializations and content negotiation
pub mod rdf;

/// Semantic cache and its storage back ends
pub mod cache;

mod bus;

/// Backend contracts, mapper and registry
pub mod backend;

/// Reference backend plug-ins
pub mod backends;

/// HTTP dispatcher and server
pub mod http;

pub mod config;

pub mod context;

pub mod error;

// Re-export commonly used types
pub use error::{GatewayError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::Config("test error".to_string());
        assert_eq!(format!("{}", err), "Configuration error: test error");
    }
}
