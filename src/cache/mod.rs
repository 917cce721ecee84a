//! Semantic cache of named graphs and its storage back ends

pub mod oxigraph_store;
pub mod query;
pub mod semantic_cache;
pub mod store;

pub use oxigraph_store::OxigraphStore;
pub use query::QueryResult;
pub use semantic_cache::SemanticCache;
pub use store::{DummyStore, GraphStore};
