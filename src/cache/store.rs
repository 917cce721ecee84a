//! Pluggable storage back ends of the semantic cache.

use crate::cache::QueryResult;
use crate::error::{GatewayError, Result};
use oxigraph::model::{Graph, NamedNodeRef};

/// Storage of named graphs behind the [`SemanticCache`](crate::cache::SemanticCache).
///
/// Implementations only store and retrieve; expiry bookkeeping stays in the cache. Every
/// call is a short in-memory or local-disk operation and must not block on the network.
pub trait GraphStore: Send + Sync {
    /// Replace the content of `graph_name` with `graph`. Readers never observe a mix of
    /// the old and new content.
    fn put(&self, graph_name: NamedNodeRef<'_>, graph: &Graph) -> Result<()>;

    fn get(&self, graph_name: NamedNodeRef<'_>) -> Result<Option<Graph>>;

    fn contains(&self, graph_name: NamedNodeRef<'_>) -> Result<bool>;

    /// Remove `graph_name`; returns whether it was present.
    fn delete(&self, graph_name: NamedNodeRef<'_>) -> Result<bool>;

    /// Remove every graph, e.g. leftovers of a previous run in a persistent store.
    fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn query(&self, query: &str) -> Result<QueryResult> {
        let _ = query;
        Err(GatewayError::SparqlNotSupported)
    }
}

/// Store that keeps nothing. Every read misses, so semantic GETs always reach the origin.
#[derive(Debug, Default)]
pub struct DummyStore;

impl GraphStore for DummyStore {
    fn put(&self, _graph_name: NamedNodeRef<'_>, _graph: &Graph) -> Result<()> {
        Ok(())
    }

    fn get(&self, _graph_name: NamedNodeRef<'_>) -> Result<Option<Graph>> {
        Ok(None)
    }

    fn contains(&self, _graph_name: NamedNodeRef<'_>) -> Result<bool> {
        Ok(false)
    }

    fn delete(&self, _graph_name: NamedNodeRef<'_>) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::NamedNode;

    #[test]
    fn test_dummy_store_keeps_nothing() {
        let store = DummyStore;
        let name = NamedNode::new("http://ex/a").unwrap();
        store.put(name.as_ref(), &Graph::new()).unwrap();
        assert!(store.get(name.as_ref()).unwrap().is_none());
        assert!(!store.contains(name.as_ref()).unwrap());
        assert!(matches!(store.query("ASK {}"), Err(GatewayError::SparqlNotSupported)));
    }
}
