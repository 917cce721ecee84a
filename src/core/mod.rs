//! Core data structures shared by the registry, the cache and the HTTP layer

use chrono::{DateTime, Utc};
use oxigraph::model::{Graph, NamedNode};
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

pub mod proxy_uri;

pub use proxy_uri::ProxyUri;

/// Backend-specific key of a data origin (file path, sensor URI, ...).
///
/// Blanket-implemented for every type that can key a hash map and cross threads.
pub trait Identifier: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Identifier for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Immutable descriptor of one external resource.
///
/// Two origins are equal iff identifier and graph name match; the `observable` flag is
/// not part of the identity.
#[derive(Debug, Clone)]
pub struct DataOrigin<I> {
    identifier: I,
    graph_name: NamedNode,
    observable: bool,
}

impl<I: Identifier> DataOrigin<I> {
    pub fn new(identifier: I, graph_name: NamedNode) -> Self {
        Self { identifier, graph_name, observable: false }
    }

    /// Build an origin from a graph name string, validating the IRI.
    pub fn with_graph_iri(identifier: I, graph_name: &str) -> crate::Result<Self> {
        Ok(Self::new(identifier, NamedNode::new(graph_name)?))
    }

    /// Mark the origin as observable so the registry starts an observer for it.
    pub fn observable(mut self, observable: bool) -> Self {
        self.observable = observable;
        self
    }

    pub fn identifier(&self) -> &I {
        &self.identifier
    }

    pub fn graph_name(&self) -> &NamedNode {
        &self.graph_name
    }

    pub fn is_observable(&self) -> bool {
        self.observable
    }

    /// Proxy URI under which clients reach this origin's graph.
    pub fn proxy_uri(&self) -> ProxyUri {
        ProxyUri::for_graph(&self.graph_name)
    }
}

impl<I: PartialEq> PartialEq for DataOrigin<I> {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && self.graph_name == other.graph_name
    }
}

impl<I: Eq> Eq for DataOrigin<I> {}

impl<I: Hash> Hash for DataOrigin<I> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
        self.graph_name.hash(state);
    }
}

/// A named graph together with the instant after which it is stale.
///
/// `expiry == None` means the graph is cached until explicitly invalidated.
#[derive(Debug, Clone)]
pub struct ExpiringNamedGraph {
    pub graph_name: NamedNode,
    pub graph: Graph,
    pub expiry: Option<DateTime<Utc>>,
}

impl ExpiringNamedGraph {
    pub fn new(graph_name: NamedNode, graph: Graph, expiry: Option<DateTime<Utc>>) -> Self {
        Self { graph_name, graph, expiry }
    }

    /// Graph that stays cached until explicitly invalidated.
    pub fn indefinite(graph_name: NamedNode, graph: Graph) -> Self {
        Self::new(graph_name, graph, None)
    }

    /// Graph expiring `ttl` from now. A `ttl` reaching past the representable range is
    /// treated as no expiry.
    pub fn expiring_in(graph_name: NamedNode, graph: Graph, ttl: chrono::Duration) -> Self {
        Self::new(graph_name, graph, Utc::now().checked_add_signed(ttl))
    }
}

/// Outcome of a PUT or DELETE against a data origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationResult {
    Created,
    Updated,
    Deleted,
}

impl ModificationResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationResult::Created => "CREATED",
            ModificationResult::Updated => "UPDATED",
            ModificationResult::Deleted => "DELETED",
        }
    }
}

impl std::fmt::Display for ModificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn graph_name(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    #[test]
    fn test_equality_ignores_observable_flag() {
        let a = DataOrigin::new(PathBuf::from("/tmp/a.n3"), graph_name("http://ex/a"));
        let b = a.clone().observable(true);
        assert_eq!(a, b);
        assert!(b.is_observable());
    }

    #[test]
    fn test_equality_requires_identifier_and_graph_name() {
        let a = DataOrigin::new("sensor-1".to_string(), graph_name("http://ex/a"));
        let other_graph = DataOrigin::new("sensor-1".to_string(), graph_name("http://ex/b"));
        let other_id = DataOrigin::new("sensor-2".to_string(), graph_name("http://ex/a"));
        assert_ne!(a, other_graph);
        assert_ne!(a, other_id);
    }

    #[test]
    fn test_with_graph_iri_rejects_invalid_iri() {
        let result = DataOrigin::with_graph_iri("x".to_string(), "not an iri");
        assert!(matches!(result, Err(crate::GatewayError::InvalidIri(_))));
    }

    #[test]
    fn test_unrepresentable_ttl_means_no_expiry() {
        let graph = ExpiringNamedGraph::expiring_in(
            graph_name("http://ex/a"),
            Graph::new(),
            chrono::Duration::MAX,
        );
        assert_eq!(graph.expiry, None);
    }

    #[test]
    fn test_expiring_in_is_in_the_future() {
        let graph = ExpiringNamedGraph::expiring_in(
            graph_name("http://ex/a"),
            Graph::new(),
            chrono::Duration::seconds(60),
        );
        assert!(graph.expiry.unwrap() > Utc::now());
    }

    #[test]
    fn test_modification_result_display() {
        assert_eq!(ModificationResult::Deleted.to_string(), "DELETED");
    }
}
