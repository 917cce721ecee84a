//! Oxigraph-backed cache store.
//!
//! Each cached graph is kept as a named graph of an Oxigraph [`Store`], either in memory or
//! persisted on disk, and SPARQL queries are evaluated directly against that store.
//!
//! # Example
//!
//! ```ignore
//! use ssp::cache::{GraphStore, OxigraphStore, QueryResult};
//! use oxigraph::model::{Graph, NamedNode, Triple};
//!
//! let store = OxigraphStore::in_memory()?;
//! let name = NamedNode::new("http://example.org/sensor1")?;
//! let mut graph = Graph::new();
//! graph.insert(&Triple::new(name.clone(), NamedNode::new("http://example.org/value")?, name.clone()));
//! store.put(name.as_ref(), &graph)?;
//!
//! let query = "SELECT ?s WHERE { GRAPH <http://example.org/sensor1> { ?s ?p ?o } }";
//! if let QueryResult::Solutions { bindings, .. } = store.query(query)? {
//!     println!("{} solutions", bindings.len());
//! }
//! ```

use crate::cache::{GraphStore, QueryResult};
use crate::error::{GatewayError, Result};
use oxigraph::model::{Graph, GraphNameRef, NamedNodeRef, Triple};
use oxigraph::sparql::{QueryResults, SparqlEvaluator};
use oxigraph::store::Store;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;

pub struct OxigraphStore {
    store: Store,
    // Oxigraph applies single inserts atomically only; this lock makes a whole graph
    // replacement visible at once.
    visibility: RwLock<()>,
}

impl OxigraphStore {
    pub fn in_memory() -> Result<Self> {
        Ok(Self { store: Store::new()?, visibility: RwLock::new(()) })
    }

    /// Open (or create) a persistent store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self { store: Store::open(path)?, visibility: RwLock::new(()) })
    }

    /// Number of quads over all cached graphs.
    pub fn quad_count(&self) -> Result<usize> {
        let _guard = self.visibility.read();
        Ok(self.store.len()?)
    }
}

impl GraphStore for OxigraphStore {
    fn put(&self, graph_name: NamedNodeRef<'_>, graph: &Graph) -> Result<()> {
        let _guard = self.visibility.write();
        self.store.clear_graph(GraphNameRef::NamedNode(graph_name))?;
        self.store.insert_named_graph(graph_name)?;
        for triple in graph.iter() {
            self.store.insert(triple.in_graph(graph_name))?;
        }
        Ok(())
    }

    fn get(&self, graph_name: NamedNodeRef<'_>) -> Result<Option<Graph>> {
        let _guard = self.visibility.read();
        if !self.store.contains_named_graph(graph_name)? {
            return Ok(None);
        }

        let mut graph = Graph::new();
        for quad in self.store.quads_for_pattern(
            None,
            None,
            None,
            Some(GraphNameRef::NamedNode(graph_name)),
        ) {
            let quad = quad?;
            graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object));
        }
        Ok(Some(graph))
    }

    fn contains(&self, graph_name: NamedNodeRef<'_>) -> Result<bool> {
        let _guard = self.visibility.read();
        Ok(self.store.contains_named_graph(graph_name)?)
    }

    fn delete(&self, graph_name: NamedNodeRef<'_>) -> Result<bool> {
        let _guard = self.visibility.write();
        let present = self.store.contains_named_graph(graph_name)?;
        self.store.remove_named_graph(graph_name)?;
        Ok(present)
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.visibility.write();
        Ok(self.store.clear()?)
    }

    /// Evaluate a SPARQL query over the cached named graphs.
    ///
    /// The default graph is empty: queries address cached graphs with `GRAPH` patterns or
    /// `FROM` / `FROM NAMED` clauses.
    fn query(&self, query: &str) -> Result<QueryResult> {
        let evaluator = SparqlEvaluator::new();
        let parsed_query =
            evaluator.parse_query(query).map_err(|e| GatewayError::Query(e.to_string()))?;
        // Evaluation reads from the snapshot taken by `execute`; only taking it has to
        // exclude a half-applied graph replacement.
        let results = {
            let _guard = self.visibility.read();
            parsed_query.on_store(&self.store).execute()?
        };

        match results {
            QueryResults::Solutions(solutions) => {
                let variables =
                    solutions.variables().iter().map(|v| v.as_str().to_string()).collect();
                let mut bindings = Vec::new();
                for solution in solutions {
                    let solution = solution?;
                    let mut binding = HashMap::new();
                    for (var, term) in solution.iter() {
                        binding.insert(var.as_str().to_string(), term.to_string());
                    }
                    bindings.push(binding);
                }
                Ok(QueryResult::Solutions { variables, bindings })
            }
            QueryResults::Boolean(b) => Ok(QueryResult::Boolean(b)),
            QueryResults::Graph(triples) => {
                let mut graph = Graph::new();
                for triple in triples {
                    graph.insert(&triple?);
                }
                Ok(QueryResult::Graph(graph))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::{Literal, NamedNode};

    fn sensor_graph(value: &str) -> Graph {
        let mut graph = Graph::new();
        graph.insert(&Triple::new(
            NamedNode::new("http://example.org/sensor1").unwrap(),
            NamedNode::new("http://example.org/temperature").unwrap(),
            Literal::new_simple_literal(value),
        ));
        graph
    }

    fn name(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    #[test]
    fn test_put_and_get() {
        let store = OxigraphStore::in_memory().unwrap();
        let graph_name = name("http://ex/a");
        store.put(graph_name.as_ref(), &sensor_graph("21")).unwrap();

        assert!(store.contains(graph_name.as_ref()).unwrap());
        assert_eq!(store.get(graph_name.as_ref()).unwrap(), Some(sensor_graph("21")));
        assert!(store.get(name("http://ex/other").as_ref()).unwrap().is_none());
    }

    #[test]
    fn test_put_replaces_previous_content() {
        let store = OxigraphStore::in_memory().unwrap();
        let graph_name = name("http://ex/a");
        store.put(graph_name.as_ref(), &sensor_graph("21")).unwrap();
        store.put(graph_name.as_ref(), &sensor_graph("22")).unwrap();

        assert_eq!(store.get(graph_name.as_ref()).unwrap(), Some(sensor_graph("22")));
        assert_eq!(store.quad_count().unwrap(), 1);
    }

    #[test]
    fn test_empty_graph_is_still_cached() {
        let store = OxigraphStore::in_memory().unwrap();
        let graph_name = name("http://ex/empty");
        store.put(graph_name.as_ref(), &Graph::new()).unwrap();
        assert!(store.contains(graph_name.as_ref()).unwrap());
        assert_eq!(store.get(graph_name.as_ref()).unwrap().map(|g| g.len()), Some(0));
    }

    #[test]
    fn test_delete() {
        let store = OxigraphStore::in_memory().unwrap();
        let graph_name = name("http://ex/a");
        store.put(graph_name.as_ref(), &sensor_graph("21")).unwrap();

        assert!(store.delete(graph_name.as_ref()).unwrap());
        assert!(!store.contains(graph_name.as_ref()).unwrap());
        assert!(!store.delete(graph_name.as_ref()).unwrap());
    }

    #[test]
    fn test_select_query_over_named_graph() {
        let store = OxigraphStore::in_memory().unwrap();
        store.put(name("http://ex/a").as_ref(), &sensor_graph("21")).unwrap();

        let query = r"
            PREFIX ex: <http://example.org/>
            SELECT ?value WHERE { GRAPH <http://ex/a> { ex:sensor1 ex:temperature ?value } }
        ";
        match store.query(query).unwrap() {
            QueryResult::Solutions { variables, bindings } => {
                assert_eq!(variables, vec!["value".to_string()]);
                assert_eq!(bindings.len(), 1);
                assert_eq!(bindings[0]["value"], "\"21\"");
            }
            other => panic!("expected solutions, got {:?}", other),
        }
    }

    #[test]
    fn test_ask_and_construct_queries() {
        let store = OxigraphStore::in_memory().unwrap();
        store.put(name("http://ex/a").as_ref(), &sensor_graph("21")).unwrap();

        let ask = "ASK { GRAPH ?g { ?s ?p \"21\" } }";
        assert!(matches!(store.query(ask).unwrap(), QueryResult::Boolean(true)));

        let construct = "CONSTRUCT { ?s ?p ?o } WHERE { GRAPH <http://ex/a> { ?s ?p ?o } }";
        match store.query(construct).unwrap() {
            QueryResult::Graph(graph) => assert_eq!(graph, sensor_graph("21")),
            other => panic!("expected graph, got {:?}", other),
        }
    }

    #[test]
    fn test_reopened_store_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = OxigraphStore::open(dir.path()).unwrap();
            store.put(name("http://ex/stale").as_ref(), &sensor_graph("21")).unwrap();
        }

        let store = OxigraphStore::open(dir.path()).unwrap();
        assert!(store.contains(name("http://ex/stale").as_ref()).unwrap());
        store.clear().unwrap();
        assert!(!store.contains(name("http://ex/stale").as_ref()).unwrap());
        assert_eq!(store.quad_count().unwrap(), 0);
    }

    #[test]
    fn test_invalid_query_is_a_query_error() {
        let store = OxigraphStore::in_memory().unwrap();
        assert!(matches!(store.query("SELEC nothing"), Err(GatewayError::Query(_))));
    }
}
