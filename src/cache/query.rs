//! Results of SPARQL queries evaluated against the cache.

use oxigraph::model::Graph;
use serde::Serialize;
use std::collections::HashMap;

/// Result of a SPARQL query.
///
/// SELECT queries produce `Solutions`, where each binding maps a variable name to the
/// N-Triples form of its term. ASK produces `Boolean`, CONSTRUCT and DESCRIBE `Graph`.
#[derive(Debug, Clone)]
pub enum QueryResult {
    Solutions { variables: Vec<String>, bindings: Vec<HashMap<String, String>> },
    Boolean(bool),
    Graph(Graph),
}

/// JSON view of a [`QueryResult`] in the SPARQL results layout.
#[derive(Debug, Serialize)]
pub struct QueryResultJson {
    pub head: QueryHead,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<QueryBindings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct QueryHead {
    pub vars: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryBindings {
    pub bindings: Vec<HashMap<String, String>>,
}

impl QueryResult {
    /// Number of solutions, the truth value as 0/1, or the number of triples.
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Solutions { bindings, .. } => bindings.len(),
            QueryResult::Boolean(b) => usize::from(*b),
            QueryResult::Graph(graph) => graph.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON rendering for SELECT and ASK results; `None` for graph results.
    pub fn to_json(&self) -> Option<QueryResultJson> {
        match self {
            QueryResult::Solutions { variables, bindings } => Some(QueryResultJson {
                head: QueryHead { vars: variables.clone() },
                results: Some(QueryBindings { bindings: bindings.clone() }),
                boolean: None,
            }),
            QueryResult::Boolean(b) => Some(QueryResultJson {
                head: QueryHead { vars: Vec::new() },
                results: None,
                boolean: Some(*b),
            }),
            QueryResult::Graph(_) => None,
        }
    }
}
