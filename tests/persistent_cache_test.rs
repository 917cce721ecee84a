use oxigraph::model::{Graph, Literal, NamedNode, Triple};
use ssp::cache::{GraphStore, OxigraphStore};
use ssp::config::{CacheBackend, GatewayConfig};
use ssp::context::GatewayContext;

fn graph() -> Graph {
    let mut graph = Graph::new();
    graph.insert(&Triple::new(
        NamedNode::new("http://ex/sensor").unwrap(),
        NamedNode::new("http://ex/value").unwrap(),
        Literal::new_simple_literal("1"),
    ));
    graph
}

#[tokio::test]
async fn test_graphs_of_previous_run_are_dropped_at_start() {
    let dir = tempfile::tempdir().unwrap();
    let stale = NamedNode::new("http://ex/stale").unwrap();
    {
        let store = OxigraphStore::open(dir.path()).unwrap();
        store.put(stale.as_ref(), &graph()).unwrap();
    }

    let config = GatewayConfig {
        cache: CacheBackend::Persistent { path: dir.path().to_path_buf() },
        ..GatewayConfig::default()
    };
    let context = GatewayContext::start(config, tokio::runtime::Handle::current())
        .await
        .unwrap();

    assert!(!context.cache().contains_named_graph(stale.as_ref()).unwrap());
    assert!(context.cache().get_named_graph(stale.as_ref()).unwrap().is_none());
    assert!(context.dispatcher().semantic_proxy_uris().is_empty());

    let result = context
        .process_sparql_query("ASK { GRAPH <http://ex/stale> { ?s ?p ?o } }")
        .await
        .unwrap();
    assert!(matches!(result, ssp::cache::QueryResult::Boolean(false)));
}
