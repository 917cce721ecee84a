use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use oxigraph::model::{Graph, Literal, NamedNode, Triple};
use ssp::cache::{GraphStore, OxigraphStore};
use ssp::rdf::{serialize_graph, RdfSerialization};

/// Sensor graph with `triples` readings
fn sensor_graph(triples: usize) -> Graph {
    let mut graph = Graph::new();
    let predicate = NamedNode::new("http://example.org/value").unwrap();
    for i in 0..triples {
        graph.insert(&Triple::new(
            NamedNode::new(format!("http://example.org/sensor/{}", i)).unwrap(),
            predicate.clone(),
            Literal::new_simple_literal(i.to_string()),
        ));
    }
    graph
}

fn bench_graph_replacement(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_replacement");
    for triples in [10, 100, 1000] {
        let store = OxigraphStore::in_memory().unwrap();
        let name = NamedNode::new("http://example.org/graph").unwrap();
        let graph = sensor_graph(triples);

        group.bench_with_input(BenchmarkId::from_parameter(triples), &graph, |b, graph| {
            b.iter(|| store.put(name.as_ref(), black_box(graph)).unwrap());
        });
    }
    group.finish();
}

fn bench_cached_read(c: &mut Criterion) {
    let store = OxigraphStore::in_memory().unwrap();
    let name = NamedNode::new("http://example.org/graph").unwrap();
    store.put(name.as_ref(), &sensor_graph(100)).unwrap();

    c.bench_function("cached_read_100", |b| {
        b.iter(|| store.get(black_box(name.as_ref())).unwrap());
    });
}

fn bench_serialization(c: &mut Criterion) {
    let graph = sensor_graph(100);
    let mut group = c.benchmark_group("serialization_100");
    for serialization in RdfSerialization::ALL {
        group.bench_function(serialization.media_type(), |b| {
            b.iter(|| serialize_graph(black_box(&graph), serialization).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_graph_replacement, bench_cached_read, bench_serialization);
criterion_main!(benches);
