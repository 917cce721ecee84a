//! Parsing request bodies into graphs and writing graphs out in a negotiated serialization.

use crate::error::{GatewayError, Result};
use crate::rdf::RdfSerialization;
use oxigraph::io::{RdfParser, RdfSerializer};
use oxigraph::model::{Graph, Triple};

/// Parse `data` into a graph. Quads carrying a graph name are folded into the default graph.
pub fn parse_graph(
    data: &[u8],
    serialization: RdfSerialization,
    base_iri: Option<&str>,
) -> Result<Graph> {
    let mut parser = RdfParser::from_format(serialization.parser_format());
    if let Some(base_iri) = base_iri {
        parser = parser.with_base_iri(base_iri)?;
    }

    let mut graph = Graph::new();
    for quad in parser.for_reader(data) {
        let quad = quad?;
        graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object));
    }
    Ok(graph)
}

/// Write `graph` in the given serialization.
pub fn serialize_graph(graph: &Graph, serialization: RdfSerialization) -> Result<Vec<u8>> {
    let mut serializer =
        RdfSerializer::from_format(serialization.serializer_format()).for_writer(Vec::new());
    for triple in graph.iter() {
        serializer
            .serialize_triple(triple)
            .map_err(|e| GatewayError::Serialization(e.to_string()))?;
    }
    serializer.finish().map_err(|e| GatewayError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TURTLE: &str = r#"
        @prefix ex: <http://example.org/> .
        ex:sensor1 ex:temperature "23.5" ;
                   ex:location ex:kitchen .
    "#;

    #[test]
    fn test_parse_turtle() {
        let graph = parse_graph(TURTLE.as_bytes(), RdfSerialization::Turtle, None).unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_parse_n3_subset() {
        let graph = parse_graph(TURTLE.as_bytes(), RdfSerialization::N3, None).unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = parse_graph(b"this is not turtle", RdfSerialization::Turtle, None);
        assert!(matches!(result, Err(GatewayError::Parse(_))));
    }

    #[test]
    fn test_relative_iris_resolve_against_base() {
        let data = b"<sensor1> <http://example.org/p> \"v\" .";
        let graph =
            parse_graph(data, RdfSerialization::Turtle, Some("http://example.org/")).unwrap();
        let triple = graph.iter().next().unwrap();
        assert_eq!(triple.subject.to_string(), "<http://example.org/sensor1>");
    }

    #[test]
    fn test_serialize_rdf_xml_and_read_back() {
        let graph = parse_graph(TURTLE.as_bytes(), RdfSerialization::Turtle, None).unwrap();
        let xml = serialize_graph(&graph, RdfSerialization::RdfXml).unwrap();
        let xml_text = String::from_utf8(xml.clone()).unwrap();
        assert!(xml_text.contains("rdf:RDF"));

        let reparsed = parse_graph(&xml, RdfSerialization::RdfXml, None).unwrap();
        assert_eq!(reparsed, graph);
    }

    #[test]
    fn test_serialize_empty_graph() {
        let bytes = serialize_graph(&Graph::new(), RdfSerialization::NTriples).unwrap();
        assert!(bytes.is_empty());
    }
}
