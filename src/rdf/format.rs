//! RDF serializations the gateway can negotiate, parse and write.

use oxigraph::io::RdfFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// RDF serializations offered to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RdfSerialization {
    Turtle,
    N3,
    RdfXml,
    NTriples,
}

impl RdfSerialization {
    /// Serializations in server preference order.
    pub const ALL: [RdfSerialization; 4] = [
        RdfSerialization::Turtle,
        RdfSerialization::N3,
        RdfSerialization::RdfXml,
        RdfSerialization::NTriples,
    ];

    pub fn media_type(&self) -> &'static str {
        match self {
            RdfSerialization::Turtle => "text/turtle",
            RdfSerialization::N3 => "text/n3",
            RdfSerialization::RdfXml => "application/rdf+xml",
            RdfSerialization::NTriples => "application/n-triples",
        }
    }

    /// Match a media type (parameters such as `charset` are ignored).
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let base = media_type.split(';').next().unwrap_or("").trim().to_lowercase();
        match base.as_str() {
            "text/turtle" | "application/x-turtle" | "application/turtle" => {
                Some(RdfSerialization::Turtle)
            }
            "text/n3" | "text/rdf+n3" | "application/n3" => Some(RdfSerialization::N3),
            "application/rdf+xml" | "application/xml" | "text/xml" => {
                Some(RdfSerialization::RdfXml)
            }
            "application/n-triples" | "text/plain" => Some(RdfSerialization::NTriples),
            _ => None,
        }
    }

    /// Guess the serialization of a file from its extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "ttl" | "turtle" => Some(RdfSerialization::Turtle),
            "n3" => Some(RdfSerialization::N3),
            "rdf" | "owl" | "xml" => Some(RdfSerialization::RdfXml),
            "nt" => Some(RdfSerialization::NTriples),
            _ => None,
        }
    }

    /// Parse a configuration or command-line name such as `turtle` or `rdfxml`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "turtle" | "ttl" => Some(RdfSerialization::Turtle),
            "n3" => Some(RdfSerialization::N3),
            "rdfxml" | "rdf-xml" | "rdf" | "xml" => Some(RdfSerialization::RdfXml),
            "ntriples" | "n-triples" | "nt" => Some(RdfSerialization::NTriples),
            _ => None,
        }
    }

    pub(crate) fn parser_format(&self) -> RdfFormat {
        match self {
            RdfSerialization::Turtle => RdfFormat::Turtle,
            RdfSerialization::N3 => RdfFormat::N3,
            RdfSerialization::RdfXml => RdfFormat::RdfXml,
            RdfSerialization::NTriples => RdfFormat::NTriples,
        }
    }

    // Turtle output is valid N3, so N3 is written with the Turtle serializer.
    pub(crate) fn serializer_format(&self) -> RdfFormat {
        match self {
            RdfSerialization::Turtle | RdfSerialization::N3 => RdfFormat::Turtle,
            RdfSerialization::RdfXml => RdfFormat::RdfXml,
            RdfSerialization::NTriples => RdfFormat::NTriples,
        }
    }
}

impl Default for RdfSerialization {
    fn default() -> Self {
        RdfSerialization::Turtle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_round_trip() {
        for serialization in RdfSerialization::ALL {
            assert_eq!(
                RdfSerialization::from_media_type(serialization.media_type()),
                Some(serialization)
            );
        }
    }

    #[test]
    fn test_media_type_parameters_are_ignored() {
        assert_eq!(
            RdfSerialization::from_media_type("text/turtle; charset=utf-8"),
            Some(RdfSerialization::Turtle)
        );
        assert_eq!(RdfSerialization::from_media_type("application/unknown"), None);
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(
            RdfSerialization::from_extension(Path::new("/tmp/a.n3")),
            Some(RdfSerialization::N3)
        );
        assert_eq!(
            RdfSerialization::from_extension(Path::new("data/sensor.TTL")),
            Some(RdfSerialization::Turtle)
        );
        assert_eq!(RdfSerialization::from_extension(Path::new("notes.txt")), None);
    }
}
